//! Core types shared by the directory, monitors and reconciler

use std::fmt;

use interconnect_api::bfd;

/// Administrative communication sent with every BFD-triggered disable
pub const DISABLE_COMMUNICATION: &str = "disabled by bfd";

/// BFD session state reported by the BFD daemon
///
/// # NIST Controls
/// - SI-10: Information Input Validation - Unknown wire values are kept, never trusted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    /// Session administratively held down
    AdminDown,
    /// Session down
    Down,
    /// Session coming up
    Init,
    /// Session up
    Up,
    /// Value outside the BFD state machine
    Unknown(i32),
}

impl SessionState {
    /// Create from the protobuf wire value
    pub fn from_wire(value: i32) -> Self {
        match bfd::SessionState::try_from(value) {
            Ok(state) => state.into(),
            Err(_) => Self::Unknown(value),
        }
    }

    /// Returns true if the state means the forwarding path is gone
    #[inline]
    pub fn is_down(&self) -> bool {
        matches!(self, Self::AdminDown | Self::Down)
    }
}

impl From<bfd::SessionState> for SessionState {
    fn from(state: bfd::SessionState) -> Self {
        match state {
            bfd::SessionState::AdminDown => Self::AdminDown,
            bfd::SessionState::Down => Self::Down,
            bfd::SessionState::Init => Self::Init,
            bfd::SessionState::Up => Self::Up,
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AdminDown => f.write_str("ADMIN_DOWN"),
            Self::Down => f.write_str("DOWN"),
            Self::Init => f.write_str("INIT"),
            Self::Up => f.write_str("UP"),
            Self::Unknown(value) => write!(f, "{}", value),
        }
    }
}

/// Opaque peer identifier assigned by the BFD daemon
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct PeerId(Vec<u8>);

impl PeerId {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl From<Vec<u8>> for PeerId {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("0x")?;
        for byte in &self.0 {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

/// One entry of the BFD peer listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerListing {
    pub name: String,
    pub id: PeerId,
}

/// Association of a BFD peer with the BGP peer it controls
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerMapping {
    /// Peer name as configured and as known to the BFD daemon
    pub name: String,
    /// Identifier resolved from the BFD peer listing
    pub bfd_id: PeerId,
    /// Address of the BGP neighbor
    pub bgp_address: String,
}

/// Control action against a BGP peer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeerAction {
    Enable {
        address: String,
    },
    Disable {
        address: String,
        communication: String,
    },
}

impl PeerAction {
    /// Address of the BGP peer the action targets
    pub fn address(&self) -> &str {
        match self {
            Self::Enable { address } | Self::Disable { address, .. } => address,
        }
    }

    /// Verb used in log lines and errors
    pub fn verb(&self) -> &'static str {
        match self {
            Self::Enable { .. } => "enable",
            Self::Disable { .. } => "disable",
        }
    }
}
