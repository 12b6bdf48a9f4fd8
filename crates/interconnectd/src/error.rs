//! Error types for interconnectd
//!
//! Startup errors ([`ConnectError`], [`ListError`], [`UnresolvedPeerError`],
//! [`MonitorSetupError`]) abort the whole service. [`StreamError`] and
//! [`ActionDispatchError`] are confined to a single peer and only logged.
//!
//! # NIST 800-53 Rev 5 Control Mappings
//! - SI-11: Error Handling - Structured error types with contextual information
//! - AU-3: Content of Audit Records - Errors name the endpoint or peer involved

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Failure to establish a connection to a control-plane endpoint.
///
/// # NIST Controls
/// - SC-8: Transmission Confidentiality - TLS setup failures are surfaced, never downgraded
#[derive(Debug, Error)]
pub enum ConnectError {
    /// No host configured for the endpoint
    #[error("no host configured for {endpoint} endpoint")]
    MissingHost { endpoint: String },

    /// Host could not be turned into a gRPC endpoint URI
    #[error("invalid address '{host}' for {endpoint} endpoint: {source}")]
    InvalidAddress {
        endpoint: String,
        host: String,
        #[source]
        source: tonic::transport::Error,
    },

    /// TLS is enabled but the host names a scheme other than https
    #[error("TLS is enabled for {endpoint} endpoint but '{host}' is not an https address")]
    InsecureScheme { endpoint: String, host: String },

    /// Trust anchor certificate could not be read
    #[error("failed to read certificate {} for {endpoint} endpoint: {source}", .path.display())]
    Certificate {
        endpoint: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// TLS client configuration was rejected
    #[error("invalid TLS configuration for {endpoint} endpoint: {source}")]
    Tls {
        endpoint: String,
        #[source]
        source: tonic::transport::Error,
    },

    /// Dial did not complete within the connect timeout
    #[error("timed out dialing {endpoint} endpoint {host} after {timeout:?}")]
    Timeout {
        endpoint: String,
        host: String,
        timeout: Duration,
    },

    /// Transport-level dial failure (refused, unreachable, handshake)
    #[error("failed to dial {endpoint} endpoint {host}: {source}")]
    Transport {
        endpoint: String,
        host: String,
        #[source]
        source: tonic::transport::Error,
    },
}

impl ConnectError {
    /// Name of the endpoint the dial was aimed at.
    pub fn endpoint(&self) -> &str {
        match self {
            ConnectError::MissingHost { endpoint }
            | ConnectError::InvalidAddress { endpoint, .. }
            | ConnectError::InsecureScheme { endpoint, .. }
            | ConnectError::Certificate { endpoint, .. }
            | ConnectError::Tls { endpoint, .. }
            | ConnectError::Timeout { endpoint, .. }
            | ConnectError::Transport { endpoint, .. } => endpoint,
        }
    }
}

/// The BFD peer listing could not be completed.
#[derive(Debug, Error)]
#[error("failed to list bfd peers: {0}")]
pub struct ListError(#[source] pub tonic::Status);

/// A configured peer name does not appear in the BFD peer listing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("bfd peer '{name}' is not known to the bfd daemon")]
pub struct UnresolvedPeerError {
    pub name: String,
}

/// A per-peer monitoring stream could not be opened.
#[derive(Debug, Error)]
#[error("failed to create monitor peer request for '{peer}': {source}")]
pub struct MonitorSetupError {
    pub peer: String,
    #[source]
    pub source: tonic::Status,
}

/// A monitoring stream failed after it had started.
#[derive(Debug, Error)]
#[error("failed to read bfd monitoring stream for '{peer}': {source}")]
pub struct StreamError {
    pub peer: String,
    #[source]
    pub source: tonic::Status,
}

/// An enable/disable call against the BGP daemon failed.
#[derive(Debug, Error)]
#[error("failed to {action} bgp peer {address}: {source}")]
pub struct ActionDispatchError {
    /// "enable" or "disable"
    pub action: &'static str,
    pub address: String,
    #[source]
    pub source: tonic::Status,
}

/// Configuration file could not be loaded or failed validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Error reading config file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Error parsing config file {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Invalid configuration for {field}: {message}")]
    Invalid { field: String, message: String },
}

impl ConfigError {
    /// Creates a validation error.
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Invalid {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Errors that stop interconnectd from running
#[derive(Debug, Error)]
pub enum InterconnectError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Connect(#[from] ConnectError),

    #[error(transparent)]
    List(#[from] ListError),

    #[error(transparent)]
    UnresolvedPeer(#[from] UnresolvedPeerError),

    #[error(transparent)]
    MonitorSetup(#[from] MonitorSetupError),

    /// Logging could not be initialized
    #[error("Logging error: {0}")]
    Logging(String),
}

/// Result type alias for interconnectd operations
pub type Result<T> = std::result::Result<T, InterconnectError>;
