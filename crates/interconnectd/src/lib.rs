//! BFD to BGP interconnect daemon
//!
//! Watches session liveness reported by a BFD daemon and administratively
//! enables or disables the matching GoBGP neighbors, so BGP sessions are
//! withdrawn as soon as the forwarding path under them fails.
//!
//! # NIST 800-53 Rev 5 Control Mappings
//!
//! | Control | Description | Implementation |
//! |---------|-------------|----------------|
//! | AU-3 | Content of Audit Records | Level, time, pid and source on every log line |
//! | AU-12 | Audit Record Generation | Every peer transition and startup failure logged |
//! | CM-6 | Configuration Settings | YAML configuration, validated before start |
//! | SC-8 | Transmission Confidentiality | Optional TLS towards both daemons |
//! | SI-4 | System Monitoring | One long-lived monitor per BFD peer |
//! | SI-11 | Error Handling | Structured error types, per-peer failure isolation |
//!
//! # Architecture
//!
//! ```text
//! +-------------+      +--------------------------------------+      +-------------+
//! |    bfdd     |      |             interconnectd            |      |   gobgpd    |
//! |             |      |                                      |      |             |
//! |  ListPeer   |----->|  PeerDirectory (once, at startup)    |      |             |
//! |             |      |                                      |      |             |
//! | MonitorPeer |----->|  PeerMonitor --queue--> ActionWorker |      |             |
//! |  (per peer) |      |                             |        |      |             |
//! |             |      |                         Reconciler --|----->| Enable/     |
//! |             |      |                                      |      | DisablePeer |
//! +-------------+      +--------------------------------------+      +-------------+
//! ```

pub mod client;
pub mod config;
pub mod connector;
pub mod directory;
pub mod error;
pub mod logging;
pub mod monitor;
pub mod reconciler;
pub mod supervisor;
pub mod types;

pub use client::{BfdApi, BgpApi, Dialer, GrpcDialer, PeerListStream, SessionStateStream};
pub use config::{EndpointSpec, InterconnectConfig, LoggingConfig, TlsSpec};
pub use connector::{connect, ConnectionHandle, CONNECT_TIMEOUT};
pub use directory::{PeerDirectory, PeerIdentifierTable};
pub use error::{
    ActionDispatchError, ConfigError, ConnectError, InterconnectError, ListError,
    MonitorSetupError, Result, StreamError, UnresolvedPeerError,
};
pub use monitor::{ActionWorker, MonitorExit, PeerMonitor};
pub use reconciler::{action_for, Reconciler};
pub use supervisor::Supervisor;
pub use types::{PeerAction, PeerId, PeerListing, PeerMapping, SessionState};
