//! gRPC bindings for the control-plane daemons bridged by interconnectd.
//!
//! Generated at build time from `proto/bfd.proto` and `proto/gobgp.proto`
//! (client side only).
//!
//! - [`bfd`]: `api.BfdApi`, peer listing and peer monitoring (server streaming)
//! - [`gobgp`]: `gobgpapi.GobgpApi`, peer enable/disable (unary)

/// `api.BfdApi` messages and client.
pub mod bfd {
    tonic::include_proto!("api");
}

/// `gobgpapi.GobgpApi` messages and client.
pub mod gobgp {
    tonic::include_proto!("gobgpapi");
}

pub use bfd::bfd_api_client::BfdApiClient;
pub use gobgp::gobgp_api_client::GobgpApiClient;
