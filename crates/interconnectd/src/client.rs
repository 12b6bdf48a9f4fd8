//! Control-plane client abstractions
//!
//! [`BfdApi`] and [`BgpApi`] are the only surfaces the reconciliation engine
//! talks to. The gRPC implementations wrap the tonic clients from
//! `interconnect-api`; tests substitute scripted implementations.

use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::StreamExt;
use tracing::warn;

use interconnect_api::bfd::{ListPeerRequest, MonitorPeerRequest};
use interconnect_api::gobgp::{DisablePeerRequest, EnablePeerRequest};
use interconnect_api::{BfdApiClient, GobgpApiClient};
use tonic::transport::Channel;

use crate::config::EndpointSpec;
use crate::connector::{self, ConnectionHandle};
use crate::error::ConnectError;
use crate::types::{PeerId, PeerListing, SessionState};

/// Stream of BFD peer listing entries
pub type PeerListStream = BoxStream<'static, Result<PeerListing, tonic::Status>>;

/// Stream of local session state changes for one BFD peer
pub type SessionStateStream = BoxStream<'static, Result<SessionState, tonic::Status>>;

/// Operations consumed from the BFD daemon
#[async_trait]
pub trait BfdApi: Send + Sync {
    /// Open the peer listing stream
    async fn list_peers(&self) -> Result<PeerListStream, tonic::Status>;

    /// Open the state change stream for one peer
    async fn monitor_peer(&self, id: &PeerId) -> Result<SessionStateStream, tonic::Status>;
}

/// Operations issued against the BGP daemon
#[async_trait]
pub trait BgpApi: Send + Sync {
    /// Administratively enable the neighbor at `address`
    async fn enable_peer(&self, address: &str) -> Result<(), tonic::Status>;

    /// Administratively disable the neighbor at `address`
    async fn disable_peer(&self, address: &str, communication: &str)
        -> Result<(), tonic::Status>;
}

/// Establishes the two control-plane connections
#[async_trait]
pub trait Dialer: Send + Sync {
    async fn dial_bfd(&self, spec: &EndpointSpec) -> Result<Arc<dyn BfdApi>, ConnectError>;

    async fn dial_bgp(&self, spec: &EndpointSpec) -> Result<Arc<dyn BgpApi>, ConnectError>;
}

/// BFD daemon reached over gRPC
pub struct GrpcBfdClient {
    client: BfdApiClient<Channel>,
    _handle: ConnectionHandle,
}

impl GrpcBfdClient {
    pub fn new(handle: ConnectionHandle) -> Self {
        Self {
            client: BfdApiClient::new(handle.channel()),
            _handle: handle,
        }
    }
}

#[async_trait]
impl BfdApi for GrpcBfdClient {
    async fn list_peers(&self) -> Result<PeerListStream, tonic::Status> {
        let mut client = self.client.clone();
        let stream = client
            .list_peer(ListPeerRequest {})
            .await?
            .into_inner()
            .filter_map(|item| async move {
                match item {
                    Ok(response) => match response.peer {
                        Some(peer) => Some(Ok(PeerListing {
                            name: peer.name,
                            id: PeerId::from(response.uuid),
                        })),
                        None => {
                            warn!(uuid = %PeerId::from(response.uuid), "skipping bfd peer without description");
                            None
                        }
                    },
                    Err(status) => Some(Err(status)),
                }
            });
        Ok(stream.boxed())
    }

    async fn monitor_peer(&self, id: &PeerId) -> Result<SessionStateStream, tonic::Status> {
        let mut client = self.client.clone();
        let stream = client
            .monitor_peer(MonitorPeerRequest {
                uuid: id.as_bytes().to_vec(),
            })
            .await?
            .into_inner()
            .filter_map(|item| async move {
                match item {
                    Ok(response) => match response.local {
                        Some(local) => Some(Ok(SessionState::from_wire(local.state))),
                        None => {
                            warn!("skipping bfd notification without local state");
                            None
                        }
                    },
                    Err(status) => Some(Err(status)),
                }
            });
        Ok(stream.boxed())
    }
}

/// GoBGP daemon reached over gRPC
pub struct GrpcBgpClient {
    client: GobgpApiClient<Channel>,
    _handle: ConnectionHandle,
}

impl GrpcBgpClient {
    pub fn new(handle: ConnectionHandle) -> Self {
        Self {
            client: GobgpApiClient::new(handle.channel()),
            _handle: handle,
        }
    }
}

#[async_trait]
impl BgpApi for GrpcBgpClient {
    async fn enable_peer(&self, address: &str) -> Result<(), tonic::Status> {
        let mut client = self.client.clone();
        client
            .enable_peer(EnablePeerRequest {
                address: address.to_string(),
            })
            .await?;
        Ok(())
    }

    async fn disable_peer(
        &self,
        address: &str,
        communication: &str,
    ) -> Result<(), tonic::Status> {
        let mut client = self.client.clone();
        client
            .disable_peer(DisablePeerRequest {
                address: address.to_string(),
                communication: communication.to_string(),
            })
            .await?;
        Ok(())
    }
}

/// Dials both daemons with [`connector::connect`]
#[derive(Debug, Clone, Copy, Default)]
pub struct GrpcDialer;

#[async_trait]
impl Dialer for GrpcDialer {
    async fn dial_bfd(&self, spec: &EndpointSpec) -> Result<Arc<dyn BfdApi>, ConnectError> {
        let handle = connector::connect("bfd", spec).await?;
        Ok(Arc::new(GrpcBfdClient::new(handle)))
    }

    async fn dial_bgp(&self, spec: &EndpointSpec) -> Result<Arc<dyn BgpApi>, ConnectError> {
        let handle = connector::connect("gobgp", spec).await?;
        Ok(Arc::new(GrpcBgpClient::new(handle)))
    }
}
