//! Peer directory
//!
//! Fetches the full BFD peer listing once at startup and resolves configured
//! peer names to the identifiers the BFD daemon expects in monitor requests.

use std::collections::{BTreeMap, HashMap};

use futures::StreamExt;
use tracing::{debug, info, instrument};

use crate::client::BfdApi;
use crate::error::{ListError, UnresolvedPeerError};
use crate::types::{PeerId, PeerListing, PeerMapping};

/// Peer name -> BFD peer identifier, built from one complete listing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PeerIdentifierTable {
    peers: HashMap<String, PeerId>,
}

impl PeerIdentifierTable {
    /// Insert one listing entry; a later entry for the same name wins
    pub fn insert(&mut self, listing: PeerListing) {
        if let Some(previous) = self.peers.insert(listing.name.clone(), listing.id) {
            debug!(peer = %listing.name, previous = %previous, "duplicate bfd peer in listing, keeping later entry");
        }
    }

    /// Identifier of the peer called `name`
    pub fn get(&self, name: &str) -> Option<&PeerId> {
        self.peers.get(name)
    }

    /// Identifier of `name`, or an error when the BFD daemon does not know it
    pub fn resolve(&self, name: &str) -> Result<&PeerId, UnresolvedPeerError> {
        self.get(name).ok_or_else(|| UnresolvedPeerError {
            name: name.to_string(),
        })
    }

    /// Build the peer mappings for every configured `name -> bgp address`
    pub fn resolve_all(
        &self,
        configured: &BTreeMap<String, String>,
    ) -> Result<Vec<PeerMapping>, UnresolvedPeerError> {
        configured
            .iter()
            .map(|(name, bgp_address)| {
                Ok(PeerMapping {
                    name: name.clone(),
                    bfd_id: self.resolve(name)?.clone(),
                    bgp_address: bgp_address.clone(),
                })
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }
}

impl FromIterator<PeerListing> for PeerIdentifierTable {
    fn from_iter<I: IntoIterator<Item = PeerListing>>(iter: I) -> Self {
        let mut table = Self::default();
        for listing in iter {
            table.insert(listing);
        }
        table
    }
}

/// Retrieves all peers available from the BFD daemon
pub struct PeerDirectory;

impl PeerDirectory {
    /// Consume one complete `ListPeer` stream into a table
    ///
    /// Any error before the end of the stream discards everything received.
    #[instrument(skip_all)]
    pub async fn fetch(bfd: &dyn BfdApi) -> Result<PeerIdentifierTable, ListError> {
        let mut stream = bfd.list_peers().await.map_err(ListError)?;
        let mut table = PeerIdentifierTable::default();

        while let Some(item) = stream.next().await {
            table.insert(item.map_err(ListError)?);
        }

        info!(count = table.len(), "listed bfd peers");
        Ok(table)
    }
}
