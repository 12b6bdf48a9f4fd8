//! State reconciler
//!
//! Translates BFD session state changes into GoBGP peer enable/disable calls.
//!
//! | BFD state            | BGP action                               |
//! |----------------------|------------------------------------------|
//! | `ADMIN_DOWN`, `DOWN` | disable peer, communication "disabled by bfd" |
//! | `UP`                 | enable peer                              |
//! | `INIT`, unknown      | none                                     |

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::client::BgpApi;
use crate::error::ActionDispatchError;
use crate::types::{PeerAction, PeerMapping, SessionState, DISABLE_COMMUNICATION};

/// Action for a BGP peer at `address` after its BFD session moved to `state`
pub fn action_for(state: SessionState, address: &str) -> Option<PeerAction> {
    match state {
        state if state.is_down() => Some(PeerAction::Disable {
            address: address.to_string(),
            communication: DISABLE_COMMUNICATION.to_string(),
        }),
        SessionState::Up => Some(PeerAction::Enable {
            address: address.to_string(),
        }),
        _ => None,
    }
}

/// Issues BGP actions for BFD state changes of the configured peers
pub struct Reconciler {
    bgp: Arc<dyn BgpApi>,
    addresses: HashMap<String, String>,
}

impl Reconciler {
    pub fn new<'a>(bgp: Arc<dyn BgpApi>, peers: impl IntoIterator<Item = &'a PeerMapping>) -> Self {
        let addresses = peers
            .into_iter()
            .map(|peer| (peer.name.clone(), peer.bgp_address.clone()))
            .collect();
        Self { bgp, addresses }
    }

    /// BGP address mapped to the BFD peer `name`
    pub fn address_of(&self, name: &str) -> Option<&str> {
        self.addresses.get(name).map(String::as_str)
    }

    /// Handle one state change of the BFD peer `name`
    ///
    /// Returns the action issued, `None` when the state calls for none. The
    /// outcome of the BGP call is returned as is; nothing is retried.
    pub async fn reconcile(
        &self,
        name: &str,
        state: SessionState,
    ) -> Result<Option<PeerAction>, ActionDispatchError> {
        let Some(address) = self.address_of(name) else {
            warn!(peer = name, %state, "ignoring session state change for unconfigured peer");
            return Ok(None);
        };

        let Some(action) = action_for(state, address) else {
            // the monitor already logged the change at info
            debug!("ignoring session state change {} for peer {}", state, name);
            return Ok(None);
        };

        self.dispatch(&action).await?;
        info!(
            peer = name,
            %state,
            "{}d bgp peer {}",
            action.verb(),
            action.address()
        );
        Ok(Some(action))
    }

    async fn dispatch(&self, action: &PeerAction) -> Result<(), ActionDispatchError> {
        let result = match action {
            PeerAction::Enable { address } => self.bgp.enable_peer(address).await,
            PeerAction::Disable {
                address,
                communication,
            } => self.bgp.disable_peer(address, communication).await,
        };

        result.map_err(|source| ActionDispatchError {
            action: action.verb(),
            address: action.address().to_string(),
            source,
        })
    }
}
