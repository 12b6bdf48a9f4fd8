//! Per-peer monitoring
//!
//! Each configured peer gets a [`PeerMonitor`], which drains the BFD state
//! change stream, and an [`ActionWorker`], which turns the received states into
//! BGP calls one at a time. The two are joined by an unbounded queue so the
//! monitor never waits on the BGP daemon while the order of actions still
//! follows the order of notifications.

use std::sync::Arc;

use futures::StreamExt;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::client::{BfdApi, SessionStateStream};
use crate::error::{MonitorSetupError, StreamError};
use crate::reconciler::Reconciler;
use crate::types::{PeerMapping, SessionState};

/// Why a monitor stopped
#[derive(Debug)]
pub enum MonitorExit {
    /// The BFD daemon closed the stream
    EndOfStream,
    /// The stream failed; monitoring of this peer is over
    Failed(StreamError),
    /// Shutdown was requested
    Cancelled,
}

/// Open the state change stream for `peer`
pub async fn open_stream(
    bfd: &dyn BfdApi,
    peer: &PeerMapping,
) -> Result<SessionStateStream, MonitorSetupError> {
    debug!(peer = %peer.name, id = %peer.bfd_id, "opening bfd monitor stream");
    bfd.monitor_peer(&peer.bfd_id)
        .await
        .map_err(|source| MonitorSetupError {
            peer: peer.name.clone(),
            source,
        })
}

/// Build the monitor/worker pair for one peer
pub fn peer_pipeline(
    name: impl Into<String>,
    stream: SessionStateStream,
    reconciler: Arc<Reconciler>,
) -> (PeerMonitor, ActionWorker) {
    let name = name.into();
    let (tx, rx) = mpsc::unbounded_channel();
    (
        PeerMonitor {
            name: name.clone(),
            stream,
            queue: tx,
        },
        ActionWorker {
            name,
            reconciler,
            queue: rx,
        },
    )
}

/// Receives state changes of one BFD peer
pub struct PeerMonitor {
    name: String,
    stream: SessionStateStream,
    queue: mpsc::UnboundedSender<SessionState>,
}

impl PeerMonitor {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Forward notifications until the stream ends, fails or `shutdown` fires
    pub async fn run(mut self, shutdown: CancellationToken) -> MonitorExit {
        loop {
            let item = tokio::select! {
                biased;
                _ = shutdown.cancelled() => return MonitorExit::Cancelled,
                item = self.stream.next() => item,
            };

            match item {
                None => {
                    info!("bfd monitoring stream for peer {} closed by remote", self.name);
                    return MonitorExit::EndOfStream;
                }
                Some(Err(source)) => {
                    let err = StreamError {
                        peer: self.name.clone(),
                        source,
                    };
                    error!("{}", err);
                    return MonitorExit::Failed(err);
                }
                Some(Ok(state)) => {
                    info!("bfd peer {} changed to {}", self.name, state);
                    if self.queue.send(state).is_err() {
                        // worker only goes away on shutdown
                        return MonitorExit::Cancelled;
                    }
                }
            }
        }
    }
}

/// Applies the state changes of one BFD peer to the BGP daemon, in order
pub struct ActionWorker {
    name: String,
    reconciler: Arc<Reconciler>,
    queue: mpsc::UnboundedReceiver<SessionState>,
}

impl ActionWorker {
    /// Process queued states until the monitor is gone or `shutdown` fires
    ///
    /// Cancellation also interrupts a BGP call that is still waiting for a reply.
    ///
    /// Returns the number of failed BGP calls.
    pub async fn run(mut self, shutdown: CancellationToken) -> usize {
        let mut failures = 0;
        loop {
            let state = tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                state = self.queue.recv() => match state {
                    Some(state) => state,
                    None => break,
                },
            };

            // an in-flight BGP call is abandoned on shutdown, not drained
            let outcome = tokio::select! {
                biased;
                _ = shutdown.cancelled() => {
                    debug!(peer = %self.name, %state, "dropping bgp call in flight at shutdown");
                    break;
                }
                outcome = self.reconciler.reconcile(&self.name, state) => outcome,
            };

            if let Err(e) = outcome {
                failures += 1;
                error!("{}", e);
            }
        }
        debug!(peer = %self.name, failures, "action worker stopped");
        failures
    }
}
