//! Session supervisor
//!
//! Drives startup (dial BFD, list peers, dial BGP, open one monitor stream per
//! configured peer) and then waits for the per-peer tasks. Every startup error
//! aborts the whole service; connections opened up to that point are released
//! on return.
//!
//! # NIST 800-53 Rev 5 Control Mappings
//! - AU-12: Audit Record Generation - Startup failures and peer transitions are logged
//! - SI-4: System Monitoring - Continuous per-peer liveness monitoring

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::instrument::WithSubscriber;
use tracing::{error, info, warn, Dispatch};

use crate::client::{Dialer, GrpcDialer};
use crate::config::{EndpointSpec, InterconnectConfig};
use crate::directory::PeerDirectory;
use crate::error::Result;
use crate::monitor::{self, MonitorExit};
use crate::reconciler::Reconciler;

/// Owns startup order and the lifetime of all per-peer tasks
pub struct Supervisor {
    bfd: EndpointSpec,
    gobgp: EndpointSpec,
    peers: BTreeMap<String, String>,
    dialer: Arc<dyn Dialer>,
    dispatch: Dispatch,
}

impl Supervisor {
    /// Supervisor for `config`, dialing over gRPC and logging to the current subscriber
    pub fn new(config: &InterconnectConfig) -> Self {
        Self {
            bfd: config.bfd.clone(),
            gobgp: config.gobgp.clone(),
            peers: config.peers.clone(),
            dialer: Arc::new(GrpcDialer),
            dispatch: tracing::dispatcher::get_default(|dispatch| dispatch.clone()),
        }
    }

    /// Replace the dialer used for both endpoints
    pub fn with_dialer(mut self, dialer: impl Dialer + 'static) -> Self {
        self.dialer = Arc::new(dialer);
        self
    }

    /// Send all log output of this supervisor and its tasks to `dispatch`
    pub fn with_dispatch(mut self, dispatch: Dispatch) -> Self {
        self.dispatch = dispatch;
        self
    }

    /// Start monitoring and wait until every peer task has exited
    ///
    /// Streams from the BFD daemon are long-lived, so in normal operation
    /// this only returns after `shutdown` is cancelled.
    pub async fn run(&self, shutdown: CancellationToken) -> Result<()> {
        self.supervise(shutdown)
            .with_subscriber(self.dispatch.clone())
            .await
    }

    async fn supervise(&self, shutdown: CancellationToken) -> Result<()> {
        let tracker = self.start(&shutdown).await?;
        info!(tasks = tracker.len(), "monitoring {} bfd peers", self.peers.len());

        tracker.wait().await;
        if shutdown.is_cancelled() {
            info!("all peer monitors stopped after shutdown request");
        } else {
            warn!("all bfd monitoring streams have ended");
        }
        Ok(())
    }

    async fn start(&self, shutdown: &CancellationToken) -> Result<TaskTracker> {
        let bfd = self
            .dialer
            .dial_bfd(&self.bfd)
            .await
            .inspect_err(|e| error!("failed to dial bfdd: {}", e))?;

        let table = PeerDirectory::fetch(bfd.as_ref())
            .await
            .inspect_err(|e| error!("failed to list peers: {}", e))?;

        let bgp = self
            .dialer
            .dial_bgp(&self.gobgp)
            .await
            .inspect_err(|e| error!("failed to dial gobgpd: {}", e))?;

        let mappings = table
            .resolve_all(&self.peers)
            .inspect_err(|e| error!("{}", e))?;

        // All streams are opened before anything is spawned so a setup
        // failure leaves no monitor running.
        let mut streams = Vec::with_capacity(mappings.len());
        for mapping in &mappings {
            let stream = monitor::open_stream(bfd.as_ref(), mapping)
                .await
                .inspect_err(|e| error!("{}", e))?;
            streams.push(stream);
        }

        let reconciler = Arc::new(Reconciler::new(bgp, &mappings));
        let tracker = TaskTracker::new();

        for (mapping, stream) in mappings.iter().zip(streams) {
            let (monitor, worker) =
                monitor::peer_pipeline(mapping.name.clone(), stream, reconciler.clone());

            let token = shutdown.clone();
            tracker.spawn(
                async move {
                    let name = monitor.name().to_string();
                    match monitor.run(token).await {
                        MonitorExit::EndOfStream => info!(peer = %name, "monitor finished"),
                        MonitorExit::Failed(_) => warn!(peer = %name, "monitor stopped after stream error"),
                        MonitorExit::Cancelled => info!(peer = %name, "monitor cancelled"),
                    }
                }
                .with_subscriber(self.dispatch.clone()),
            );

            tracker.spawn(worker.run(shutdown.clone()).with_subscriber(self.dispatch.clone()));
        }
        tracker.close();

        Ok(tracker)
    }
}
