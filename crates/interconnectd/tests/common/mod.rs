//! Shared test doubles for the BFD and BGP daemons
//!
//! Mocks record every call and can be scripted to fail at any step of the
//! startup sequence.

#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap, HashSet};
use std::io;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use tracing::Dispatch;
use tracing_subscriber::fmt::MakeWriter;

use interconnectd::{
    BfdApi, BgpApi, ConnectError, Dialer, EndpointSpec, InterconnectConfig, PeerId, PeerListStream,
    PeerListing, SessionState, SessionStateStream,
};

/// One call received by [`RecordingBgp`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BgpCall {
    Enable(String),
    Disable(String, String),
}

/// BGP daemon double recording enable/disable calls
#[derive(Default)]
pub struct RecordingBgp {
    calls: Mutex<Vec<BgpCall>>,
    failing: Mutex<HashSet<String>>,
    delay: Option<Duration>,
}

impl RecordingBgp {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Every call takes `delay` before it is recorded
    pub fn with_delay(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            delay: Some(delay),
            ..Self::default()
        })
    }

    /// Calls for `address` fail with UNAVAILABLE
    pub fn fail_address(&self, address: &str) {
        self.failing.lock().unwrap().insert(address.to_string());
    }

    pub fn calls(&self) -> Vec<BgpCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_for(&self, address: &str) -> Vec<BgpCall> {
        self.calls()
            .into_iter()
            .filter(|call| match call {
                BgpCall::Enable(a) | BgpCall::Disable(a, _) => a == address,
            })
            .collect()
    }

    async fn record(&self, address: &str, call: BgpCall) -> Result<(), tonic::Status> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.calls.lock().unwrap().push(call);
        if self.failing.lock().unwrap().contains(address) {
            return Err(tonic::Status::unavailable("gobgpd unavailable"));
        }
        Ok(())
    }
}

#[async_trait]
impl BgpApi for RecordingBgp {
    async fn enable_peer(&self, address: &str) -> Result<(), tonic::Status> {
        self.record(address, BgpCall::Enable(address.to_string()))
            .await
    }

    async fn disable_peer(&self, address: &str, communication: &str) -> Result<(), tonic::Status> {
        self.record(
            address,
            BgpCall::Disable(address.to_string(), communication.to_string()),
        )
        .await
    }
}

/// BFD daemon double with a scripted listing and scripted monitor streams
#[derive(Default)]
pub struct ScriptedBfd {
    listing: Vec<Result<PeerListing, tonic::Status>>,
    list_error: Option<tonic::Status>,
    streams: Mutex<HashMap<PeerId, SessionStateStream>>,
    monitor_errors: HashSet<PeerId>,
    pub monitor_calls: Arc<AtomicUsize>,
    pub released: Arc<AtomicBool>,
}

impl ScriptedBfd {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a peer to the listing
    pub fn peer(mut self, name: &str, id: &[u8]) -> Self {
        self.listing.push(Ok(PeerListing {
            name: name.to_string(),
            id: PeerId::new(id.to_vec()),
        }));
        self
    }

    /// Fail the listing stream after the entries added so far
    pub fn listing_error(mut self, status: tonic::Status) -> Self {
        self.listing.push(Err(status));
        self
    }

    /// Refuse to open the listing stream at all
    pub fn refuse_listing(mut self, status: tonic::Status) -> Self {
        self.list_error = Some(status);
        self
    }

    /// Stream yielding `items` and then closing
    pub fn states(self, id: &[u8], items: Vec<Result<SessionState, tonic::Status>>) -> Self {
        self.stream(id, stream::iter(items).boxed())
    }

    /// Stream for the peer `id`
    pub fn stream(self, id: &[u8], stream: SessionStateStream) -> Self {
        self.streams
            .lock()
            .unwrap()
            .insert(PeerId::new(id.to_vec()), stream);
        self
    }

    /// Refuse to open a monitor stream for `id`
    pub fn refuse_monitor(mut self, id: &[u8]) -> Self {
        self.monitor_errors.insert(PeerId::new(id.to_vec()));
        self
    }
}

impl Drop for ScriptedBfd {
    fn drop(&mut self) {
        self.released.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl BfdApi for ScriptedBfd {
    async fn list_peers(&self) -> Result<PeerListStream, tonic::Status> {
        if let Some(status) = &self.list_error {
            return Err(status.clone());
        }
        Ok(stream::iter(self.listing.clone()).boxed())
    }

    async fn monitor_peer(&self, id: &PeerId) -> Result<SessionStateStream, tonic::Status> {
        self.monitor_calls.fetch_add(1, Ordering::SeqCst);
        if self.monitor_errors.contains(id) {
            return Err(tonic::Status::unavailable("transport closed"));
        }
        // Peers without a script stay silent forever
        Ok(self
            .streams
            .lock()
            .unwrap()
            .remove(id)
            .unwrap_or_else(|| stream::pending().boxed()))
    }
}

/// Dialer handing out the scripted doubles
pub struct MockDialer {
    bfd: Mutex<Option<ScriptedBfd>>,
    bgp: Option<Arc<RecordingBgp>>,
    pub bgp_dials: Arc<AtomicUsize>,
}

impl MockDialer {
    pub fn new(bfd: ScriptedBfd, bgp: Arc<RecordingBgp>) -> Self {
        Self {
            bfd: Mutex::new(Some(bfd)),
            bgp: Some(bgp),
            bgp_dials: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Dialer whose BGP dial always times out
    pub fn unreachable_bgp(bfd: ScriptedBfd) -> Self {
        Self {
            bfd: Mutex::new(Some(bfd)),
            bgp: None,
            bgp_dials: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Dialer whose BFD dial always times out
    pub fn unreachable_bfd(bgp: Arc<RecordingBgp>) -> Self {
        Self {
            bfd: Mutex::new(None),
            bgp: Some(bgp),
            bgp_dials: Arc::new(AtomicUsize::new(0)),
        }
    }
}

fn timeout(endpoint: &str, spec: &EndpointSpec) -> ConnectError {
    ConnectError::Timeout {
        endpoint: endpoint.to_string(),
        host: spec.host.clone(),
        timeout: interconnectd::CONNECT_TIMEOUT,
    }
}

#[async_trait]
impl Dialer for MockDialer {
    async fn dial_bfd(&self, spec: &EndpointSpec) -> Result<Arc<dyn BfdApi>, ConnectError> {
        match self.bfd.lock().unwrap().take() {
            Some(bfd) => Ok(Arc::new(bfd)),
            None => Err(timeout("bfd", spec)),
        }
    }

    async fn dial_bgp(&self, spec: &EndpointSpec) -> Result<Arc<dyn BgpApi>, ConnectError> {
        self.bgp_dials.fetch_add(1, Ordering::SeqCst);
        match &self.bgp {
            Some(bgp) => Ok(bgp.clone()),
            None => Err(timeout("gobgp", spec)),
        }
    }
}

/// Configuration with the given `name -> bgp address` peers
pub fn config(peers: &[(&str, &str)]) -> InterconnectConfig {
    InterconnectConfig {
        bfd: EndpointSpec::plaintext("127.0.0.1:54211"),
        gobgp: EndpointSpec::plaintext("127.0.0.1:50051"),
        peers: peers
            .iter()
            .map(|(name, address)| (name.to_string(), address.to_string()))
            .collect::<BTreeMap<_, _>>(),
        ..InterconnectConfig::default()
    }
}

/// In-memory log sink
#[derive(Clone, Default)]
pub struct LogCapture(Arc<Mutex<Vec<u8>>>);

impl LogCapture {
    /// Dispatch formatting plain lines into this capture
    pub fn dispatch(&self) -> Dispatch {
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .with_target(false)
            .without_time()
            .with_max_level(tracing::Level::DEBUG)
            .with_writer(self.clone())
            .finish();
        Dispatch::new(subscriber)
    }

    pub fn lines(&self) -> Vec<String> {
        String::from_utf8(self.0.lock().unwrap().clone())
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    /// Lines logged at `level` ("INFO", "DEBUG", ...)
    pub fn lines_at(&self, level: &str) -> Vec<String> {
        self.lines()
            .into_iter()
            .filter(|line| line.trim_start().starts_with(level))
            .collect()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.lines().iter().any(|line| line.contains(needle))
    }
}

impl io::Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogCapture {
    type Writer = LogCapture;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}
