//! Endpoint connector
//!
//! Dials a control-plane daemon over gRPC, in plaintext or over TLS, within a
//! fixed connect timeout. Failures are reported once and never retried here.
//!
//! # NIST 800-53 Rev 5 Control Mappings
//! - SC-8: Transmission Confidentiality - Optional TLS with pinned or system trust anchors
//! - SC-23: Session Authenticity - Server certificate validated against the trust anchor

use std::time::Duration;

use tonic::transport::{Certificate, Channel, ClientTlsConfig, Endpoint};
use tracing::{debug, info};

use crate::config::EndpointSpec;
use crate::error::ConnectError;

/// Bound on the whole dial, TLS handshake included
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(1);

/// An open channel to one control-plane endpoint
///
/// The connection is released when the handle and every client built from
/// its channel have been dropped.
#[derive(Debug)]
pub struct ConnectionHandle {
    endpoint: String,
    host: String,
    channel: Channel,
}

impl ConnectionHandle {
    /// Channel for building RPC clients
    pub fn channel(&self) -> Channel {
        self.channel.clone()
    }
}

impl Drop for ConnectionHandle {
    fn drop(&mut self) {
        debug!(endpoint = %self.endpoint, host = %self.host, "closing connection");
    }
}

/// Build the URI for `host`, adding a scheme when none is given
///
/// With TLS enabled only `https` is accepted, any other scheme would make the
/// channel dial in plaintext.
pub fn endpoint_uri(name: &str, spec: &EndpointSpec) -> Result<String, ConnectError> {
    let host = spec.host.trim();
    match host.split_once("://") {
        Some((scheme, _)) if spec.tls_enabled() && !scheme.eq_ignore_ascii_case("https") => {
            Err(ConnectError::InsecureScheme {
                endpoint: name.to_string(),
                host: spec.host.clone(),
            })
        }
        Some(_) => Ok(host.to_string()),
        None if spec.tls_enabled() => Ok(format!("https://{}", host)),
        None => Ok(format!("http://{}", host)),
    }
}

async fn tls_config(name: &str, spec: &EndpointSpec) -> Result<ClientTlsConfig, ConnectError> {
    match &spec.tls.cert_file {
        None => Ok(ClientTlsConfig::new().with_native_roots()),
        Some(path) => {
            info!(endpoint = name, "using certificate {}", path.display());
            let pem = tokio::fs::read(path)
                .await
                .map_err(|source| ConnectError::Certificate {
                    endpoint: name.to_string(),
                    path: path.clone(),
                    source,
                })?;
            Ok(ClientTlsConfig::new().ca_certificate(Certificate::from_pem(pem)))
        }
    }
}

/// Connect to `spec` within [`CONNECT_TIMEOUT`]
pub async fn connect(name: &str, spec: &EndpointSpec) -> Result<ConnectionHandle, ConnectError> {
    connect_with_timeout(name, spec, CONNECT_TIMEOUT).await
}

/// Connect to `spec`, failing if the dial takes longer than `timeout`
pub async fn connect_with_timeout(
    name: &str,
    spec: &EndpointSpec,
    timeout: Duration,
) -> Result<ConnectionHandle, ConnectError> {
    if spec.host.trim().is_empty() {
        return Err(ConnectError::MissingHost {
            endpoint: name.to_string(),
        });
    }

    let uri = endpoint_uri(name, spec)?;
    let mut endpoint =
        Endpoint::from_shared(uri.clone()).map_err(|source| ConnectError::InvalidAddress {
            endpoint: name.to_string(),
            host: spec.host.clone(),
            source,
        })?;

    if spec.tls_enabled() {
        let tls = tls_config(name, spec).await?;
        endpoint = endpoint.tls_config(tls).map_err(|source| ConnectError::Tls {
            endpoint: name.to_string(),
            source,
        })?;
    }

    let endpoint = endpoint.connect_timeout(timeout);

    debug!(endpoint = name, uri = %uri, tls = spec.tls_enabled(), "dialing");
    let channel = match tokio::time::timeout(timeout, endpoint.connect()).await {
        Ok(Ok(channel)) => channel,
        Ok(Err(source)) => {
            return Err(ConnectError::Transport {
                endpoint: name.to_string(),
                host: spec.host.clone(),
                source,
            })
        }
        Err(_) => {
            return Err(ConnectError::Timeout {
                endpoint: name.to_string(),
                host: spec.host.clone(),
                timeout,
            })
        }
    };

    info!(endpoint = name, host = %spec.host, "connected");
    Ok(ConnectionHandle {
        endpoint: name.to_string(),
        host: spec.host.clone(),
        channel,
    })
}
