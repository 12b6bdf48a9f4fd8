//! Configuration file support for interconnectd
//!
//! Loads and validates the daemon configuration from a YAML file.
//! Default location: `config.yml` in the working directory.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Default configuration file path
pub const DEFAULT_CONFIG_PATH: &str = "config.yml";

/// Default logfile name
pub const DEFAULT_LOGFILE: &str = "interconnect.log";

/// Transport security settings for one endpoint
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TlsSpec {
    /// Use TLS for the connection
    #[serde(default)]
    pub enable: bool,

    /// PEM certificate used as trust anchor; system roots when absent
    #[serde(default, rename = "cert", skip_serializing_if = "Option::is_none")]
    pub cert_file: Option<PathBuf>,
}

/// How to reach one control-plane daemon
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointSpec {
    /// `host:port`, or a full URI
    #[serde(default)]
    pub host: String,

    /// Transport security, plaintext when absent
    #[serde(default)]
    pub tls: TlsSpec,
}

impl EndpointSpec {
    /// Plaintext endpoint at `host`.
    pub fn plaintext(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            tls: TlsSpec::default(),
        }
    }

    /// Returns true if TLS is enabled for this endpoint.
    pub fn tls_enabled(&self) -> bool {
        self.tls.enable
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Logfile path, rotated daily
    #[serde(default = "default_logfile")]
    pub logfile: PathBuf,

    /// Also write log lines to stdout
    #[serde(default, rename = "log-also-to-stdout")]
    pub log_to_stdout: bool,
}

fn default_logfile() -> PathBuf {
    PathBuf::from(DEFAULT_LOGFILE)
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            logfile: default_logfile(),
            log_to_stdout: false,
        }
    }
}

/// Complete interconnectd configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterconnectConfig {
    /// BFD daemon endpoint
    pub bfd: EndpointSpec,

    /// GoBGP daemon endpoint
    pub gobgp: EndpointSpec,

    /// BFD peer name -> BGP peer address
    #[serde(default)]
    pub peers: BTreeMap<String, String>,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl InterconnectConfig {
    /// Load configuration from `path`.
    ///
    /// An empty path falls back to [`DEFAULT_CONFIG_PATH`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let mut path = path.as_ref();
        if path.as_os_str().is_empty() {
            path = Path::new(DEFAULT_CONFIG_PATH);
        }

        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bfd.host.trim().is_empty() {
            return Err(ConfigError::invalid("bfd.host", "must not be empty"));
        }

        if self.gobgp.host.trim().is_empty() {
            return Err(ConfigError::invalid("gobgp.host", "must not be empty"));
        }

        if self.peers.is_empty() {
            return Err(ConfigError::invalid("peers", "no peers configured"));
        }

        for (name, address) in &self.peers {
            if name.trim().is_empty() {
                return Err(ConfigError::invalid("peers", "peer name must not be empty"));
            }
            if address.trim().is_empty() {
                return Err(ConfigError::invalid(
                    format!("peers.{}", name),
                    "bgp peer address must not be empty",
                ));
            }
        }

        Ok(())
    }
}
