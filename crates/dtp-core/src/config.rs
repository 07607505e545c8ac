use std::net::{IpAddr, SocketAddr};
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{DtpError, Result};
use crate::framing::TagFraming;
use crate::registry::DEFAULT_ENDPOINT_PACKET_TAG;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 9090;
pub const DEFAULT_RECEIVE_BUFFER_SIZE: usize = 4096;
pub const DEFAULT_THREAD_POOL_SIZE: u16 = 20;
pub const DEFAULT_MAX_PENDING_CONNECTIONS: u16 = 10;
pub const DEFAULT_BLOCKING_EXECUTION: bool = true;
pub const DEFAULT_CLEAN_TERMINATION: bool = true;
pub const DEFAULT_READ_TIMEOUT_MS: u64 = 5000;

/// Numeric and behavioural settings of a DTP server.
///
/// Every field is optional in TOML; missing keys fall back to [`ServerConfig::default`].
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Bytes read per connection. Anything beyond this in the first read is ignored.
    pub receive_buffer_size: usize,
    pub thread_pool_size: u16,
    /// Listen backlog.
    pub max_pending_connections: u16,
    /// `run` keeps the caller's thread until the dispatch loop exits.
    pub blocking_execution: bool,
    /// The listening socket is only released once every queued request was answered.
    pub clean_termination: bool,
    pub tag_framing: TagFraming,
    /// Tag assigned to every packet under [`TagFraming::Fixed`].
    pub fixed_tag: u32,
    pub reuse_port: bool,
    /// How long the dispatcher waits for a connected peer's packet. `0` waits forever.
    pub read_timeout_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            receive_buffer_size: DEFAULT_RECEIVE_BUFFER_SIZE,
            thread_pool_size: DEFAULT_THREAD_POOL_SIZE,
            max_pending_connections: DEFAULT_MAX_PENDING_CONNECTIONS,
            blocking_execution: DEFAULT_BLOCKING_EXECUTION,
            clean_termination: DEFAULT_CLEAN_TERMINATION,
            tag_framing: TagFraming::Fixed,
            fixed_tag: DEFAULT_ENDPOINT_PACKET_TAG,
            reuse_port: false,
            read_timeout_ms: DEFAULT_READ_TIMEOUT_MS,
        }
    }
}

impl ServerConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)
            .map_err(|e| DtpError::InvalidConfiguration(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            DtpError::InvalidConfiguration(format!("cannot read {}: {}", path.display(), e))
        })?;
        tracing::debug!("Loaded server configuration from {}", path.display());
        Self::from_toml_str(&raw)
    }

    pub fn validate(&self) -> Result<()> {
        if self.receive_buffer_size == 0 {
            return Err(DtpError::InvalidConfiguration(
                "receive_buffer_size must be at least 1 byte".into(),
            ));
        }
        if self.thread_pool_size == 0 {
            return Err(DtpError::InvalidConfiguration(
                "thread_pool_size must be at least 1".into(),
            ));
        }
        self.socket_addr()?;
        Ok(())
    }

    /// Per-connection read timeout, `None` when disabled.
    pub fn read_timeout(&self) -> Option<Duration> {
        (self.read_timeout_ms != 0).then(|| Duration::from_millis(self.read_timeout_ms))
    }

    /// The address the listening socket binds to.
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        let ip: IpAddr = self.host.parse().map_err(|_| {
            DtpError::InvalidConfiguration(format!("host '{}' is not an IP address", self.host))
        })?;
        Ok(SocketAddr::new(ip, self.port))
    }
}
