pub mod config;
pub mod endpoint;
pub mod error;
pub mod framing;
pub mod registry;
pub mod status;

pub use config::ServerConfig;
pub use endpoint::{default_endpoint, with_preamble, Endpoint};
pub use error::{DtpError, Result};
pub use framing::{frame_tagged, TagFraming};
pub use registry::{PacketTag, TagRegistry, DEFAULT_ENDPOINT_PACKET_TAG};
pub use status::StatusCode;

/// Configuration snapshot consumed once by a server's `init`.
///
/// ## Static Registration
/// Endpoints are bound here, before the server exists; after `init` the registry
/// can no longer change.
#[derive(Debug, Clone, Default)]
pub struct ServerBuilder {
    pub registry: TagRegistry,
    pub config: ServerConfig,
}

impl ServerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds an endpoint to a packet tag.
    pub fn route<E: Endpoint>(mut self, tag: PacketTag, endpoint: E) -> Self {
        self.registry.route(tag, endpoint);
        self
    }

    /// Replaces the whole registry.
    pub fn with_registry(mut self, registry: TagRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Overrides the default server configuration.
    pub fn with_config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    pub fn with_thread_pool_size(mut self, threads: u16) -> Self {
        self.config.thread_pool_size = threads;
        self
    }

    pub fn with_receive_buffer_size(mut self, bytes: usize) -> Self {
        self.config.receive_buffer_size = bytes;
        self
    }

    pub fn with_blocking_execution(mut self, enabled: bool) -> Self {
        self.config.blocking_execution = enabled;
        self
    }

    pub fn with_clean_termination(mut self, enabled: bool) -> Self {
        self.config.clean_termination = enabled;
        self
    }

    pub fn with_tag_framing(mut self, framing: TagFraming) -> Self {
        self.config.tag_framing = framing;
        self
    }

    pub fn with_fixed_tag(mut self, tag: PacketTag) -> Self {
        self.config.fixed_tag = tag;
        self
    }

    /// Bounds the wait for a connected peer's packet; `0` disables the bound.
    pub fn with_read_timeout_ms(mut self, millis: u64) -> Self {
        self.config.read_timeout_ms = millis;
        self
    }
}
