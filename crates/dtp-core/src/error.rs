use std::net::SocketAddr;

use crate::status::StatusCode;

pub type Result<T, E = DtpError> = std::result::Result<T, E>;

/// Failures surfaced by the server lifecycle.
///
/// Each variant maps onto one wire-level [`StatusCode`] through [`DtpError::status`],
/// so an embedder can keep reporting the numeric contract (e.g. as a process exit status).
#[derive(Debug, thiserror::Error)]
pub enum DtpError {
    #[error("server is not initialized")]
    NotInitialized,

    #[error("server is already initialized")]
    AlreadyInitialized,

    #[error("failed to launch worker thread: {0}")]
    ThreadLaunchFailed(#[source] std::io::Error),

    #[error("failed to allocate a {requested}-byte receive buffer")]
    OutOfMemory { requested: usize },

    #[error("socket creation failed: {0}")]
    SocketCreationFailed(#[source] std::io::Error),

    #[error("socket configuration failed: {0}")]
    SocketConfigurationFailed(#[source] std::io::Error),

    #[error("failed to bind {addr}: {source}")]
    SocketBindFailed {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("socket listen failed: {0}")]
    SocketListenFailed(#[source] std::io::Error),

    #[error("service is stopped")]
    ServiceIsStopped,

    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
}

impl DtpError {
    pub fn status(&self) -> StatusCode {
        match self {
            DtpError::NotInitialized => StatusCode::NOT_INITIALIZED,
            DtpError::AlreadyInitialized => StatusCode::ALREADY_INITIALIZED,
            DtpError::ThreadLaunchFailed(_) => StatusCode::THREAD_LAUNCH_FAILED,
            DtpError::OutOfMemory { .. } => StatusCode::OUT_OF_MEMORY,
            DtpError::SocketCreationFailed(_) => StatusCode::SOCKET_CREATION_FAILED,
            DtpError::SocketConfigurationFailed(_) => StatusCode::SOCKET_CONFIGURATION_FAILED,
            DtpError::SocketBindFailed { .. } => StatusCode::SOCKET_BIND_FAILED,
            DtpError::SocketListenFailed(_) => StatusCode::SOCKET_LISTEN_FAILED,
            DtpError::ServiceIsStopped => StatusCode::SERVICE_IS_STOPPED,
            DtpError::InvalidConfiguration(_) => StatusCode::INVALID_CONFIGURATION,
        }
    }
}

impl From<&DtpError> for StatusCode {
    fn from(e: &DtpError) -> Self {
        e.status()
    }
}
