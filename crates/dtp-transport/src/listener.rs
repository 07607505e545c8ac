use std::net::TcpListener;

use dtp_core::{DtpError, ServerConfig};
use socket2::{Domain, Protocol, Socket, Type};

/// Creates, configures, binds and listens, in that order.
///
/// Each step fails with its own [`DtpError`]; the socket is closed on any failure
/// when it goes out of scope.
pub fn open_listener(config: &ServerConfig) -> Result<TcpListener, DtpError> {
    let addr = config.socket_addr()?;

    let socket = Socket::new(Domain::for_address(addr), Type::STREAM, Some(Protocol::TCP))
        .map_err(DtpError::SocketCreationFailed)?;

    socket
        .set_reuse_address(true)
        .map_err(DtpError::SocketConfigurationFailed)?;

    if config.reuse_port {
        set_reuse_port(&socket).map_err(DtpError::SocketConfigurationFailed)?;
    }

    socket
        .bind(&addr.into())
        .map_err(|source| DtpError::SocketBindFailed { addr, source })?;

    socket
        .listen(i32::from(config.max_pending_connections))
        .map_err(DtpError::SocketListenFailed)?;

    let listener: TcpListener = socket.into();
    tracing::debug!(
        "Listening on {:?} (backlog {})",
        listener.local_addr().ok(),
        config.max_pending_connections
    );
    Ok(listener)
}

#[cfg(unix)]
fn set_reuse_port(socket: &Socket) -> std::io::Result<()> {
    socket.set_reuse_port(true)
}

#[cfg(not(unix))]
fn set_reuse_port(_socket: &Socket) -> std::io::Result<()> {
    Err(std::io::Error::new(
        std::io::ErrorKind::Unsupported,
        "SO_REUSEPORT is not available on this platform",
    ))
}
