use std::io::Write;

use bytes::Bytes;

use crate::status::StatusCode;

/// An application handler bound to a packet tag.
///
/// ## Contract
/// Endpoints run concurrently on pool workers and must not rely on shared mutable state
/// across tags. They should finish in bounded time: clean termination waits for them.
pub trait Endpoint: Send + Sync + 'static {
    /// Processes one packet payload and yields the status written back to the client.
    fn handle(&self, packet: Bytes) -> StatusCode;

    /// Like [`Endpoint::handle`], with access to the connection before the status trailer.
    ///
    /// Anything written to `preamble` reaches the client ahead of the 4-byte status.
    fn serve(&self, packet: Bytes, preamble: &mut dyn Write) -> StatusCode {
        let _ = preamble;
        self.handle(packet)
    }
}

impl<F> Endpoint for F
where
    F: Fn(Bytes) -> StatusCode + Send + Sync + 'static,
{
    fn handle(&self, packet: Bytes) -> StatusCode {
        self(packet)
    }
}

/// Endpoint that writes a business payload ahead of the status trailer.
pub struct WithPreamble<F>(F);

/// Wraps `f` so it receives the connection writer alongside the payload.
pub fn with_preamble<F>(f: F) -> WithPreamble<F>
where
    F: Fn(Bytes, &mut dyn Write) -> StatusCode + Send + Sync + 'static,
{
    WithPreamble(f)
}

impl<F> Endpoint for WithPreamble<F>
where
    F: Fn(Bytes, &mut dyn Write) -> StatusCode + Send + Sync + 'static,
{
    fn handle(&self, packet: Bytes) -> StatusCode {
        (self.0)(packet, &mut std::io::sink())
    }

    fn serve(&self, packet: Bytes, preamble: &mut dyn Write) -> StatusCode {
        (self.0)(packet, preamble)
    }
}

/// Diagnostic endpoint bound to the default tag. Logs the packet and succeeds.
pub fn default_endpoint(packet: Bytes) -> StatusCode {
    tracing::info!(len = packet.len(), "DTP packet: {}", String::from_utf8_lossy(&packet));
    StatusCode::SUCCESS
}
