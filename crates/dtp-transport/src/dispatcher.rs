use std::io::{ErrorKind, Read};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use dtp_core::{Endpoint, PacketTag, StatusCode, TagFraming, TagRegistry};
use dtp_pool::ThreadPool;

use crate::codec;
use crate::inflight::InFlightCounter;
use crate::server::ServerState;

/// One accepted request bundled for a pool worker: endpoint, connection and payload.
///
/// ## Ownership
/// The pool owns the unit from submission until `execute` finishes. A unit dropped
/// without executing (the pool refused it) answers `SERVICE_IS_STOPPED` so the client
/// never waits on a connection nobody will serve.
pub struct UnitOfWork {
    tag: PacketTag,
    endpoint: Arc<dyn Endpoint>,
    connection: Option<TcpStream>,
    packet: Bytes,
    in_flight: Arc<InFlightCounter>,
}

impl UnitOfWork {
    pub fn new(
        tag: PacketTag,
        endpoint: Arc<dyn Endpoint>,
        connection: TcpStream,
        packet: Bytes,
        in_flight: Arc<InFlightCounter>,
    ) -> Self {
        Self {
            tag,
            endpoint,
            connection: Some(connection),
            packet,
            in_flight,
        }
    }

    /// Runs the endpoint, answers with its status, closes, then leaves the in-flight count.
    ///
    /// The decrement happens-after the response write; clean termination relies on it.
    pub fn execute(mut self) {
        let Some(mut connection) = self.connection.take() else {
            return;
        };

        let endpoint = &self.endpoint;
        let packet = std::mem::take(&mut self.packet);
        let served = panic::catch_unwind(AssertUnwindSafe(|| endpoint.serve(packet, &mut connection)));
        let status = served.unwrap_or_else(|_| {
            tracing::error!("Endpoint for tag {} panicked; answering FAIL", self.tag);
            StatusCode::FAIL
        });

        if let Err(e) = codec::send_response_and_close(status, connection) {
            tracing::debug!("Response {:?} for tag {} not delivered: {}", status, self.tag, e);
        }

        self.in_flight.decrement();
    }
}

impl Drop for UnitOfWork {
    fn drop(&mut self) {
        if let Some(connection) = self.connection.take() {
            tracing::debug!("Unit of work for tag {} refused; answering SERVICE_IS_STOPPED", self.tag);
            let _ = codec::send_response_and_close(StatusCode::SERVICE_IS_STOPPED, connection);
        }
    }
}

/// Hands `unit` to the pool, counting it in flight only once the pool accepted it.
///
/// Returns `false` when the pool refused the work (it is shutting down).
pub fn submit(pool: &ThreadPool, unit: UnitOfWork) -> bool {
    let in_flight = unit.in_flight.clone();
    pool.enqueue_task_with(move || unit.execute(), || in_flight.increment())
        .is_some()
}

/// The accept/read/route loop. Owned by the dispatcher thread.
pub(crate) struct Dispatcher {
    pub(crate) listener: TcpListener,
    pub(crate) receive_buffer: Vec<u8>,
    pub(crate) read_timeout: Option<Duration>,
    pub(crate) registry: Arc<TagRegistry>,
    pub(crate) pool: Arc<ThreadPool>,
    pub(crate) framing: TagFraming,
    pub(crate) fixed_tag: PacketTag,
    pub(crate) clean_termination: bool,
    pub(crate) state: Arc<ServerState>,
}

impl Dispatcher {
    pub(crate) fn dispatch_requests(mut self) {
        tracing::info!("[{}] Dispatching requests", self.state.service_identifier());

        loop {
            if self.state.is_stopped() {
                break;
            }

            let (mut connection, peer) = match self.listener.accept() {
                Ok(accepted) => accepted,
                Err(e) => {
                    tracing::debug!("Accept failed: {}", e);
                    continue;
                }
            };

            if self.state.is_stopped() {
                // Either the stop wake-up connection or a client that raced the stop.
                break;
            }

            if let Some(packet) = self.read_packet(&mut connection, peer) {
                self.route(connection, peer, packet);
            }
        }

        self.terminate();
    }

    /// Reads one packet into the shared receive buffer and copies it out.
    ///
    /// A read of zero bytes, a read error or a timed-out read abandons the connection
    /// without a response.
    fn read_packet(&mut self, connection: &mut TcpStream, peer: SocketAddr) -> Option<Bytes> {
        if let Err(e) = connection.set_read_timeout(self.read_timeout) {
            tracing::debug!("Cannot bound read from {}: {}", peer, e);
            return None;
        }

        match connection.read(&mut self.receive_buffer) {
            Ok(0) => {
                tracing::debug!("Empty read from {}; abandoning connection", peer);
                None
            }
            Ok(n) => Some(Bytes::copy_from_slice(&self.receive_buffer[..n])),
            Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
                tracing::debug!("No packet from {} within {:?}; abandoning connection", peer, self.read_timeout);
                None
            }
            Err(e) => {
                tracing::debug!("Read from {} failed: {}", peer, e);
                None
            }
        }
    }

    fn route(&self, connection: TcpStream, peer: SocketAddr, packet: Bytes) {
        let Some((tag, payload)) = self.framing.split(self.fixed_tag, packet) else {
            tracing::debug!("Malformed packet from {}", peer);
            let _ = codec::send_response_and_close(StatusCode::MALFORMED_PACKET, connection);
            return;
        };

        let Some(endpoint) = self.registry.resolve(tag) else {
            // Answered inline: never touches the pool or the in-flight count.
            tracing::debug!("Unknown packet tag {} from {}", tag, peer);
            let _ = codec::send_response_and_close(StatusCode::UNKNOWN_PACKET_TAG, connection);
            return;
        };

        let unit = UnitOfWork::new(tag, endpoint, connection, payload, self.state.in_flight.clone());
        if !submit(&self.pool, unit) {
            tracing::warn!("Pool refused request from {} (tag {})", peer, tag);
        }
    }

    fn terminate(self) {
        let Dispatcher {
            listener,
            clean_termination,
            state,
            ..
        } = self;

        if clean_termination {
            tracing::info!(
                "[{}] Draining {} in-flight requests",
                state.service_identifier(),
                state.in_flight.current()
            );
            // No more tasks can be enqueued past this point.
            state.in_flight.wait_for_zero();
        } else if state.in_flight.current() != 0 {
            tracing::warn!(
                "[{}] Abrupt termination with {} requests in flight",
                state.service_identifier(),
                state.in_flight.current()
            );
        }

        drop(listener);
        tracing::info!("[{}] Listening socket closed", state.service_identifier());
    }
}
