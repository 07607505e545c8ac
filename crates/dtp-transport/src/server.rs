use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};
use std::thread::JoinHandle;
use std::time::Duration;

use dtp_core::{DtpError, ServerBuilder};
use dtp_pool::{PoolError, ThreadPool};

use crate::dispatcher::Dispatcher;
use crate::inflight::InFlightCounter;
use crate::listener;

const WAKE_TIMEOUT: Duration = Duration::from_millis(250);

/// Lifecycle flags shared by the server, its dispatcher thread and stop handles.
pub(crate) struct ServerState {
    service_identifier: String,
    initialized: AtomicBool,
    stopped: AtomicBool,
    dispatching: AtomicBool,
    pub(crate) in_flight: Arc<InFlightCounter>,
    wake_addr: OnceLock<SocketAddr>,
    /// Set by `init`, taken by `run`. A stop before `run` drops it, closing the listener.
    pending: Mutex<Option<Dispatcher>>,
}

impl ServerState {
    pub(crate) fn service_identifier(&self) -> &str {
        &self.service_identifier
    }

    pub(crate) fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    fn request_stop(&self) -> Result<(), DtpError> {
        if self.stopped.swap(true, Ordering::SeqCst) {
            return Err(DtpError::ServiceIsStopped);
        }
        tracing::info!("[{}] Stop requested", self.service_identifier);

        let never_ran = lock(&self.pending).take();
        if never_ran.is_some() {
            drop(never_ran);
            tracing::info!("[{}] Listening socket closed before run", self.service_identifier);
            return Ok(());
        }

        if self.dispatching.load(Ordering::SeqCst) {
            self.wake_dispatcher();
        }
        Ok(())
    }

    /// Unblocks a dispatcher parked in `accept` with a throwaway loopback connection.
    fn wake_dispatcher(&self) {
        let Some(addr) = self.wake_addr.get() else {
            return;
        };
        if let Err(e) = TcpStream::connect_timeout(addr, WAKE_TIMEOUT) {
            // Backlog full or listener busy: the loop still sees the flag once its
            // current accept or bounded read returns.
            tracing::warn!(
                "[{}] Dispatcher wake-up to {} failed: {}; stop completes on the next connection or read timeout",
                self.service_identifier,
                addr,
                e
            );
        }
    }
}

/// Stops a server from another thread, e.g. while `run` blocks in blocking execution.
#[derive(Clone)]
pub struct StopHandle {
    state: Arc<ServerState>,
}

impl StopHandle {
    /// Returns [`DtpError::ServiceIsStopped`] if the server was already stopped.
    pub fn stop(&self) -> Result<(), DtpError> {
        self.state.request_stop()
    }

    pub fn is_stopped(&self) -> bool {
        self.state.is_stopped()
    }
}

/// TCP server for the Data Transmission Protocol.
///
/// ## Lifecycle
/// `NotInitialized -> Initialized -> Running -> Stopped`, monotonic. A stopped
/// server can be neither re-initialized nor restarted.
pub struct DtpServer {
    state: Arc<ServerState>,
    dispatcher_thread: Mutex<Option<JoinHandle<()>>>,
    pool: Option<Arc<ThreadPool>>,
    local_addr: Option<SocketAddr>,
    blocking_execution: bool,
}

static_assertions::assert_impl_all!(DtpServer: Send, Sync);
static_assertions::assert_impl_all!(StopHandle: Send, Sync, Clone);

impl DtpServer {
    pub fn new(service_identifier: impl Into<String>) -> Self {
        Self {
            state: Arc::new(ServerState {
                service_identifier: service_identifier.into(),
                initialized: AtomicBool::new(false),
                stopped: AtomicBool::new(false),
                dispatching: AtomicBool::new(false),
                in_flight: Arc::new(InFlightCounter::new()),
                wake_addr: OnceLock::new(),
                pending: Mutex::new(None),
            }),
            dispatcher_thread: Mutex::new(None),
            pool: None,
            local_addr: None,
            blocking_execution: dtp_core::config::DEFAULT_BLOCKING_EXECUTION,
        }
    }

    /// Consumes the configuration snapshot (defaults when `None`), spawns the worker
    /// pool, allocates the receive buffer and opens the listening socket.
    ///
    /// Nothing is left listening when any step fails.
    pub fn init(&mut self, configuration: Option<ServerBuilder>) -> Result<(), DtpError> {
        if self.is_initialized() {
            return Err(DtpError::AlreadyInitialized);
        }
        if self.is_stopped() {
            return Err(DtpError::ServiceIsStopped);
        }

        let ServerBuilder { registry, config } = configuration.unwrap_or_default();
        config.validate()?;

        let pool = ThreadPool::with_name(usize::from(config.thread_pool_size), "dtp-worker")
            .map_err(|e| match e {
                PoolError::ThreadLaunchFailed { source, .. } => DtpError::ThreadLaunchFailed(source),
                PoolError::NoWorkers => {
                    DtpError::InvalidConfiguration("thread_pool_size must be at least 1".into())
                }
            })?;
        let pool = Arc::new(pool);

        let receive_buffer = allocate_receive_buffer(config.receive_buffer_size)?;
        let listener = listener::open_listener(&config)?;
        let local_addr = listener
            .local_addr()
            .map_err(DtpError::SocketConfigurationFailed)?;

        let _ = self.state.wake_addr.set(wake_addr_for(local_addr));

        *lock(&self.state.pending) = Some(Dispatcher {
            listener,
            receive_buffer,
            read_timeout: config.read_timeout(),
            registry: Arc::new(registry),
            pool: pool.clone(),
            framing: config.tag_framing,
            fixed_tag: config.fixed_tag,
            clean_termination: config.clean_termination,
            state: self.state.clone(),
        });
        self.pool = Some(pool);
        self.local_addr = Some(local_addr);
        self.blocking_execution = config.blocking_execution;
        self.state.initialized.store(true, Ordering::SeqCst);

        tracing::info!(
            "[{}] Initialized on {} ({} workers, {}-byte buffer, {:?} framing)",
            self.state.service_identifier,
            local_addr,
            config.thread_pool_size,
            config.receive_buffer_size,
            config.tag_framing
        );
        Ok(())
    }

    /// Starts the dispatch loop on its own thread.
    ///
    /// No-op unless initialized and not stopped, and on any call after the first. With
    /// blocking execution the caller waits here until the loop exits.
    pub fn run(&self) -> Result<(), DtpError> {
        if !self.is_initialized() {
            tracing::warn!("[{}] run called before init; ignoring", self.state.service_identifier);
            return Ok(());
        }
        let dispatcher = {
            let mut pending = lock(&self.state.pending);
            if self.is_stopped() {
                return Ok(());
            }
            match pending.take() {
                Some(dispatcher) => dispatcher,
                None => return Ok(()),
            }
        };

        let state = self.state.clone();
        state.dispatching.store(true, Ordering::SeqCst);
        let spawned = std::thread::Builder::new()
            .name("dtp-dispatcher".into())
            .spawn(move || {
                dispatcher.dispatch_requests();
                state.dispatching.store(false, Ordering::SeqCst);
            });

        let handle = match spawned {
            Ok(handle) => handle,
            Err(e) => {
                self.state.dispatching.store(false, Ordering::SeqCst);
                return Err(DtpError::ThreadLaunchFailed(e));
            }
        };

        if self.blocking_execution {
            join_dispatcher(handle);
        } else {
            *lock(&self.dispatcher_thread) = Some(handle);
        }
        Ok(())
    }

    /// Stops accepting requests. Draining, if configured, happens in the dispatch loop.
    ///
    /// Returns [`DtpError::ServiceIsStopped`] on a second call.
    pub fn stop(&self) -> Result<(), DtpError> {
        self.state.request_stop()
    }

    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            state: self.state.clone(),
        }
    }

    /// Waits for a non-blocking dispatch loop to exit.
    pub fn join(&self) {
        let handle = lock(&self.dispatcher_thread).take();
        if let Some(handle) = handle {
            join_dispatcher(handle);
        }
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }

    pub fn service_identifier(&self) -> &str {
        &self.state.service_identifier
    }

    pub fn requests_in_flight(&self) -> usize {
        self.state.in_flight.current()
    }

    /// Pool tasks currently executing, for external draining decisions.
    pub fn tasks_in_execution(&self) -> usize {
        self.pool
            .as_ref()
            .map_or(0, |pool| pool.number_tasks_in_execution())
    }

    pub fn is_initialized(&self) -> bool {
        self.state.initialized.load(Ordering::SeqCst)
    }

    pub fn is_stopped(&self) -> bool {
        self.state.is_stopped()
    }

    /// Whether the dispatch loop is still alive (accepting, or draining before it
    /// releases the listening socket).
    pub fn is_running(&self) -> bool {
        self.state.dispatching.load(Ordering::SeqCst)
    }
}

impl Drop for DtpServer {
    fn drop(&mut self) {
        let _ = self.state.request_stop();
        self.join();
        // The pool drops after this: queued work drains, then workers are joined.
    }
}

fn join_dispatcher(handle: JoinHandle<()>) {
    if handle.join().is_err() {
        tracing::error!("Dispatcher thread panicked");
    }
}

fn allocate_receive_buffer(size: usize) -> Result<Vec<u8>, DtpError> {
    let mut buffer = Vec::new();
    buffer
        .try_reserve_exact(size)
        .map_err(|_| DtpError::OutOfMemory { requested: size })?;
    buffer.resize(size, 0);
    Ok(buffer)
}

fn wake_addr_for(local: SocketAddr) -> SocketAddr {
    let ip = match local.ip() {
        IpAddr::V4(ip) if ip.is_unspecified() => IpAddr::V4(Ipv4Addr::LOCALHOST),
        IpAddr::V6(ip) if ip.is_unspecified() => IpAddr::V6(Ipv6Addr::LOCALHOST),
        ip => ip,
    };
    SocketAddr::new(ip, local.port())
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
