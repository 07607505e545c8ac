pub use dtp_core::{DtpError, ServerBuilder, ServerConfig, StatusCode, TagRegistry};
pub mod client;
pub mod codec;
pub mod dispatcher;
pub mod inflight;
pub mod listener;
pub mod server;

pub use dispatcher::UnitOfWork;
pub use inflight::InFlightCounter;
pub use server::{DtpServer, StopHandle};
