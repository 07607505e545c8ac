//! # dtp-pool: Fixed-Size Worker Pool
//!
//! A FIFO task queue drained by a fixed set of OS threads. Each submitted task yields
//! a [`TaskHandle`] that can be waited on from a thread or awaited from async code.

pub mod pool;
pub mod task;
mod sync;

pub use pool::ThreadPool;
pub use task::{TaskError, TaskHandle};

#[derive(Debug, thiserror::Error)]
pub enum PoolError {
    #[error("a pool needs at least one worker thread")]
    NoWorkers,

    #[error("failed to launch worker {index}: {source}")]
    ThreadLaunchFailed {
        index: usize,
        #[source]
        source: std::io::Error,
    },
}
