use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};

use crate::sync::{lock, thread, wait, Arc, AtomicUsize, Condvar, Mutex, Ordering};
use crate::task::{self, TaskError, TaskHandle};
use crate::PoolError;

type Job = Box<dyn FnOnce() + Send + 'static>;

struct Queue {
    tasks: VecDeque<Job>,
    /// Set once by `shutdown`. Read together with `tasks` under the same lock by
    /// workers deciding to exit and producers deciding to enqueue.
    stop: bool,
}

struct Shared {
    queue: Mutex<Queue>,
    condition: Condvar,
    executing: AtomicUsize,
}

/// A fixed-size pool of worker threads draining one FIFO task queue.
///
/// ## Shutdown Protocol
/// `shutdown` (also run on drop) flips the stop flag under the queue lock, wakes every
/// worker and joins them. Tasks already queued still run; new ones are refused.
pub struct ThreadPool {
    shared: Arc<Shared>,
    workers: Mutex<Vec<thread::JoinHandle<()>>>,
    number_threads: usize,
}

#[cfg(not(loom))]
static_assertions::assert_impl_all!(ThreadPool: Send, Sync);

impl ThreadPool {
    /// Spawns `number_threads` workers before returning.
    pub fn new(number_threads: usize) -> Result<Self, PoolError> {
        Self::with_name(number_threads, "dtp-worker")
    }

    /// Like [`ThreadPool::new`], naming workers `{prefix}-{index}`.
    ///
    /// If any worker fails to launch, the workers already running are stopped and
    /// joined before the error is returned.
    pub fn with_name(number_threads: usize, prefix: &str) -> Result<Self, PoolError> {
        if number_threads == 0 {
            return Err(PoolError::NoWorkers);
        }

        let pool = Self {
            shared: Arc::new(Shared {
                queue: Mutex::new(Queue {
                    tasks: VecDeque::new(),
                    stop: false,
                }),
                condition: Condvar::new(),
                executing: AtomicUsize::new(0),
            }),
            workers: Mutex::new(Vec::with_capacity(number_threads)),
            number_threads,
        };

        for index in 0..number_threads {
            let shared = pool.shared.clone();
            let spawned = thread::Builder::new()
                .name(format!("{}-{}", prefix, index))
                .spawn(move || task_handler(shared));

            match spawned {
                Ok(handle) => lock(&pool.workers).push(handle),
                Err(source) => {
                    tracing::error!("ThreadPool: worker {} failed to launch: {}", index, source);
                    // Dropping `pool` joins the workers spawned so far.
                    return Err(PoolError::ThreadLaunchFailed { index, source });
                }
            }
        }

        tracing::debug!("ThreadPool: {} workers online", number_threads);
        Ok(pool)
    }

    pub fn number_threads(&self) -> usize {
        self.number_threads
    }

    /// Tasks whose execution started but has not finished.
    pub fn number_tasks_in_execution(&self) -> usize {
        self.shared.executing.load(Ordering::SeqCst)
    }

    /// Tasks waiting in the queue.
    pub fn queued_tasks(&self) -> usize {
        lock(&self.shared.queue).tasks.len()
    }

    pub fn is_shutting_down(&self) -> bool {
        lock(&self.shared.queue).stop
    }

    /// Queues `f` and returns a handle to its result.
    ///
    /// Returns `None` without queuing when the pool is shutting down; the caller must
    /// not assume the task ran.
    pub fn enqueue_task<F, T>(&self, f: F) -> Option<TaskHandle<T>>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        self.enqueue_task_with(f, || {})
    }

    /// Like [`ThreadPool::enqueue_task`], running `on_enqueued` once the task is committed.
    ///
    /// `on_enqueued` runs under the queue lock, so it happens-before any worker can
    /// dequeue the task. It is not called when the task is refused.
    pub fn enqueue_task_with<F, T, A>(&self, f: F, on_enqueued: A) -> Option<TaskHandle<T>>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
        A: FnOnce(),
    {
        let (handle, completer) = task::channel();
        let job: Job = Box::new(move || {
            let result = panic::catch_unwind(AssertUnwindSafe(f)).map_err(TaskError::from_panic);
            completer.complete(result);
        });

        let mut queue = lock(&self.shared.queue);
        if queue.stop {
            drop(queue);
            // The refused job is dropped outside the lock: its captures may do I/O on drop.
            drop(job);
            return None;
        }
        queue.tasks.push_back(job);
        on_enqueued();
        drop(queue);

        self.shared.condition.notify_one();
        Some(handle)
    }

    /// Stops accepting tasks, drains the queue and joins every worker.
    ///
    /// Must not be called from inside a pool task.
    pub fn shutdown(&self) {
        {
            let mut queue = lock(&self.shared.queue);
            if !queue.stop {
                queue.stop = true;
                tracing::debug!("ThreadPool: shutdown with {} queued tasks", queue.tasks.len());
            }
        }
        self.shared.condition.notify_all();

        let workers = std::mem::take(&mut *lock(&self.workers));
        for worker in workers {
            if worker.join().is_err() {
                tracing::warn!("ThreadPool: worker exited by panic");
            }
        }
    }
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn task_handler(shared: Arc<Shared>) {
    loop {
        let job = {
            let mut queue = lock(&shared.queue);
            while !queue.stop && queue.tasks.is_empty() {
                queue = wait(&shared.condition, queue);
            }
            match queue.tasks.pop_front() {
                Some(job) => job,
                // Stop was signalled and nothing is left to drain.
                None => return,
            }
        };

        shared.executing.fetch_add(1, Ordering::SeqCst);
        job();
        shared.executing.fetch_sub(1, Ordering::SeqCst);
    }
}
