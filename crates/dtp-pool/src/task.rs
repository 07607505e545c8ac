use std::any::Any;
use std::future::Future;
use std::mem;
use std::pin::Pin;
use std::task::{Context, Poll, Waker};

use crate::sync::{lock, wait, Arc, Condvar, Mutex};

/// Why a task produced no value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TaskError {
    #[error("task panicked: {0}")]
    Panicked(String),

    #[error("task was dropped before it ran")]
    Abandoned,
}

impl TaskError {
    pub(crate) fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "non-string panic payload".to_string()
        };
        TaskError::Panicked(message)
    }
}

enum SlotState<T> {
    Pending(Option<Waker>),
    Ready(Result<T, TaskError>),
    Taken,
}

struct ResultSlot<T> {
    state: Mutex<SlotState<T>>,
    ready: Condvar,
}

impl<T> ResultSlot<T> {
    fn fill(&self, result: Result<T, TaskError>) {
        let waker = {
            let mut state = lock(&self.state);
            match mem::replace(&mut *state, SlotState::Ready(result)) {
                SlotState::Pending(waker) => waker,
                _ => None,
            }
        };
        self.ready.notify_all();
        if let Some(waker) = waker {
            waker.wake();
        }
    }
}

fn take_ready<T>(state: &mut SlotState<T>) -> Option<Result<T, TaskError>> {
    match mem::replace(state, SlotState::Taken) {
        SlotState::Ready(result) => Some(result),
        SlotState::Taken => panic!("TaskHandle result already taken"),
        pending => {
            *state = pending;
            None
        }
    }
}

/// Producer half of a result slot, owned by the queued task.
///
/// Dropped without completing (the task never ran), it resolves the handle as
/// [`TaskError::Abandoned`].
pub(crate) struct Completer<T> {
    slot: Option<Arc<ResultSlot<T>>>,
}

impl<T> Completer<T> {
    pub(crate) fn complete(mut self, result: Result<T, TaskError>) {
        if let Some(slot) = self.slot.take() {
            slot.fill(result);
        }
    }
}

impl<T> Drop for Completer<T> {
    fn drop(&mut self) {
        if let Some(slot) = self.slot.take() {
            slot.fill(Err(TaskError::Abandoned));
        }
    }
}

/// Handle to the eventual result of a pool task.
///
/// Dropping the handle detaches the task; it still runs.
pub struct TaskHandle<T> {
    slot: Arc<ResultSlot<T>>,
}

pub(crate) fn channel<T>() -> (TaskHandle<T>, Completer<T>) {
    let slot = Arc::new(ResultSlot {
        state: Mutex::new(SlotState::Pending(None)),
        ready: Condvar::new(),
    });
    (
        TaskHandle { slot: slot.clone() },
        Completer { slot: Some(slot) },
    )
}

impl<T> TaskHandle<T> {
    /// Blocks the calling thread until the task finished.
    pub fn wait(self) -> Result<T, TaskError> {
        let mut state = lock(&self.slot.state);
        loop {
            if let Some(result) = take_ready(&mut state) {
                return result;
            }
            state = wait(&self.slot.ready, state);
        }
    }

    pub fn is_finished(&self) -> bool {
        matches!(*lock(&self.slot.state), SlotState::Ready(_))
    }
}

impl<T> Future for TaskHandle<T> {
    type Output = Result<T, TaskError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut state = lock(&self.slot.state);
        if let Some(result) = take_ready(&mut state) {
            return Poll::Ready(result);
        }
        if let SlotState::Pending(waker) = &mut *state {
            match waker {
                Some(w) if w.will_wake(cx.waker()) => {}
                _ => *waker = Some(cx.waker().clone()),
            }
        }
        Poll::Pending
    }
}

impl<T> std::fmt::Debug for TaskHandle<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskHandle")
            .field("finished", &self.is_finished())
            .finish()
    }
}
