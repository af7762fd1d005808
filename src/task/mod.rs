use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Duration;

use parking_lot::Mutex;

use crate::executor::{Executor, Job};


/// Lifecycle of a deferred task. `Pending` moves to exactly one of the two terminal
/// states and never leaves it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TaskState {
    Pending = 0,
    Fired = 1,
    Canceled = 2,
}

impl TaskState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => TaskState::Pending,
            1 => TaskState::Fired,
            2 => TaskState::Canceled,
            _ => unreachable!("invalid task state {}", value),
        }
    }
}

struct DeferredTask {
    state: AtomicU8,
    action: Mutex<Option<Job>>,
}

impl DeferredTask {
    /// Moves `Pending` to `to`. Only one caller can ever win this.
    fn settle(&self, to: TaskState) -> bool {
        self.state
            .compare_exchange(TaskState::Pending as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    fn state(&self) -> TaskState {
        TaskState::from_u8(self.state.load(Ordering::Acquire))
    }

    fn fire(&self, context: &impl Executor) {
        if !self.settle(TaskState::Fired) {
            tracing::trace!("deferred task elapsed after cancellation, dropping");
            return;
        }

        match self.action.lock().take() {
            Some(action) => {
                tracing::debug!("deferred task fired");
                context.execute(action);
            }
            None => unreachable!("fired deferred task has no action"),
        }
    }
}

/// ### -> `schedule`
///
/// Runs `action` on `context` once `delay` has elapsed, unless the returned
/// [`CancelHandle`] is used first.
///
/// - The timer only decides whether the task is still pending; the action itself is
///   always handed to `context.execute`, never run on the timer job.
/// - The action runs at most once. Firing and cancelling race on a single
///   compare-and-swap, so exactly one of them wins.
/// - The action is dropped as soon as the task reaches a terminal state.
///
/// Dropping the handle does not cancel the task.
///
/// ```
/// use syncbox::prelude::*;
/// use std::sync::mpsc;
/// use std::time::Duration;
///
/// let (sender, receiver) = mpsc::channel();
/// let handle = schedule(Duration::from_millis(10), &ThreadExecutor::new(), move || sender.send("ran").unwrap());
///
/// assert_eq!(receiver.recv().unwrap(), "ran");
/// assert!(!handle.cancel());
/// assert_eq!(handle.state(), TaskState::Fired);
/// ```
pub fn schedule<E, F>(delay: Duration, context: &E, action: F) -> CancelHandle
where
    E: Executor + Clone,
    F: FnOnce() + Send + 'static,
{
    let task = Arc::new(DeferredTask {
        state: AtomicU8::new(TaskState::Pending as u8),
        action: Mutex::new(Some(Box::new(action))),
    });

    let timer = Arc::clone(&task);
    let runner = context.clone();
    context.execute_after(delay, Box::new(move || timer.fire(&runner)));
    tracing::debug!(?delay, "deferred task scheduled");

    CancelHandle { task }
}

/// Handle returned by [`schedule`]. Cheap to clone; every clone controls the same task.
#[derive(Clone)]
pub struct CancelHandle {
    task: Arc<DeferredTask>,
}

impl CancelHandle {
    /// Cancels the task if it is still pending and drops its action.
    ///
    /// Returns `true` only for the call that actually cancelled. Calling it again, or
    /// after the task fired, does nothing and returns `false`.
    pub fn cancel(&self) -> bool {
        if !self.task.settle(TaskState::Canceled) {
            tracing::trace!(state = ?self.task.state(), "cancel on settled deferred task ignored");
            return false;
        }

        crate::drop!(self.task.action.lock().take());
        tracing::debug!("deferred task canceled");
        true
    }

    pub fn state(&self) -> TaskState {
        self.task.state()
    }

    pub fn is_pending(&self) -> bool {
        self.state() == TaskState::Pending
    }
}

impl std::fmt::Debug for CancelHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancelHandle").field("state", &self.state()).finish()
    }
}
