use std::collections::VecDeque;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::executor::{Executor, Job};

struct Backlog {
    jobs: VecDeque<Job>,
    draining: bool,
}

/// Drain job handed to the executor. If the executor drops it without running it
/// (runtime shut down, thread spawn failure), the lane goes back to idle so the next
/// `submit` schedules a fresh drain and the backlog is applied then, still in order.
struct Drainer {
    lane: Arc<WriteLane>,
    started: bool,
}

impl Drop for Drainer {
    fn drop(&mut self) {
        if self.started {
            return;
        }

        let mut backlog = self.lane.backlog.lock();
        backlog.draining = false;
        tracing::warn!(pending = backlog.jobs.len(), "executor dropped the write drain job, writes wait for the next submit");
    }
}

/// Serial lane for the write side of a sequence.
///
/// Jobs are applied one at a time, in submission order, by a single drain job
/// running on the lane's executor. A drain job is scheduled only when the lane
/// goes from idle to busy, so there is never more than one in flight.
pub(crate) struct WriteLane {
    backlog: Mutex<Backlog>,
    executor: Arc<dyn Executor>,
}

impl WriteLane {
    pub(crate) fn new(executor: Arc<dyn Executor>) -> Arc<Self> {
        Arc::new(Self {
            backlog: Mutex::new(Backlog { jobs: VecDeque::new(), draining: false }),
            executor,
        })
    }

    /// Queues `job` behind every previously submitted job. Never blocks beyond
    /// the backlog mutex.
    pub(crate) fn submit(self: &Arc<Self>, job: Job) {
        let mut backlog = self.backlog.lock();
        backlog.jobs.push_back(job);
        if backlog.draining {
            return;
        }
        backlog.draining = true;
        crate::drop!(backlog);

        let mut drainer = Drainer { lane: Arc::clone(self), started: false };
        self.executor.execute(Box::new(move || {
            drainer.started = true;
            drainer.lane.drain();
        }));
    }

    fn drain(&self) {
        loop {
            let job = {
                let mut backlog = self.backlog.lock();
                match backlog.jobs.pop_front() {
                    Some(job) => job,
                    None => {
                        backlog.draining = false;
                        return;
                    }
                }
            };

            // a panicking write must not wedge the lane with `draining` stuck at true
            if let Err(panic) = catch_unwind(AssertUnwindSafe(job)) {
                let message = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "<non-string panic payload>".to_string());
                tracing::error!(%message, "write job panicked, continuing with the next one");
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn pending(&self) -> usize {
        self.backlog.lock().jobs.len()
    }

    #[cfg(test)]
    pub(crate) fn is_draining(&self) -> bool {
        self.backlog.lock().draining
    }
}
