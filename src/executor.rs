use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::runtime::Handle;

/// A unit of work handed to an [`Executor`].
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// ### -> `Executor Trait`.
///
/// The execution substrate both `SynchronizedSequence<T>` and `DeferredTask` run on.
/// Neither of them owns threads; everything they do asynchronously is handed to an
/// executor supplied by the embedding code.
///
/// ### -> `Methods`
/// - `execute(job)`: run `job` as soon as possible, never on the calling thread's stack.
/// - `execute_after(delay, job)`: run `job` once `delay` has elapsed.
///
/// Implementations must not block the caller in either method.
pub trait Executor: Send + Sync + 'static {
    fn execute(&self, job: Job);

    fn execute_after(&self, delay: Duration, job: Job);
}

impl <E> Executor for Arc<E>
where
    E: Executor + ?Sized
{
    fn execute(&self, job: Job) {
        (**self).execute(job)
    }

    fn execute_after(&self, delay: Duration, job: Job) {
        (**self).execute_after(delay, job)
    }
}

/// ### -> `TokioExecutor`
///
/// Runs jobs on a tokio runtime. Immediate jobs go to the blocking pool since
/// sequence writes take synchronous locks; delayed jobs sleep on the runtime timer
/// and then run the job on the same task.
///
/// ```
/// use syncbox::prelude::*;
///
/// async fn example() -> anyhow::Result<()> {
///     let executor = TokioExecutor::current()?;
///     let (sender, receiver) = tokio::sync::oneshot::channel();
///     executor.execute(Box::new(move || { let _ = sender.send(7); }));
///     assert_eq!(receiver.await?, 7);
///     Ok(())
/// }
///
/// tokio::runtime::Runtime::new().unwrap().block_on(example()).unwrap();
/// ```
#[derive(Clone, Debug)]
pub struct TokioExecutor {
    handle: Handle,
}

impl TokioExecutor {
    /// Binds to the runtime the caller is currently inside of.
    pub fn current() -> anyhow::Result<Self> {
        let handle = Handle::try_current()
            .context("TokioExecutor::current() must be called from within a tokio runtime")?;
        Ok(Self { handle })
    }
}

impl From<Handle> for TokioExecutor {
    fn from(handle: Handle) -> Self {
        Self { handle }
    }
}

impl Executor for TokioExecutor {
    fn execute(&self, job: Job) {
        crate::drop!(self.handle.spawn_blocking(job));
    }

    fn execute_after(&self, delay: Duration, job: Job) {
        crate::drop!(self.handle.spawn(async move {
            tokio::time::sleep(delay).await;
            job();
        }));
    }
}

/// ### -> `ThreadExecutor`
///
/// Runtime-free executor: every job gets its own OS thread. Delayed jobs sleep on
/// that thread first. Meant for callers without an async runtime and for tests,
/// not for high job rates.
#[derive(Clone, Debug, Default)]
pub struct ThreadExecutor {
    name: Option<String>,
}

impl ThreadExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Threads spawned by this executor carry `name`.
    pub fn named(name: impl Into<String>) -> Self {
        Self { name: Some(name.into()) }
    }

    fn spawn(&self, job: Job) {
        let mut builder = std::thread::Builder::new();
        if let Some(name) = &self.name {
            builder = builder.name(name.clone());
        }

        if let Err(error) = builder.spawn(job) {
            tracing::error!(%error, "failed to spawn executor thread, job dropped");
        }
    }
}

impl Executor for ThreadExecutor {
    fn execute(&self, job: Job) {
        self.spawn(job);
    }

    fn execute_after(&self, delay: Duration, job: Job) {
        self.spawn(Box::new(move || {
            std::thread::sleep(delay);
            job();
        }));
    }
}
