//! Two small concurrency primitives for state shared between concurrent callers:
//!
//! - [`SynchronizedSequence<T>`](sequence::SynchronizedSequence): an ordered container with
//!   concurrent synchronous reads and serialized, asynchronous writes.
//! - [`schedule`](task::schedule): a one-shot deferred task that can be cancelled until it fires.
//!
//! Neither owns threads. Both run on an [`Executor`](executor::Executor) supplied by the caller.

pub mod executor;
pub mod sequence;
pub mod task;

pub mod prelude {
    pub use {
        crate::sequence::prelude::*,
        crate::task::{schedule, CancelHandle, TaskState},
    };
}

#[macro_export]
macro_rules! drop {
    ($($x:expr),* $(,)?) => {
        $( std::mem::drop($x); )*
    };
}
