pub use {
    crate::sequence::{SynchronizedSequence, Completion},
    crate::executor::{Executor, Job, ThreadExecutor, TokioExecutor},
};
