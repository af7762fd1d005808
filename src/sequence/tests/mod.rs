use std::time::Duration;

use tokio::sync::oneshot;

use crate::sequence::prelude::*;

mod write;

/// Completion that forwards its outcome into a oneshot channel.
fn completion<R: Send + 'static>() -> (Option<Completion<R>>, oneshot::Receiver<R>) {
    let (sender, receiver) = oneshot::channel();
    let completion: Completion<R> = Box::new(move |outcome| { let _ = sender.send(outcome); });
    (Some(completion), receiver)
}

/// Waits for every write queued so far and returns the contents after them.
async fn settle<T>(sequence: &SynchronizedSequence<T>) -> anyhow::Result<Vec<T>>
where
    T: Clone + Send + Sync + 'static
{
    let (done, receiver) = completion();
    sequence.extend(Vec::new(), done);
    Ok(tokio::time::timeout(Duration::from_secs(5), receiver).await??)
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
