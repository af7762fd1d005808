use super::*;
use std::sync::Arc;

#[tokio::test]
async fn append_one_by_one() -> anyhow::Result<()> {
    let sequence = SynchronizedSequence::<i32>::new();

    for value in 1..=3 {
        let (done, after) = completion();
        sequence.push(value, done);
        after.await?;
    }

    assert_eq!(sequence.all(), vec![1, 2, 3]);
    Ok(())
}

#[tokio::test]
async fn completion_sees_post_mutation_state() -> anyhow::Result<()> {
    let sequence = SynchronizedSequence::<i32>::new();

    let (first, first_after) = completion();
    let (second, second_after) = completion();
    sequence.push(1, first);
    sequence.extend([2, 3], second);

    assert_eq!(first_after.await?, vec![1]);
    assert_eq!(second_after.await?, vec![1, 2, 3]);
    Ok(())
}

#[tokio::test]
async fn insert() -> anyhow::Result<()> {
    let sequence = SynchronizedSequence::from_vec(vec![1, 4]);

    sequence.insert(1, 2, None);
    let (done, after) = completion();
    sequence.insert_many(2, [3, 3, 3], done);
    assert_eq!(after.await?, vec![1, 2, 3, 3, 3, 4]);

    // inserting at len appends
    sequence.insert(6, 5, None);
    sequence.insert_many(0, Vec::new(), None);
    assert_eq!(settle(&sequence).await?, vec![1, 2, 3, 3, 3, 4, 5]);

    Ok(())
}

#[tokio::test]
async fn insert_past_end_is_skipped() -> anyhow::Result<()> {
    let sequence = SynchronizedSequence::from_vec(vec![1, 2]);

    let (done, after) = completion();
    sequence.insert(5, 9, done);
    assert_eq!(after.await?, vec![1, 2]);

    let (done, after) = completion();
    sequence.insert_many(3, [7, 8], done);
    assert_eq!(after.await?, vec![1, 2]);

    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn writes_from_many_threads_keep_submission_order() -> anyhow::Result<()> {
    let sequence = Arc::new(SynchronizedSequence::<(usize, usize)>::new());

    // each thread submits its own writes in order; they must land in that order
    let handles = (0..8).map(|thread| {
        let sequence = Arc::clone(&sequence);
        std::thread::spawn(move || {
            for step in 0..250 {
                sequence.push((thread, step), None);
            }
        })
    }).collect::<Vec<_>>();

    for handle in handles {
        handle.join().map_err(|_| anyhow::anyhow!("writer thread panicked"))?;
    }

    let contents = settle(&sequence).await?;
    assert_eq!(contents.len(), 8 * 250);
    for thread in 0..8 {
        let steps: Vec<usize> = contents.iter().filter(|(t, _)| *t == thread).map(|(_, s)| *s).collect();
        assert_eq!(steps, (0..250).collect::<Vec<_>>());
    }

    Ok(())
}

#[tokio::test]
async fn sequential_appends_from_different_threads() -> anyhow::Result<()> {
    let sequence = Arc::new(SynchronizedSequence::from_vec(vec!['x']));

    for value in ['a', 'b', 'c'] {
        let sequence = Arc::clone(&sequence);
        std::thread::spawn(move || sequence.push(value, None))
            .join()
            .map_err(|_| anyhow::anyhow!("writer thread panicked"))?;
    }

    assert_eq!(settle(&sequence).await?, vec!['x', 'a', 'b', 'c']);
    Ok(())
}

#[tokio::test]
async fn panicking_write_does_not_block_later_writes() -> anyhow::Result<()> {
    init_tracing();
    let sequence = SynchronizedSequence::from_vec(vec![1, 2, 3]);

    let (done, removed) = completion();
    sequence.remove_where(|x| if *x == 2 { panic!("predicate failed") } else { false }, done);
    sequence.push(4, None);

    // the completion of the failed write still runs, with nothing removed
    assert_eq!(removed.await?, Vec::<i32>::new());

    let contents = settle(&sequence).await?;
    assert_eq!(contents, vec![1, 2, 3, 4]);
    Ok(())
}

#[test]
fn writes_on_custom_executors() {
    let sequence = SynchronizedSequence::with_executors(
        ThreadExecutor::named("writer"),
        ThreadExecutor::named("completion"),
    );
    let (sender, receiver) = std::sync::mpsc::channel();

    sequence.push("hello", Some(Box::new(move |all: Vec<&'static str>| {
        let thread = std::thread::current().name().map(str::to_owned);
        sender.send((all, thread)).unwrap();
    })));

    let (all, thread) = receiver.recv_timeout(Duration::from_secs(5)).unwrap();
    assert_eq!(all, vec!["hello"]);
    assert_eq!(thread.as_deref(), Some("completion"));
}

#[test]
fn collects_from_iterator() {
    let sequence: SynchronizedSequence<u8> = (1..=4).collect();
    assert_eq!(sequence.all(), vec![1, 2, 3, 4]);
}
