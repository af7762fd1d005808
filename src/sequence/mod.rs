use std::fmt::Debug;
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::runtime::Handle;

use crate::executor::{Executor, ThreadExecutor, TokioExecutor};

mod lane;
mod write;
pub mod prelude;

#[cfg(test)]
mod tests;

use lane::WriteLane;

/// Callback invoked on the completion executor once a write has been applied.
/// It receives the outcome computed after the mutation, never the state before it.
pub type Completion<R> = Box<dyn FnOnce(R) + Send + 'static>;

/// ### -> `SynchronizedSequence<T>` - a thread-safe, ordered, mutable sequence.
///
/// `SynchronizedSequence<T>` wraps a `Vec<T>` in a readers-writer domain:
///
/// - **Reads** are synchronous. They take the lock in shared mode, compute their result
///   against the private `Vec<T>`, and release the lock before returning. Any number of
///   reads run at once.
/// - **Writes** are asynchronous. The call only queues the mutation and returns. Queued
///   mutations are applied one at a time, in submission order, under the exclusive lock.
///   An optional [`Completion`] runs on the completion executor afterwards and receives
///   the post-mutation outcome.
///
/// ### -> `Invariants`
///
/// 1. **No partial writes**: every read observes the state after some prefix of the
///    submitted writes, never the middle of one.
/// 2. **Single writer**: at most one write is applied at any instant, and never while a
///    read holds the lock.
/// 3. **FIFO writes**: writes from one container are applied in the order they were
///    submitted.
///
/// A read issued while a write is still queued may see the state either before or after
/// that write.
///
/// ### -> `Error Handling`
///
/// - **Contract violations** (`get` outside `[0, len)`): panic naming the index and the
///   valid range. This always means a bug in the caller.
/// - **Absent values** (empty sequence, no match): `Option::None`.
/// - **Benign races** (removing, inserting at or assigning to an index that is no longer
///   valid when the write runs, assigning `None`): silent no-ops.
/// - **Panicking write closures** (e.g. a `remove_where` predicate): the panic is caught and
///   logged, whatever the mutation had already changed stays, and the completion still runs
///   with the empty outcome (`Vec::new()` or `None`). Later writes are unaffected.
///
/// ### -> `Lifetime`
///
/// Queued writes hold only a `Weak` reference to the backing store. Dropping the sequence
/// with writes still queued is safe: they apply to nothing, and their completions receive
/// an empty outcome.
///
/// ### -> `Usage Example`
///
/// ```
/// use syncbox::prelude::*;
/// use std::sync::mpsc;
///
/// let sequence = SynchronizedSequence::with_executors(ThreadExecutor::new(), ThreadExecutor::new());
/// let (sender, receiver) = mpsc::channel();
///
/// sequence.push(1, None);
/// sequence.push(2, None);
/// sequence.push(3, Some(Box::new(move |all: Vec<i32>| sender.send(all).unwrap())));
///
/// assert_eq!(receiver.recv().unwrap(), vec![1, 2, 3]);
/// assert_eq!(sequence.all(), vec![1, 2, 3]);
/// assert_eq!(sequence.filter(|x| x % 2 == 1), vec![1, 3]);
/// ```
pub struct SynchronizedSequence<T> {
    store: Arc<RwLock<Vec<T>>>,
    lane: Arc<WriteLane>,
    completions: Arc<dyn Executor>,
}

impl <T> SynchronizedSequence<T>
where
    T: Clone + Send + Sync + 'static
{
    /// Creates an empty sequence.
    ///
    /// Writes and completions run on the ambient tokio runtime when called from inside
    /// one, and on plain OS threads otherwise.
    pub fn new() -> Self {
        match Handle::try_current() {
            Ok(handle) => {
                let executor = Arc::new(TokioExecutor::from(handle));
                Self::from_parts(Vec::new(), executor.clone(), executor)
            }
            Err(_) => {
                tracing::debug!("no tokio runtime in scope, sequence falls back to thread executors");
                Self::from_parts(
                    Vec::new(),
                    Arc::new(ThreadExecutor::named("syncbox-writer")),
                    Arc::new(ThreadExecutor::named("syncbox-completion")),
                )
            }
        }
    }

    /// Creates an empty sequence whose writes drain on `writer` and whose completions
    /// run on `completions`.
    pub fn with_executors(writer: impl Executor, completions: impl Executor) -> Self {
        Self::from_parts(Vec::new(), Arc::new(writer), Arc::new(completions))
    }

    /// Creates a sequence that starts out holding `values`, using the same executors
    /// as [`SynchronizedSequence::new`].
    pub fn from_vec(values: Vec<T>) -> Self {
        let sequence = Self::new();
        *sequence.store.write() = values;
        sequence
    }

    fn from_parts(values: Vec<T>, writer: Arc<dyn Executor>, completions: Arc<dyn Executor>) -> Self {
        Self {
            store: Arc::new(RwLock::new(values)),
            lane: WriteLane::new(writer),
            completions,
        }
    }

    /// Runs `reader` against the current contents under the shared lock.
    ///
    /// Every other read is built on this. The lock is taken with `read_recursive`, so
    /// `reader` may read the same sequence again without deadlocking behind a queued writer.
    /// Whatever `reader` returns, including an `Err`, is passed through unchanged.
    pub fn read_with<R>(&self, reader: impl FnOnce(&[T]) -> R) -> R {
        let guard = self.store.read_recursive();
        reader(guard.as_slice())
    }

    /// Snapshot of every element, in order.
    pub fn all(&self) -> Vec<T> {
        self.read_with(|items| items.to_vec())
    }

    pub fn first(&self) -> Option<T> {
        self.read_with(|items| items.first().cloned())
    }

    pub fn last(&self) -> Option<T> {
        self.read_with(|items| items.last().cloned())
    }

    pub fn len(&self) -> usize {
        self.read_with(|items| items.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Element at `index`.
    ///
    /// ### -> `Panics`
    ///
    /// When `index` is outside `[0, len)` at the moment of the read. The message names the
    /// offending index and the valid range, e.g. `index 5 out of range 0..3`.
    pub fn get(&self, index: usize) -> T {
        self.read_with(|items| match items.get(index) {
            Some(item) => item.clone(),
            None => panic!("index {} out of range 0..{}", index, items.len()),
        })
    }

    /// First element matching `predicate`.
    pub fn find(&self, predicate: impl FnMut(&T) -> bool) -> Option<T> {
        let mut predicate = predicate;
        self.read_with(|items| items.iter().find(|item| predicate(*item)).cloned())
    }

    /// Last element matching `predicate`.
    pub fn find_last(&self, predicate: impl FnMut(&T) -> bool) -> Option<T> {
        let mut predicate = predicate;
        self.read_with(|items| items.iter().rev().find(|item| predicate(*item)).cloned())
    }

    pub fn filter(&self, predicate: impl FnMut(&T) -> bool) -> Vec<T> {
        let mut predicate = predicate;
        self.read_with(|items| items.iter().filter(|item| predicate(*item)).cloned().collect())
    }

    /// Index of the first element matching `predicate`.
    pub fn position(&self, predicate: impl FnMut(&T) -> bool) -> Option<usize> {
        self.read_with(|items| items.iter().position(predicate))
    }

    /// Index of the last element matching `predicate`.
    pub fn rposition(&self, predicate: impl FnMut(&T) -> bool) -> Option<usize> {
        self.read_with(|items| items.iter().rposition(predicate))
    }

    /// Sorted copy of the contents. The sequence itself is left as is.
    pub fn sorted_by(&self, compare: impl FnMut(&T, &T) -> std::cmp::Ordering) -> Vec<T> {
        let mut snapshot = self.all();
        snapshot.sort_by(compare);
        snapshot
    }

    pub fn map<U>(&self, transform: impl FnMut(&T) -> U) -> Vec<U> {
        self.read_with(|items| items.iter().map(transform).collect())
    }

    /// Maps every element and keeps only the `Some` results.
    pub fn filter_map<U>(&self, transform: impl FnMut(&T) -> Option<U>) -> Vec<U> {
        self.read_with(|items| items.iter().filter_map(transform).collect())
    }

    /// Maps every element to a collection and concatenates the results in order.
    pub fn flat_map<I>(&self, transform: impl FnMut(&T) -> I) -> Vec<I::Item>
    where
        I: IntoIterator
    {
        self.read_with(|items| items.iter().flat_map(transform).collect())
    }

    /// Calls `body` on every element while holding the shared lock.
    pub fn for_each(&self, body: impl FnMut(&T)) {
        self.read_with(|items| items.iter().for_each(body))
    }

    /// Whether any element matches `predicate`.
    pub fn any(&self, predicate: impl FnMut(&T) -> bool) -> bool {
        let mut predicate = predicate;
        self.read_with(|items| items.iter().any(|item| predicate(item)))
    }

    pub fn try_find<E>(&self, predicate: impl FnMut(&T) -> Result<bool, E>) -> Result<Option<T>, E> {
        let mut predicate = predicate;
        self.read_with(|items| {
            for item in items {
                if predicate(item)? {
                    return Ok(Some(item.clone()));
                }
            }
            Ok(None)
        })
    }

    pub fn try_filter<E>(&self, predicate: impl FnMut(&T) -> Result<bool, E>) -> Result<Vec<T>, E> {
        let mut predicate = predicate;
        self.read_with(|items| {
            let mut kept = Vec::new();
            for item in items {
                if predicate(item)? {
                    kept.push(item.clone());
                }
            }
            Ok(kept)
        })
    }

    pub fn try_position<E>(&self, predicate: impl FnMut(&T) -> Result<bool, E>) -> Result<Option<usize>, E> {
        let mut predicate = predicate;
        self.read_with(|items| {
            for (index, item) in items.iter().enumerate() {
                if predicate(item)? {
                    return Ok(Some(index));
                }
            }
            Ok(None)
        })
    }

    pub fn try_map<U, E>(&self, transform: impl FnMut(&T) -> Result<U, E>) -> Result<Vec<U>, E> {
        self.read_with(|items| items.iter().map(transform).collect())
    }

    /// Stops at the first `Err` returned by `body` and hands it back.
    pub fn try_for_each<E>(&self, body: impl FnMut(&T) -> Result<(), E>) -> Result<(), E> {
        self.read_with(|items| items.iter().try_for_each(body))
    }
}

impl <T> SynchronizedSequence<T>
where
    T: Clone + Ord + Send + Sync + 'static
{
    /// Copy of the contents in ascending order.
    pub fn sorted(&self) -> Vec<T> {
        self.sorted_by(|a, b| a.cmp(b))
    }
}

impl <T> SynchronizedSequence<T>
where
    T: Clone + PartialEq + Send + Sync + 'static
{
    pub fn contains(&self, value: &T) -> bool {
        self.read_with(|items| items.contains(value))
    }

    /// Index of the first element equal to `value`.
    pub fn index_of(&self, value: &T) -> Option<usize> {
        self.read_with(|items| items.iter().position(|item| item == value))
    }
}

impl <T> SynchronizedSequence<T>
where
    T: Clone + Debug + Send + Sync + 'static
{
    /// Debug rendering of the current contents, e.g. `[1, 2, 3]`.
    pub fn description(&self) -> String {
        self.read_with(|items| format!("{:?}", items))
    }
}

impl <T> Debug for SynchronizedSequence<T>
where
    T: Debug
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let guard = self.store.read_recursive();
        f.debug_list().entries(guard.iter()).finish()
    }
}

impl <T> Default for SynchronizedSequence<T>
where
    T: Clone + Send + Sync + 'static
{
    fn default() -> Self {
        Self::new()
    }
}

impl <T> FromIterator<T> for SynchronizedSequence<T>
where
    T: Clone + Send + Sync + 'static
{
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::from_vec(iter.into_iter().collect())
    }
}
