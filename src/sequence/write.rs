use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use super::{Completion, SynchronizedSequence};

fn snapshot<T: Clone>(items: &[T], wanted: bool) -> Vec<T> {
    if wanted { items.to_vec() } else { Vec::new() }
}

impl <T> SynchronizedSequence<T>
where
    T: Clone + Send + Sync + 'static
{
    /// Queues `mutation` on the write lane.
    ///
    /// The queued job upgrades its `Weak` handle to the store, applies `mutation` under the
    /// exclusive lock and releases it, then hands the outcome to `completion` on the
    /// completion executor. If the store has been dropped in the meantime, or `mutation`
    /// panics, `completion` receives `R::default()`.
    fn schedule<R, M>(&self, operation: &'static str, mutation: M, completion: Option<Completion<R>>)
    where
        R: Default + Send + 'static,
        M: FnOnce(&mut Vec<T>) -> R + Send + 'static,
    {
        let store = Arc::downgrade(&self.store);
        let completions = Arc::clone(&self.completions);

        self.lane.submit(Box::new(move || {
            let outcome = match store.upgrade() {
                Some(store) => {
                    let mut guard = store.write();
                    match catch_unwind(AssertUnwindSafe(|| mutation(&mut *guard))) {
                        Ok(outcome) => {
                            tracing::trace!(operation, length = guard.len(), "write applied");
                            outcome
                        }
                        Err(_) => {
                            tracing::error!(operation, "write panicked, completion receives the empty outcome");
                            R::default()
                        }
                    }
                }
                None => {
                    tracing::debug!(operation, "sequence dropped before write ran, skipping");
                    R::default()
                }
            };

            if let Some(completion) = completion {
                completions.execute(Box::new(move || completion(outcome)));
            }
        }));
    }

    /// Queues appending `value` at the end.
    /// `completion` receives the contents after the append.
    pub fn push(&self, value: T, completion: Option<Completion<Vec<T>>>) {
        let wanted = completion.is_some();
        self.schedule("push", move |items| {
            items.push(value);
            snapshot(items, wanted)
        }, completion);
    }

    /// Queues appending every element of `values`, keeping their order.
    pub fn extend(&self, values: impl IntoIterator<Item = T>, completion: Option<Completion<Vec<T>>>) {
        let values: Vec<T> = values.into_iter().collect();
        let wanted = completion.is_some();
        self.schedule("extend", move |items| {
            items.extend(values);
            snapshot(items, wanted)
        }, completion);
    }

    /// Queues inserting `value` at `index`.
    ///
    /// If `index > len` by the time the write runs, nothing is inserted and `completion`
    /// receives the unchanged contents.
    pub fn insert(&self, index: usize, value: T, completion: Option<Completion<Vec<T>>>) {
        let wanted = completion.is_some();
        self.schedule("insert", move |items| {
            if index <= items.len() {
                items.insert(index, value);
            } else {
                tracing::warn!(index, length = items.len(), "insert index no longer valid, skipping");
            }
            snapshot(items, wanted)
        }, completion);
    }

    /// Queues inserting all of `values` starting at `index`, keeping their order.
    /// Same out-of-range behaviour as [`SynchronizedSequence::insert`].
    pub fn insert_many(&self, index: usize, values: impl IntoIterator<Item = T>, completion: Option<Completion<Vec<T>>>) {
        let values: Vec<T> = values.into_iter().collect();
        let wanted = completion.is_some();
        self.schedule("insert_many", move |items| {
            if index <= items.len() {
                let tail = items.split_off(index);
                items.extend(values);
                items.extend(tail);
            } else {
                tracing::warn!(index, length = items.len(), "insert index no longer valid, skipping");
            }
            snapshot(items, wanted)
        }, completion);
    }

    /// Queues removing the element at `index`.
    /// `completion` receives it, or `None` if `index` was out of range when the write ran.
    pub fn remove(&self, index: usize, completion: Option<Completion<Option<T>>>) {
        self.schedule("remove", move |items| {
            if index < items.len() {
                Some(items.remove(index))
            } else {
                tracing::debug!(index, length = items.len(), "remove index no longer valid, skipping");
                None
            }
        }, completion);
    }

    /// Queues removing every element that matches `predicate`.
    ///
    /// The contents are re-scanned from the front after each single removal, so indices
    /// are never assumed stable across the batch. `completion` receives the removed
    /// elements in the order they were removed.
    pub fn remove_where<P>(&self, predicate: P, completion: Option<Completion<Vec<T>>>)
    where
        P: Fn(&T) -> bool + Send + 'static
    {
        self.schedule("remove_where", move |items| {
            let mut removed = Vec::new();
            while let Some(index) = items.iter().position(&predicate) {
                removed.push(items.remove(index));
            }
            removed
        }, completion);
    }

    /// Queues removing every element. `completion` receives the (empty) contents.
    pub fn clear(&self, completion: Option<Completion<Vec<T>>>) {
        self.schedule("clear", |items| {
            items.clear();
            Vec::new()
        }, completion);
    }

    /// Indexed assignment.
    ///
    /// `Some(value)` queues replacing the element at `index`. `None` does nothing: this
    /// method never deletes. An index that is out of range when the write runs is skipped.
    pub fn set(&self, index: usize, value: Option<T>) {
        let Some(value) = value else {
            tracing::trace!(index, "set called without a value, ignoring");
            return;
        };

        self.schedule::<(), _>("set", move |items| {
            match items.get_mut(index) {
                Some(slot) => *slot = value,
                None => tracing::warn!(index, length = items.len(), "set index no longer valid, skipping"),
            }
        }, None);
    }
}
