//! Optimistic updates
//!
//! Apply a local change before the server confirms it, then either keep it
//! ([`OptimisticUpdate::commit`]) or restore the prior state
//! ([`OptimisticUpdate::rollback`]).

/// A pending local change over a caller-owned slice.
///
/// Dropping the update without calling either method keeps the change.
#[must_use = "call commit() or rollback() once the remote call resolves"]
pub struct OptimisticUpdate<'a, T: Clone> {
    target: &'a mut [T],
    snapshot: Vec<T>,
}

impl<'a, T: Clone> OptimisticUpdate<'a, T> {
    /// Snapshot `target`, then run `change` on it.
    pub fn apply(target: &'a mut [T], change: impl FnOnce(&mut [T])) -> Self {
        let snapshot = target.to_vec();
        change(&mut *target);
        Self { target, snapshot }
    }

    /// Current (changed) state.
    pub fn current(&self) -> &[T] {
        &*self.target
    }

    pub fn commit(self) {}

    pub fn rollback(self) {
        self.target.clone_from_slice(&self.snapshot);
    }
}
