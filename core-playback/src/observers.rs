//! Observer registry
//!
//! Observers are plain callbacks. They run synchronously on the thread that
//! mutated the session, after the mutation, with no session lock held, so a
//! callback may call back into the session.

use parking_lot::Mutex;
use std::fmt;
use std::sync::{Arc, Weak};

use crate::state::PlaybackSnapshot;

type Observer = Arc<dyn Fn(&PlaybackSnapshot) + Send + Sync>;

#[derive(Default)]
struct Registry {
    next_id: u64,
    observers: Vec<(u64, Observer)>,
}

#[derive(Clone, Default)]
pub struct ObserverRegistry {
    inner: Arc<Mutex<Registry>>,
}

impl ObserverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&self, observer: F) -> Subscription
    where
        F: Fn(&PlaybackSnapshot) + Send + Sync + 'static,
    {
        let mut registry = self.inner.lock();
        let id = registry.next_id;
        registry.next_id += 1;
        registry.observers.push((id, Arc::new(observer)));

        Subscription {
            id,
            registry: Arc::downgrade(&self.inner),
        }
    }

    /// Invoke every observer once, in subscription order.
    pub fn notify(&self, snapshot: &PlaybackSnapshot) {
        let observers: Vec<Observer> = self
            .inner
            .lock()
            .observers
            .iter()
            .map(|(_, observer)| Arc::clone(observer))
            .collect();

        for observer in observers {
            observer(snapshot);
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for ObserverRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObserverRegistry")
            .field("observers", &self.len())
            .finish()
    }
}

/// Keeps an observer registered. Dropping it unsubscribes.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    id: u64,
    registry: Weak<Mutex<Registry>>,
}

impl Subscription {
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.lock().observers.retain(|(id, _)| *id != self.id);
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}
