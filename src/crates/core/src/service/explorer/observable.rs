//! Reactive state container
//!
//! One immutable snapshot behind a lock plus an insertion-ordered listener
//! registry. Updates replace the snapshot wholesale and notify a stable copy
//! of the listeners, so subscribing or unsubscribing from inside a callback
//! never invalidates the iteration.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use log::warn;
use parking_lot::{Mutex, RwLock};

type Listener<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct ListenerRegistry<T> {
    entries: Mutex<Vec<(u64, Listener<T>)>>,
    next_id: AtomicU64,
}

/// Removes its listener from the container when `unsubscribe` is called.
///
/// Dropping the handle without unsubscribing leaves the listener registered
/// for the container's lifetime.
pub struct Subscription<T> {
    id: u64,
    registry: Weak<ListenerRegistry<T>>,
}

impl<T> Subscription<T> {
    pub fn unsubscribe(self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.entries.lock().retain(|(id, _)| *id != self.id);
        }
    }
}

/// Copy-on-write observable state.
pub struct ObservableState<T> {
    snapshot: RwLock<Arc<T>>,
    listeners: Arc<ListenerRegistry<T>>,
}

impl<T: Clone> ObservableState<T> {
    pub fn new(initial: T) -> Self {
        Self {
            snapshot: RwLock::new(Arc::new(initial)),
            listeners: Arc::new(ListenerRegistry {
                entries: Mutex::new(Vec::new()),
                next_id: AtomicU64::new(0),
            }),
        }
    }

    /// Current snapshot.
    pub fn get(&self) -> Arc<T> {
        Arc::clone(&self.snapshot.read())
    }

    /// Clone the current snapshot, apply `mutate`, install the result
    /// atomically and notify every listener with the new value.
    pub fn update(&self, mutate: impl FnOnce(&mut T)) -> Arc<T> {
        let next = {
            let mut guard = self.snapshot.write();
            let mut next = (**guard).clone();
            mutate(&mut next);
            let next = Arc::new(next);
            *guard = Arc::clone(&next);
            next
        };
        self.notify(&next);
        next
    }

    /// Register a listener. The current snapshot is delivered synchronously
    /// before this returns, so late subscribers never miss the initial state.
    /// Listeners are invoked in subscription order.
    pub fn subscribe(&self, listener: impl Fn(&T) + Send + Sync + 'static) -> Subscription<T> {
        let listener: Listener<T> = Arc::new(listener);
        let id = self.listeners.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        self.listeners.entries.lock().push((id, Arc::clone(&listener)));
        let current = self.get();
        invoke_isolated(id, &listener, &current);
        Subscription {
            id,
            registry: Arc::downgrade(&self.listeners),
        }
    }

    pub fn clear_listeners(&self) {
        self.listeners.entries.lock().clear();
    }

    fn notify(&self, snapshot: &T) {
        let stable: Vec<(u64, Listener<T>)> = self.listeners.entries.lock().clone();
        for (id, listener) in stable {
            invoke_isolated(id, &listener, snapshot);
        }
    }
}

/// A panicking listener must not prevent the remaining listeners from being
/// notified or corrupt the stored snapshot.
fn invoke_isolated<T>(id: u64, listener: &Listener<T>, snapshot: &T) {
    if catch_unwind(AssertUnwindSafe(|| listener(snapshot))).is_err() {
        warn!("State listener panicked, continuing with remaining listeners: id={}", id);
    }
}
