//! Event emitter primitive.
//!
//! A small reusable subscription list: `(id, callback)` pairs plus a
//! monotonic id. [`EventEmitter::subscribe`] returns a [`Subscription`]
//! handle whose disposal removes the pair. Dispatch iterates a snapshot of
//! the ids present at emit time, so a handler may unsubscribe itself (or
//! others) mid-dispatch and listeners added during dispatch are not called
//! until the next emit.
//!
//! The listener list lives behind a `parking_lot::Mutex` so subscription
//! handles stay valid after the emitter's owner is gone: disposing a
//! subscription whose emitter was dropped is a no-op.

use std::sync::{Arc, Weak};

use parking_lot::Mutex;

type Callback<T> = Box<dyn FnMut(&T) + Send>;

/// One listener slot. The callback is temporarily taken out while it runs
/// so dispatch never holds the list lock across a user callback.
struct Entry<T> {
    id: u64,
    callback: Option<Callback<T>>,
}

type ListenerList<T> = Mutex<Vec<Entry<T>>>;

/// An event emitter with disposable subscriptions.
pub struct EventEmitter<T> {
    listeners: Arc<ListenerList<T>>,
    next_id: u64,
}

impl<T: 'static> Default for EventEmitter<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for EventEmitter<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventEmitter")
            .field("listeners", &self.listeners.lock().len())
            .field("next_id", &self.next_id)
            .finish()
    }
}

impl<T: 'static> EventEmitter<T> {
    /// Create an emitter with no listeners.
    #[must_use]
    pub fn new() -> Self {
        Self {
            listeners: Arc::new(Mutex::new(Vec::new())),
            next_id: 0,
        }
    }

    /// Register a listener. The returned handle removes it on
    /// [`Subscription::dispose`].
    pub fn subscribe(&mut self, callback: impl FnMut(&T) + Send + 'static) -> Subscription {
        let id = self.next_id;
        self.next_id += 1;
        self.listeners.lock().push(Entry {
            id,
            callback: Some(Box::new(callback)),
        });
        let weak = Arc::downgrade(&self.listeners);
        Subscription {
            remove: Some(Box::new(move || {
                if let Some(listeners) = Weak::upgrade(&weak) {
                    listeners.lock().retain(|entry| entry.id != id);
                }
            })),
        }
    }

    /// Number of registered listeners.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners.lock().len()
    }

    /// Call every listener registered at the time of this emit, in
    /// subscription order.
    pub fn emit(&self, value: &T) {
        let ids: Vec<u64> = self.listeners.lock().iter().map(|entry| entry.id).collect();
        for id in ids {
            // Take the callback out so the lock is not held while it runs.
            let callback = {
                let mut listeners = self.listeners.lock();
                listeners
                    .iter_mut()
                    .find(|entry| entry.id == id)
                    .and_then(|entry| entry.callback.take())
            };
            let Some(mut callback) = callback else {
                continue;
            };
            callback(value);
            // Put it back unless the handler disposed its own subscription.
            let mut listeners = self.listeners.lock();
            if let Some(entry) = listeners.iter_mut().find(|entry| entry.id == id) {
                entry.callback = Some(callback);
            }
        }
    }

    /// Drop every listener.
    pub fn clear(&mut self) {
        self.listeners.lock().clear();
    }
}

/// Handle returned by [`EventEmitter::subscribe`].
///
/// Disposing removes the listener; it is safe to call after the emitter
/// (or the terminal owning it) has been dropped. Dropping the handle
/// without calling [`Subscription::dispose`] leaves the listener
/// registered.
pub struct Subscription {
    remove: Option<Box<dyn FnOnce() + Send>>,
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("disposed", &self.remove.is_none())
            .finish()
    }
}

impl Subscription {
    /// Remove the listener. Idempotent.
    pub fn dispose(&mut self) {
        if let Some(remove) = self.remove.take() {
            remove();
        }
    }
}
