//! Listener registries with handle-based unregistration.
//!
//! A [`ListenerSet`] hands out a [`Subscription`] per registered callback.
//! Dropping the subscription, or calling [`Subscription::unsubscribe`],
//! removes the callback. Emission snapshots the registry under a short lock
//! and invokes callbacks outside it, so callbacks may register or unregister
//! listeners freely. A panicking callback is logged and does not affect the
//! others.

use std::any::Any;
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use tracing::error;

type Callback<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct Registry<T> {
    next_id: u64,
    entries: Vec<(u64, Callback<T>)>,
    closed: bool,
}

trait Unregister: Send + Sync {
    fn unregister(&self, id: u64);
}

impl<T> Unregister for Mutex<Registry<T>> {
    fn unregister(&self, id: u64) {
        let mut registry = self.lock().unwrap_or_else(PoisonError::into_inner);
        registry.entries.retain(|(entry_id, _)| *entry_id != id);
    }
}

/// A set of callbacks receiving `&T`.
pub struct ListenerSet<T> {
    name: &'static str,
    inner: Arc<Mutex<Registry<T>>>,
}

impl<T: 'static> ListenerSet<T> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            inner: Arc::new(Mutex::new(Registry {
                next_id: 0,
                entries: Vec::new(),
                closed: false,
            })),
        }
    }

    fn registry(&self) -> MutexGuard<'_, Registry<T>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers `callback`. After [`close`](Self::close) the returned
    /// subscription is inert.
    pub fn add<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let mut registry = self.registry();
        if registry.closed {
            return Subscription::inert();
        }
        let id = registry.next_id;
        registry.next_id += 1;
        registry.entries.push((id, Arc::new(callback)));
        drop(registry);

        let weak: Weak<dyn Unregister> = Arc::downgrade(&self.inner) as Weak<dyn Unregister>;
        Subscription {
            id,
            registry: Some(weak),
        }
    }

    /// Invokes every registered callback with `value`.
    pub fn emit(&self, value: &T) {
        let snapshot: Vec<Callback<T>> = self
            .registry()
            .entries
            .iter()
            .map(|(_, callback)| Arc::clone(callback))
            .collect();

        for callback in snapshot {
            if let Err(payload) = catch_unwind(AssertUnwindSafe(|| callback(value))) {
                error!(
                    listeners = self.name,
                    panic = %panic_message(payload.as_ref()),
                    "Listener panicked"
                );
            }
        }
    }

    /// Removes all callbacks and rejects future registrations.
    pub fn close(&self) {
        let mut registry = self.registry();
        registry.closed = true;
        registry.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.registry().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> fmt::Debug for ListenerSet<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let count = self
            .inner
            .lock()
            .map(|r| r.entries.len())
            .unwrap_or_default();
        f.debug_struct("ListenerSet")
            .field("name", &self.name)
            .field("listeners", &count)
            .finish()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Handle for a registered listener. Unregisters on drop.
#[must_use = "dropping a Subscription immediately unregisters the listener"]
pub struct Subscription {
    id: u64,
    registry: Option<Weak<dyn Unregister>>,
}

impl Subscription {
    fn inert() -> Self {
        Self {
            id: 0,
            registry: None,
        }
    }

    /// Unregisters the listener. Calling this again, or after the owner has
    /// been torn down, does nothing.
    pub fn unsubscribe(&mut self) {
        if let Some(registry) = self.registry.take().and_then(|weak| weak.upgrade()) {
            registry.unregister(self.id);
        }
    }

    pub fn is_active(&self) -> bool {
        self.registry
            .as_ref()
            .is_some_and(|weak| weak.strong_count() > 0)
    }

    /// Keeps the listener registered for the registry's whole lifetime.
    pub fn detach(mut self) {
        self.registry = None;
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("active", &self.is_active())
            .finish()
    }
}
