//! Observable state containers.
//!
//! A [`Store`] holds one value and a list of listeners. Every [`Store::set`]
//! or [`Store::update`] replaces the value and then calls each listener with
//! the new value, in the order the listeners subscribed. Subscribing calls
//! the listener once immediately with the current value, so a view bound to
//! a store never has to special-case the initial render.
//!
//! # Locking
//!
//! The value and listener list sit behind one mutex. Listeners run after the
//! lock is released, which means a listener may read (or even write) the
//! store it is observing. The closure passed to [`Store::update`] runs while
//! the lock is held and must not touch the same store.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

/// Callback invoked with the store's value.
type Listener<T> = Arc<dyn Fn(&T) + Send + Sync>;

/// State shared by every handle to the same store.
struct Inner<T> {
    value: T,
    listeners: Vec<(u64, Listener<T>)>,
    next_id: u64,
}

/// Shared mutable value with subscribe/notify semantics.
///
/// Cloning a `Store` yields another handle to the same value.
pub struct Store<T> {
    inner: Arc<Mutex<Inner<T>>>,
}

impl<T> Clone for Store<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Store<T>
where
    T: Clone + Send + 'static,
{
    /// Create a store holding `value` with no listeners.
    pub fn new(value: T) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                value,
                listeners: Vec::new(),
                next_id: 0,
            })),
        }
    }

    /// Return a copy of the current value.
    pub fn get(&self) -> T {
        self.lock().value.clone()
    }

    /// Run `f` against the current value without cloning it.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.lock().value)
    }

    /// Replace the value and notify every listener.
    pub fn set(&self, value: T) {
        let (current, listeners) = {
            let mut inner = self.lock();
            inner.value = value;
            (inner.value.clone(), snapshot_listeners(&inner))
        };
        notify(&listeners, &current);
    }

    /// Compute the next value from the current one and notify listeners.
    ///
    /// `f` receives a shared reference and must return a new value; the
    /// computation is atomic with respect to other callers of this store.
    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(&T) -> T,
    {
        let (current, listeners) = {
            let mut inner = self.lock();
            let next = f(&inner.value);
            inner.value = next;
            (inner.value.clone(), snapshot_listeners(&inner))
        };
        notify(&listeners, &current);
    }

    /// Register a listener.
    ///
    /// The listener is called immediately with the current value and again
    /// after every subsequent change until the returned [`Subscription`] is
    /// unsubscribed.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let listener: Listener<T> = Arc::new(listener);
        let (id, current) = {
            let mut inner = self.lock();
            let id = inner.next_id;
            inner.next_id = inner.next_id.wrapping_add(1);
            inner.listeners.push((id, Arc::clone(&listener)));
            (id, inner.value.clone())
        };
        listener(&current);

        let weak: Weak<Mutex<Inner<T>>> = Arc::downgrade(&self.inner);
        Subscription::new(move || {
            if let Some(inner) = weak.upgrade() {
                lock_inner(&inner)
                    .listeners
                    .retain(|(existing, _)| *existing != id);
            }
        })
    }

    /// Number of listeners currently registered.
    pub fn subscriber_count(&self) -> usize {
        self.lock().listeners.len()
    }

    fn lock(&self) -> MutexGuard<'_, Inner<T>> {
        lock_inner(&self.inner)
    }
}

impl<T> std::fmt::Debug for Store<T>
where
    T: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = lock_inner(&self.inner);
        f.debug_struct("Store")
            .field("value", &inner.value)
            .field("subscribers", &inner.listeners.len())
            .finish()
    }
}

/// Handle returned by [`Store::subscribe`].
///
/// Dropping the handle keeps the listener registered; call
/// [`Subscription::unsubscribe`] to remove it.
#[must_use = "keep the subscription to be able to unsubscribe later"]
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    fn new(cancel: impl FnOnce() + Send + Sync + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Deregister the listener. Calling this more than once is a no-op.
    pub fn unsubscribe(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }

    /// Whether [`unsubscribe`](Self::unsubscribe) has already run.
    pub const fn is_active(&self) -> bool {
        self.cancel.is_some()
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.is_active())
            .finish()
    }
}

fn lock_inner<T>(inner: &Mutex<Inner<T>>) -> MutexGuard<'_, Inner<T>> {
    // A panicking `update` closure leaves the previous value in place.
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}

fn snapshot_listeners<T>(inner: &Inner<T>) -> Vec<Listener<T>> {
    inner
        .listeners
        .iter()
        .map(|(_, listener)| Arc::clone(listener))
        .collect()
}

fn notify<T>(listeners: &[Listener<T>], value: &T) {
    for listener in listeners {
        listener(value);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn recorder() -> (Arc<Mutex<Vec<i32>>>, impl Fn(&i32) + Send + Sync + 'static) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        (seen, move |v: &i32| sink.lock().unwrap().push(*v))
    }

    #[test]
    fn get_returns_initial_value() {
        let store = Store::new(7);
        assert_eq!(store.get(), 7);
    }

    #[test]
    fn subscribe_calls_listener_immediately() {
        let store = Store::new(1);
        let (seen, listener) = recorder();
        let _sub = store.subscribe(listener);
        assert_eq!(*seen.lock().unwrap(), vec![1]);
    }

    #[test]
    fn set_and_update_notify_listeners() {
        let store = Store::new(0);
        let (seen, listener) = recorder();
        let _sub = store.subscribe(listener);

        store.set(5);
        store.update(|v| v.saturating_add(2));

        assert_eq!(store.get(), 7);
        assert_eq!(*seen.lock().unwrap(), vec![0, 5, 7]);
    }

    #[test]
    fn listeners_run_in_subscription_order() {
        let store = Store::new(0);
        let order = Arc::new(Mutex::new(Vec::new()));

        let first = Arc::clone(&order);
        let _a = store.subscribe(move |v: &i32| first.lock().unwrap().push(("a", *v)));
        let second = Arc::clone(&order);
        let _b = store.subscribe(move |v: &i32| second.lock().unwrap().push(("b", *v)));

        order.lock().unwrap().clear();
        store.set(3);
        assert_eq!(*order.lock().unwrap(), vec![("a", 3), ("b", 3)]);
    }

    #[test]
    fn unsubscribe_stops_notifications() {
        let store = Store::new(0);
        let (seen, listener) = recorder();
        let mut sub = store.subscribe(listener);
        assert_eq!(store.subscriber_count(), 1);

        sub.unsubscribe();
        sub.unsubscribe();
        assert!(!sub.is_active());
        assert_eq!(store.subscriber_count(), 0);

        store.set(9);
        assert_eq!(*seen.lock().unwrap(), vec![0]);
    }

    #[test]
    fn clones_share_the_same_value() {
        let store = Store::new(String::from("a"));
        let other = store.clone();
        other.set(String::from("b"));
        assert_eq!(store.get(), "b");
    }

    #[test]
    fn listener_may_read_its_own_store() {
        let store = Store::new(1);
        let reader = store.clone();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let _sub = store.subscribe(move |_| sink.lock().unwrap().push(reader.get()));

        store.set(2);
        assert_eq!(*seen.lock().unwrap(), vec![1, 2]);
    }

    #[test]
    fn unsubscribe_after_store_dropped_is_harmless() {
        let store = Store::new(0);
        let mut sub = store.subscribe(|_| {});
        drop(store);
        sub.unsubscribe();
        assert!(!sub.is_active());
    }
}
