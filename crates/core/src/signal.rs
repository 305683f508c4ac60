//! Minimal single-threaded reactive cell.
//!
//! A [`Signal`] holds a value and a list of subscribers that are notified when the value
//! changes. Subscribers may read and write the signal from inside their callback; a write
//! from a callback runs a nested notification pass with the new value, and the outer pass
//! stops before reaching the remaining subscribers.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

type Callback<T> = Rc<RefCell<dyn FnMut(&T)>>;

struct Inner<T> {
    value: RefCell<T>,
    subscribers: RefCell<Vec<(u64, Callback<T>)>>,
    next_id: Cell<u64>,
    version: Cell<u64>,
    writes: Cell<u64>,
}

/// Shared observable value.
pub struct Signal<T> {
    inner: Rc<Inner<T>>,
}

impl<T> Clone for Signal<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("value", &*self.inner.value.borrow())
            .field("version", &self.inner.version.get())
            .finish()
    }
}

impl<T: Default + Clone + PartialEq + 'static> Default for Signal<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: Clone + PartialEq + 'static> Signal<T> {
    /// Create a signal holding `value`.
    pub fn new(value: T) -> Self {
        Self {
            inner: Rc::new(Inner {
                value: RefCell::new(value),
                subscribers: RefCell::new(Vec::new()),
                next_id: Cell::new(0),
                version: Cell::new(0),
                writes: Cell::new(0),
            }),
        }
    }

    /// Current value.
    pub fn get(&self) -> T {
        self.inner.value.borrow().clone()
    }

    /// Run `f` against the current value without cloning it.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.value.borrow())
    }

    /// Number of committed changes so far.
    pub fn version(&self) -> u64 {
        self.inner.version.get()
    }

    /// Number of `set` calls so far, including those that stored an equal value.
    pub fn writes(&self) -> u64 {
        self.inner.writes.get()
    }

    /// Store `value` and notify subscribers. Returns false when the value was unchanged.
    pub fn set(&self, value: T) -> bool {
        self.inner.writes.set(self.inner.writes.get() + 1);
        {
            let mut current = self.inner.value.borrow_mut();
            if *current == value {
                return false;
            }
            *current = value;
        }
        self.inner.version.set(self.inner.version.get() + 1);
        self.notify();
        true
    }

    /// Modify the value in place and notify when it changed.
    pub fn update(&self, f: impl FnOnce(&mut T)) -> bool {
        let mut next = self.get();
        f(&mut next);
        self.set(next)
    }

    /// Register a callback invoked with the new value after every change.
    pub fn subscribe(&self, callback: impl FnMut(&T) + 'static) -> Subscription {
        let id = self.inner.next_id.get();
        self.inner.next_id.set(id + 1);
        let callback: Callback<T> = Rc::new(RefCell::new(callback));
        self.inner.subscribers.borrow_mut().push((id, callback));
        let weak: Weak<Inner<T>> = Rc::downgrade(&self.inner);
        Subscription {
            unsubscribe: Some(Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    inner.subscribers.borrow_mut().retain(|(sub, _)| *sub != id);
                }
            })),
        }
    }

    /// Number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.borrow().len()
    }

    fn notify(&self) {
        // Snapshot so callbacks can subscribe, unsubscribe or write back.
        let subscribers: Vec<Callback<T>> = self
            .inner
            .subscribers
            .borrow()
            .iter()
            .map(|(_, cb)| Rc::clone(cb))
            .collect();
        let version = self.inner.version.get();
        for callback in subscribers {
            if self.inner.version.get() != version {
                // A callback already wrote a newer value and triggered its own pass.
                return;
            }
            let value = self.get();
            if let Ok(mut f) = callback.try_borrow_mut() {
                (&mut *f)(&value);
            }
        }
    }
}

/// Handle that removes its subscription when dropped.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    unsubscribe: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    /// Remove the subscription now.
    pub fn unsubscribe(mut self) {
        if let Some(f) = self.unsubscribe.take() {
            f();
        }
    }

    /// Keep the subscription alive for the lifetime of the signal.
    pub fn detach(mut self) {
        self.unsubscribe = None;
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(f) = self.unsubscribe.take() {
            f();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.unsubscribe.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_notifies_only_on_change() {
        let signal = Signal::new(1);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let _sub = signal.subscribe(move |v| sink.borrow_mut().push(*v));

        assert!(signal.set(2));
        assert!(!signal.set(2));
        assert!(signal.update(|v| *v += 1));
        assert_eq!(*seen.borrow(), vec![2, 3]);
        assert_eq!(signal.version(), 2);
        assert_eq!(signal.writes(), 3);
    }

    #[test]
    fn dropping_subscription_unsubscribes() {
        let signal = Signal::new(0u32);
        let count = Rc::new(Cell::new(0));
        let counter = Rc::clone(&count);
        let sub = signal.subscribe(move |_| counter.set(counter.get() + 1));
        signal.set(1);
        drop(sub);
        signal.set(2);
        assert_eq!(count.get(), 1);
        assert_eq!(signal.subscriber_count(), 0);
    }

    #[test]
    fn subscriber_may_write_back() {
        let signal = Signal::new(0i32);
        let writer = signal.clone();
        let _clamp = signal.subscribe(move |v| {
            if *v > 10 {
                writer.set(10);
            }
        });
        let last = Rc::new(Cell::new(0));
        let observed = Rc::clone(&last);
        let _observe = signal.subscribe(move |v| observed.set(*v));

        signal.set(25);
        assert_eq!(signal.get(), 10);
        assert_eq!(last.get(), 10);
    }

    #[test]
    fn nested_write_ends_outer_pass() {
        let signal = Signal::new(0i32);
        let writer = signal.clone();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let _first = signal.subscribe(move |v| {
            if *v == 1 {
                writer.set(2);
            }
        });
        let sink = Rc::clone(&seen);
        let _second = signal.subscribe(move |v| sink.borrow_mut().push(*v));

        signal.set(1);
        // The second subscriber only sees the value written by the first.
        assert_eq!(*seen.borrow(), vec![2]);
    }
}
