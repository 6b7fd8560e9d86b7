//! Writable signals.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use super::Cleanup;
use super::effect::{current_observer, EffectId, EffectInner, Source};

// =============================================================================
// Subscribers
// =============================================================================

enum Subscriber<T> {
    /// A tracked effect, registered by reading the signal.
    Effect(Rc<EffectInner>),
    /// A plain value callback registered with [`Signal::subscribe`].
    Callback { id: u64, f: Rc<dyn Fn(&T)> },
}

impl<T> Clone for Subscriber<T> {
    fn clone(&self) -> Self {
        match self {
            Subscriber::Effect(effect) => Subscriber::Effect(effect.clone()),
            Subscriber::Callback { id, f } => Subscriber::Callback { id: *id, f: f.clone() },
        }
    }
}

struct SignalInner<T> {
    value: RefCell<T>,
    /// Kept in subscription order.
    subscribers: RefCell<Vec<Subscriber<T>>>,
    next_callback_id: Cell<u64>,
}

impl<T> Source for SignalInner<T> {
    fn remove_subscriber(&self, id: EffectId) {
        self.subscribers
            .borrow_mut()
            .retain(|s| !matches!(s, Subscriber::Effect(effect) if effect.id() == id));
    }
}

// =============================================================================
// Signal
// =============================================================================

/// A reactive value cell.
///
/// Reading with [`get`](Signal::get) inside an effect subscribes that effect.
/// Writing with [`set`](Signal::set) notifies every subscriber, in
/// subscription order, but only when the new value differs from the stored
/// one. Cloning a `Signal` clones the handle, not the value.
pub struct Signal<T: 'static> {
    inner: Rc<SignalInner<T>>,
}

/// Create a signal holding `initial`.
pub fn signal<T: 'static>(initial: T) -> Signal<T> {
    Signal {
        inner: Rc::new(SignalInner {
            value: RefCell::new(initial),
            subscribers: RefCell::new(Vec::new()),
            next_callback_id: Cell::new(0),
        }),
    }
}

impl<T: 'static> Signal<T> {
    /// Subscribe the current observer (if any) to this signal.
    fn track(&self) {
        let Some(observer) = current_observer() else { return };
        {
            let mut subscribers = self.inner.subscribers.borrow_mut();
            let present = subscribers
                .iter()
                .any(|s| matches!(s, Subscriber::Effect(effect) if Rc::ptr_eq(effect, &observer)));
            if present || observer.is_disposed() {
                return;
            }
            subscribers.push(Subscriber::Effect(observer.clone()));
        }
        let source: Weak<dyn Source> = Rc::downgrade(&self.inner) as Weak<dyn Source>;
        observer.add_source(source);
    }

    /// Borrow the value (tracked).
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.track();
        f(&self.inner.value.borrow())
    }

    /// Borrow the value without subscribing the current effect.
    pub fn with_untracked<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.value.borrow())
    }

    /// Subscribe `f` to value changes. Returns the unsubscribe function.
    pub fn subscribe(&self, f: impl Fn(&T) + 'static) -> Cleanup {
        let id = self.inner.next_callback_id.get();
        self.inner.next_callback_id.set(id + 1);
        self.inner
            .subscribers
            .borrow_mut()
            .push(Subscriber::Callback { id, f: Rc::new(f) });

        let weak = Rc::downgrade(&self.inner);
        Box::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner
                    .subscribers
                    .borrow_mut()
                    .retain(|s| !matches!(s, Subscriber::Callback { id: cb, .. } if *cb == id));
            }
        })
    }

    /// Number of live subscribers (effects and callbacks).
    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.borrow().len()
    }

    /// Whether two handles point at the same cell.
    pub fn ptr_eq(&self, other: &Signal<T>) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<T: Clone + 'static> Signal<T> {
    /// Current value (tracked).
    pub fn get(&self) -> T {
        self.with(T::clone)
    }

    /// Current value without subscribing the current effect.
    pub fn get_untracked(&self) -> T {
        self.with_untracked(T::clone)
    }

    fn notify(&self) {
        let subscribers = self.inner.subscribers.borrow().clone();
        for subscriber in subscribers {
            match subscriber {
                Subscriber::Effect(effect) => effect.execute(),
                Subscriber::Callback { f, .. } => {
                    let value = self.get_untracked();
                    f(&value);
                }
            }
        }
    }
}

impl<T: Clone + PartialEq + 'static> Signal<T> {
    /// Write a value. Subscribers run before `set` returns, and only if
    /// `value` differs from the stored value.
    pub fn set(&self, value: T) {
        {
            let mut current = self.inner.value.borrow_mut();
            if *current == value {
                return;
            }
            *current = value;
        }
        self.notify();
    }

    /// Write `f(current)`.
    pub fn update(&self, f: impl FnOnce(&T) -> T) {
        let next = self.with_untracked(f);
        self.set(next);
    }
}

impl<T: 'static> Clone for Signal<T> {
    fn clone(&self) -> Self {
        Self { inner: self.inner.clone() }
    }
}

impl<T: fmt::Debug + 'static> fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Signal").field(&*self.inner.value.borrow()).finish()
    }
}
