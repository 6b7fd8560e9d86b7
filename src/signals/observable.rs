//! Observable adapter for signals.
//!
//! Bridges a [`Signal`] to callback-style consumers that expect the current
//! value on subscription, followed by every change.

use super::signal::Signal;
use super::Cleanup;

/// A push-based view of a signal. See [`to_observable`].
pub struct Observable<T: 'static> {
    source: Signal<T>,
}

/// Handle returned by [`Observable::subscribe`].
pub struct ObservableSubscription {
    cleanup: Option<Cleanup>,
}

impl ObservableSubscription {
    /// Stop receiving values.
    pub fn unsubscribe(mut self) {
        if let Some(cleanup) = self.cleanup.take() {
            cleanup();
        }
    }
}

/// Wrap `source` as an [`Observable`].
pub fn to_observable<T: Clone + 'static>(source: &Signal<T>) -> Observable<T> {
    Observable { source: source.clone() }
}

impl<T: Clone + 'static> Observable<T> {
    /// Latest value of the source (untracked).
    pub fn value(&self) -> T {
        self.source.get_untracked()
    }

    /// Call `f` with the current value now, then on every change.
    pub fn subscribe(&self, f: impl Fn(&T) + 'static) -> ObservableSubscription {
        self.source.with_untracked(|value| f(value));
        ObservableSubscription {
            cleanup: Some(self.source.subscribe(f)),
        }
    }
}
