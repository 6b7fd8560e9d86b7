//! Derived signals.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use super::effect::{effect, untrack};
use super::signal::{signal, Signal};
use super::Cleanup;
use crate::component::ComponentHost;

/// A read-only signal recomputed whenever one of its dependencies changes.
///
/// Created by [`computed`]. Reads are tracked like any other signal, so
/// computeds can feed effects and other computeds.
pub struct Computed<T: 'static> {
    cell: Signal<T>,
    /// Disposer of the recompute effect when no component owns it.
    stop: Rc<RefCell<Option<Cleanup>>>,
}

/// Create a derived signal from `f`.
///
/// `f` runs once to produce the initial value and again inside an effect
/// whenever a dependency changes; the result is written back with the usual
/// change rule.
///
/// When `owner` is given, every value change also schedules a re-render of the
/// owning component on the microtask queue. Several changes within the same
/// tick collapse into one re-render, and nothing is scheduled while the
/// component is not mounted. The owner keeps the recompute effect and disposes
/// it when its application is torn down.
pub fn computed<T: Clone + PartialEq + 'static>(
    f: impl Fn() -> T + 'static,
    owner: Option<&ComponentHost>,
) -> Computed<T> {
    let cell = signal(untrack(&f));
    let target = cell.clone();
    let host = owner.cloned();

    let stop = effect(move || {
        let value = f();
        let changed = target.with_untracked(|current| *current != value);
        target.set(value);
        if changed {
            if let Some(host) = &host {
                host.schedule_rerender();
            }
        }
    });

    let stop = match owner {
        Some(host) => {
            host.own(stop);
            None
        }
        None => Some(stop),
    };

    Computed {
        cell,
        stop: Rc::new(RefCell::new(stop)),
    }
}

impl<T: Clone + 'static> Computed<T> {
    /// Current value (tracked).
    pub fn get(&self) -> T {
        self.cell.get()
    }

    /// Current value without subscribing the current effect.
    pub fn get_untracked(&self) -> T {
        self.cell.get_untracked()
    }
}

impl<T: 'static> Computed<T> {
    /// Borrow the value (tracked).
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.cell.with(f)
    }

    /// Subscribe to value changes.
    pub fn subscribe(&self, f: impl Fn(&T) + 'static) -> Cleanup {
        self.cell.subscribe(f)
    }

    /// Stop recomputing. Owned computeds are stopped by their owner instead,
    /// so this is a no-op for them.
    pub fn dispose(&self) {
        if let Some(stop) = self.stop.borrow_mut().take() {
            stop();
        }
    }
}

impl<T: 'static> Clone for Computed<T> {
    fn clone(&self) -> Self {
        Self {
            cell: self.cell.clone(),
            stop: self.stop.clone(),
        }
    }
}

impl<T: fmt::Debug + 'static> fmt::Debug for Computed<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.cell.with_untracked(|value| f.debug_tuple("Computed").field(value).finish())
    }
}
