//! Signal Core - fine-grained reactivity.
//!
//! - [`signal`] - writable value cell with change-driven notification
//! - [`effect`] - tracked side effect, re-run on dependency change
//! - [`computed`] - derived signal, optionally owned by a component
//! - [`Output`] - event emitter for component outputs
//! - [`to_observable`] - callback adapter over a signal
//!
//! # Tracking
//!
//! ```text
//! effect(f) ─ push f ─▶ f() reads signal ─▶ signal subscribes f ─ pop f
//! signal.set(v) ─ v != old ─▶ run subscribers in order ─▶ return
//! ```
//!
//! Everything here is single-threaded (`Rc`/`RefCell`); the observer stack is
//! thread-local.

mod computed;
mod effect;
mod observable;
mod output;
mod signal;

/// Cleanup function returned by effects and subscriptions.
///
/// Call it to unsubscribe. `FnOnce`, so a disposer cannot run twice.
pub type Cleanup = Box<dyn FnOnce()>;

pub use computed::{computed, Computed};
pub use effect::{effect, is_tracking, untrack};
pub use observable::{to_observable, Observable, ObservableSubscription};
pub use output::{Output, OutputListener};
pub use signal::{signal, Signal};
