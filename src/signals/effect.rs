//! Effects and dependency tracking.
//!
//! An effect is a closure that re-runs whenever a signal it read during its
//! last run is written. Tracking works through a thread-local observer stack:
//! [`effect`] pushes the effect, runs it, pops it; every `Signal::get` in
//! between subscribes the effect on top of the stack.
//!
//! Each effect remembers the signals it subscribed to, so disposing an effect
//! only touches its own sources.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use super::Cleanup;

// =============================================================================
// Tracking State
// =============================================================================

thread_local! {
    /// Effects currently executing. `None` entries mark untracked sections.
    static OBSERVERS: RefCell<Vec<Option<Rc<EffectInner>>>> = const { RefCell::new(Vec::new()) };

    /// Counter for effect ids.
    static NEXT_EFFECT_ID: Cell<u64> = const { Cell::new(0) };
}

pub(crate) type EffectId = u64;

/// Anything an effect can subscribe to.
pub(crate) trait Source {
    fn remove_subscriber(&self, id: EffectId);
}

pub(crate) struct EffectInner {
    id: EffectId,
    run: RefCell<Box<dyn FnMut()>>,
    running: Cell<bool>,
    disposed: Cell<bool>,
    sources: RefCell<Vec<Weak<dyn Source>>>,
}

impl EffectInner {
    pub(crate) fn id(&self) -> EffectId {
        self.id
    }

    pub(crate) fn is_disposed(&self) -> bool {
        self.disposed.get()
    }

    /// Run the effect with itself on the observer stack.
    ///
    /// An effect that is already executing is never re-entered: the nested
    /// request is dropped.
    pub(crate) fn execute(self: &Rc<Self>) {
        if self.running.get() || self.disposed.get() {
            return;
        }
        self.running.set(true);
        let _running = RunningGuard(&self.running);
        let _frame = ObserverFrame::push(Some(self.clone()));
        let mut run = self.run.borrow_mut();
        (&mut *run)();
    }

    pub(crate) fn add_source(&self, source: Weak<dyn Source>) {
        self.sources.borrow_mut().push(source);
    }

    fn dispose(&self) {
        if self.disposed.replace(true) {
            return;
        }
        let sources = std::mem::take(&mut *self.sources.borrow_mut());
        for source in sources {
            if let Some(source) = source.upgrade() {
                source.remove_subscriber(self.id);
            }
        }
    }
}

/// Pops the observer stack when dropped, so a panicking effect body
/// does not leave itself registered as the current observer.
struct ObserverFrame;

impl ObserverFrame {
    fn push(observer: Option<Rc<EffectInner>>) -> Self {
        OBSERVERS.with(|stack| stack.borrow_mut().push(observer));
        ObserverFrame
    }
}

impl Drop for ObserverFrame {
    fn drop(&mut self) {
        OBSERVERS.with(|stack| {
            stack.borrow_mut().pop();
        });
    }
}

/// Clears the `running` flag when dropped, so an effect whose body panicked
/// can still run on the next write.
struct RunningGuard<'a>(&'a Cell<bool>);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

/// The effect currently collecting dependencies, if any.
pub(crate) fn current_observer() -> Option<Rc<EffectInner>> {
    OBSERVERS.with(|stack| stack.borrow().last().cloned().flatten())
}

// =============================================================================
// Public API
// =============================================================================

/// Create an effect.
///
/// `f` runs once, synchronously, before `effect` returns. Afterwards it runs
/// again every time one of the signals it read is written with a new value.
///
/// Returns the disposer: calling it removes the effect from every signal it
/// subscribed to. Dropping the disposer without calling it leaves the effect
/// alive for as long as its signals are.
///
/// ```ignore
/// let count = signal(0);
/// let seen = count.clone();
/// let stop = effect(move || println!("count = {}", seen.get()));
/// count.set(1); // prints "count = 1"
/// stop();
/// count.set(2); // prints nothing
/// ```
pub fn effect(f: impl FnMut() + 'static) -> Cleanup {
    let id = NEXT_EFFECT_ID.with(|next| {
        let id = next.get();
        next.set(id + 1);
        id
    });
    let inner = Rc::new(EffectInner {
        id,
        run: RefCell::new(Box::new(f)),
        running: Cell::new(false),
        disposed: Cell::new(false),
        sources: RefCell::new(Vec::new()),
    });

    inner.execute();

    Box::new(move || inner.dispose())
}

/// Run `f` without subscribing the current effect to anything it reads.
pub fn untrack<R>(f: impl FnOnce() -> R) -> R {
    let _frame = ObserverFrame::push(None);
    f()
}

/// Whether an effect is currently collecting dependencies.
pub fn is_tracking() -> bool {
    current_observer().is_some()
}
