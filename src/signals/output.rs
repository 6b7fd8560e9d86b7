//! Output channels - component events flowing to the parent template.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use super::Cleanup;

/// Listener callback type (Rc so it can be cloned out before dispatch).
pub type OutputListener<T> = Rc<dyn Fn(&T)>;

struct OutputInner<T> {
    listeners: RefCell<Vec<(u64, OutputListener<T>)>>,
    next_id: Cell<u64>,
}

/// An event emitter a component exposes to its parent.
///
/// A parent template binds it with `(name)="handler($event)"`; the renderer
/// subscribes the handler when it mounts the child. Unlike a signal, every
/// `emit` reaches the listeners, equal values included.
pub struct Output<T: 'static> {
    inner: Rc<OutputInner<T>>,
}

impl<T: 'static> Output<T> {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(OutputInner {
                listeners: RefCell::new(Vec::new()),
                next_id: Cell::new(0),
            }),
        }
    }

    /// Deliver `value` to every listener, in subscription order.
    pub fn emit(&self, value: T) {
        let listeners: Vec<OutputListener<T>> = self
            .inner
            .listeners
            .borrow()
            .iter()
            .map(|(_, listener)| listener.clone())
            .collect();
        for listener in listeners {
            listener(&value);
        }
    }

    /// Register a listener. Returns the unsubscribe function.
    pub fn subscribe(&self, f: impl Fn(&T) + 'static) -> Cleanup {
        let id = self.inner.next_id.get();
        self.inner.next_id.set(id + 1);
        self.inner.listeners.borrow_mut().push((id, Rc::new(f)));

        let weak = Rc::downgrade(&self.inner);
        Box::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.listeners.borrow_mut().retain(|(other, _)| *other != id);
            }
        })
    }

    pub fn listener_count(&self) -> usize {
        self.inner.listeners.borrow().len()
    }
}

impl<T: 'static> Default for Output<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: 'static> Clone for Output<T> {
    fn clone(&self) -> Self {
        Self { inner: self.inner.clone() }
    }
}
