//! Host events.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use super::node::{Node, WeakNode};
use crate::types::Value;

struct EventInner {
    kind: String,
    detail: Value,
    default_prevented: Cell<bool>,
    propagation_stopped: Cell<bool>,
    target: RefCell<Option<WeakNode>>,
}

/// An event dispatched through the host tree.
///
/// Cloning shares the same event, so a handler calling
/// [`prevent_default`](Event::prevent_default) is visible to the dispatcher.
#[derive(Clone)]
pub struct Event {
    inner: Rc<EventInner>,
}

impl Event {
    pub fn new(kind: impl Into<String>) -> Self {
        Self::with_detail(kind, Value::Null)
    }

    /// An event carrying a payload (form values, custom data).
    pub fn with_detail(kind: impl Into<String>, detail: impl Into<Value>) -> Self {
        Self {
            inner: Rc::new(EventInner {
                kind: kind.into(),
                detail: detail.into(),
                default_prevented: Cell::new(false),
                propagation_stopped: Cell::new(false),
                target: RefCell::new(None),
            }),
        }
    }

    pub fn kind(&self) -> &str {
        &self.inner.kind
    }

    pub fn detail(&self) -> Value {
        self.inner.detail.clone()
    }

    pub fn prevent_default(&self) {
        self.inner.default_prevented.set(true);
    }

    pub fn default_prevented(&self) -> bool {
        self.inner.default_prevented.get()
    }

    pub fn stop_propagation(&self) {
        self.inner.propagation_stopped.set(true);
    }

    pub fn propagation_stopped(&self) -> bool {
        self.inner.propagation_stopped.get()
    }

    /// Node the event was dispatched on.
    pub fn target(&self) -> Option<Node> {
        self.inner.target.borrow().as_ref().and_then(WeakNode::upgrade)
    }

    pub(crate) fn set_target(&self, target: &Node) {
        *self.inner.target.borrow_mut() = Some(target.downgrade());
    }

    pub fn ptr_eq(&self, other: &Event) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("kind", &self.inner.kind)
            .field("detail", &self.inner.detail)
            .field("default_prevented", &self.default_prevented())
            .finish()
    }
}
