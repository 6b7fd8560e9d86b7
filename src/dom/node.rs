//! Host tree nodes.
//!
//! A [`Node`] is a reference-counted handle. Children are owned by their
//! parent; the parent link is weak. Besides structure, elements carry
//! attributes (strings), properties (values written by `[prop]` bindings),
//! event listeners and detach hooks.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::fmt;
use std::fmt::Write as _;
use std::rc::{Rc, Weak};

use super::event::Event;
use crate::types::Value;

/// Event listener callback (Rc so listeners can be cloned out before dispatch).
pub type EventCallback = Rc<dyn Fn(&Event)>;

/// Callback run when a node, or one of its ancestors, is detached.
pub type DetachHook = Rc<dyn Fn()>;

thread_local! {
    static NEXT_HOOK_ID: Cell<u64> = const { Cell::new(0) };
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Document,
    Element(String),
    Text,
}

struct NodeData {
    kind: NodeKind,
    text: RefCell<String>,
    attributes: RefCell<Vec<(String, String)>>,
    properties: RefCell<BTreeMap<String, Value>>,
    children: RefCell<Vec<Node>>,
    parent: RefCell<Weak<NodeData>>,
    listeners: RefCell<Vec<(String, EventCallback)>>,
    detach_hooks: RefCell<Vec<(u64, DetachHook)>>,
}

/// Handle to a host tree node.
#[derive(Clone)]
pub struct Node(Rc<NodeData>);

/// Non-owning node handle.
#[derive(Clone)]
pub struct WeakNode(Weak<NodeData>);

impl WeakNode {
    pub fn upgrade(&self) -> Option<Node> {
        self.0.upgrade().map(Node)
    }
}

impl Node {
    fn with_kind(kind: NodeKind, text: String) -> Self {
        Node(Rc::new(NodeData {
            kind,
            text: RefCell::new(text),
            attributes: RefCell::new(Vec::new()),
            properties: RefCell::new(BTreeMap::new()),
            children: RefCell::new(Vec::new()),
            parent: RefCell::new(Weak::new()),
            listeners: RefCell::new(Vec::new()),
            detach_hooks: RefCell::new(Vec::new()),
        }))
    }

    pub(crate) fn document() -> Self {
        Self::with_kind(NodeKind::Document, String::new())
    }

    pub fn element(tag: impl Into<String>) -> Self {
        Self::with_kind(NodeKind::Element(tag.into()), String::new())
    }

    pub fn text(content: impl Into<String>) -> Self {
        Self::with_kind(NodeKind::Text, content.into())
    }

    // =========================================================================
    // Identity
    // =========================================================================

    pub fn kind(&self) -> &NodeKind {
        &self.0.kind
    }

    /// Tag name for elements.
    pub fn tag_name(&self) -> Option<&str> {
        match &self.0.kind {
            NodeKind::Element(tag) => Some(tag),
            _ => None,
        }
    }

    pub fn is_element(&self) -> bool {
        matches!(self.0.kind, NodeKind::Element(_))
    }

    pub fn is_text(&self) -> bool {
        matches!(self.0.kind, NodeKind::Text)
    }

    pub fn ptr_eq(&self, other: &Node) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub fn downgrade(&self) -> WeakNode {
        WeakNode(Rc::downgrade(&self.0))
    }

    // =========================================================================
    // Text
    // =========================================================================

    /// Own text of a text node (empty for other nodes).
    pub fn text_value(&self) -> String {
        self.0.text.borrow().clone()
    }

    pub fn set_text_value(&self, content: impl Into<String>) {
        *self.0.text.borrow_mut() = content.into();
    }

    /// Concatenated text of this node and all descendants.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        if self.is_text() {
            out.push_str(&self.0.text.borrow());
        }
        for child in self.0.children.borrow().iter() {
            child.collect_text(out);
        }
    }

    // =========================================================================
    // Attributes & Properties
    // =========================================================================

    pub fn set_attribute(&self, name: &str, value: impl Into<String>) {
        let value = value.into();
        let mut attributes = self.0.attributes.borrow_mut();
        match attributes.iter_mut().find(|(n, _)| n == name) {
            Some((_, existing)) => *existing = value,
            None => attributes.push((name.to_string(), value)),
        }
    }

    pub fn attribute(&self, name: &str) -> Option<String> {
        self.0
            .attributes
            .borrow()
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.clone())
    }

    pub fn remove_attribute(&self, name: &str) {
        self.0.attributes.borrow_mut().retain(|(n, _)| n != name);
    }

    /// Attributes in insertion order.
    pub fn attributes(&self) -> Vec<(String, String)> {
        self.0.attributes.borrow().clone()
    }

    pub fn set_property(&self, name: &str, value: Value) {
        self.0.properties.borrow_mut().insert(name.to_string(), value);
    }

    pub fn property(&self, name: &str) -> Option<Value> {
        self.0.properties.borrow().get(name).cloned()
    }

    // =========================================================================
    // Structure
    // =========================================================================

    pub fn parent(&self) -> Option<Node> {
        self.0.parent.borrow().upgrade().map(Node)
    }

    pub fn children(&self) -> Vec<Node> {
        self.0.children.borrow().clone()
    }

    pub fn child_count(&self) -> usize {
        self.0.children.borrow().len()
    }

    pub fn first_child(&self) -> Option<Node> {
        self.0.children.borrow().first().cloned()
    }

    /// Append `child`, detaching it from its current parent first.
    pub fn append_child(&self, child: &Node) {
        child.remove();
        *child.0.parent.borrow_mut() = Rc::downgrade(&self.0);
        self.0.children.borrow_mut().push(child.clone());
    }

    /// Remove `child` from this node. Returns false if it is not a child.
    pub fn remove_child(&self, child: &Node) -> bool {
        let removed = {
            let mut children = self.0.children.borrow_mut();
            match children.iter().position(|c| c.ptr_eq(child)) {
                Some(index) => {
                    children.remove(index);
                    true
                }
                None => false,
            }
        };
        if removed {
            *child.0.parent.borrow_mut() = Weak::new();
            child.fire_detach_hooks();
        }
        removed
    }

    /// Detach this node from its parent, if any.
    pub fn remove(&self) {
        if let Some(parent) = self.parent() {
            parent.remove_child(self);
        }
    }

    /// Detach every child (the equivalent of clearing inner markup).
    pub fn clear_children(&self) {
        let children = std::mem::take(&mut *self.0.children.borrow_mut());
        for child in &children {
            *child.0.parent.borrow_mut() = Weak::new();
        }
        for child in &children {
            child.fire_detach_hooks();
        }
    }

    /// Whether `other` is this node or one of its descendants.
    pub fn contains(&self, other: &Node) -> bool {
        let mut current = Some(other.clone());
        while let Some(node) = current {
            if node.ptr_eq(self) {
                return true;
            }
            current = node.parent();
        }
        false
    }

    /// Whether the node is attached to a document.
    pub fn is_connected(&self) -> bool {
        let mut current = self.clone();
        while let Some(parent) = current.parent() {
            current = parent;
        }
        current.0.kind == NodeKind::Document
    }

    // =========================================================================
    // Events
    // =========================================================================

    pub fn add_event_listener(&self, kind: &str, f: impl Fn(&Event) + 'static) {
        self.0
            .listeners
            .borrow_mut()
            .push((kind.to_string(), Rc::new(f)));
    }

    pub fn listener_count(&self, kind: &str) -> usize {
        self.0.listeners.borrow().iter().filter(|(k, _)| k == kind).count()
    }

    /// Dispatch `event` on this node and bubble it through its ancestors.
    ///
    /// The propagation path is fixed before the first listener runs, so
    /// handlers that re-render (and detach the target) do not cut it short.
    /// Returns false if a listener called `prevent_default`.
    pub fn dispatch_event(&self, event: &Event) -> bool {
        event.set_target(self);

        let mut path = vec![self.clone()];
        let mut current = self.parent();
        while let Some(node) = current {
            current = node.parent();
            path.push(node);
        }

        for node in path {
            let listeners: Vec<EventCallback> = node
                .0
                .listeners
                .borrow()
                .iter()
                .filter(|(k, _)| k == event.kind())
                .map(|(_, f)| f.clone())
                .collect();
            for listener in listeners {
                listener(event);
            }
            if event.propagation_stopped() {
                break;
            }
        }
        !event.default_prevented()
    }

    // =========================================================================
    // Detach Hooks
    // =========================================================================

    /// Run `f` when this node, or an ancestor, is detached from its parent.
    /// Returns an id for [`remove_detach_hook`](Node::remove_detach_hook).
    pub fn on_detach(&self, f: impl Fn() + 'static) -> u64 {
        let id = NEXT_HOOK_ID.with(|next| {
            let id = next.get();
            next.set(id + 1);
            id
        });
        self.0.detach_hooks.borrow_mut().push((id, Rc::new(f)));
        id
    }

    pub fn remove_detach_hook(&self, id: u64) {
        self.0.detach_hooks.borrow_mut().retain(|(hook, _)| *hook != id);
    }

    fn fire_detach_hooks(&self) {
        let mut hooks = Vec::new();
        self.collect_detach_hooks(&mut hooks);
        for hook in hooks {
            hook();
        }
    }

    fn collect_detach_hooks(&self, out: &mut Vec<DetachHook>) {
        out.extend(self.0.detach_hooks.borrow().iter().map(|(_, f)| f.clone()));
        for child in self.0.children.borrow().iter() {
            child.collect_detach_hooks(out);
        }
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Whether this element matches a simple selector: `tag`, `#id` or `.class`.
    pub fn matches(&self, selector: &str) -> bool {
        let Some(tag) = self.tag_name() else { return false };
        if let Some(id) = selector.strip_prefix('#') {
            return self.attribute("id").as_deref() == Some(id);
        }
        if let Some(class) = selector.strip_prefix('.') {
            return self
                .attribute("class")
                .is_some_and(|classes| classes.split_whitespace().any(|c| c == class));
        }
        tag.eq_ignore_ascii_case(selector)
    }

    /// First descendant (document order) matching `selector`.
    pub fn query_selector(&self, selector: &str) -> Option<Node> {
        for child in self.children() {
            if child.matches(selector) {
                return Some(child);
            }
            if let Some(found) = child.query_selector(selector) {
                return Some(found);
            }
        }
        None
    }

    /// Every descendant matching `selector`, in document order.
    pub fn query_selector_all(&self, selector: &str) -> Vec<Node> {
        let mut found = Vec::new();
        for child in self.children() {
            if child.matches(selector) {
                found.push(child.clone());
            }
            found.extend(child.query_selector_all(selector));
        }
        found
    }

    // =========================================================================
    // Serialization
    // =========================================================================

    /// Markup of this node including itself.
    pub fn outer_html(&self) -> String {
        let mut out = String::new();
        self.write_html(&mut out);
        out
    }

    /// Markup of the children.
    pub fn inner_html(&self) -> String {
        let mut out = String::new();
        for child in self.0.children.borrow().iter() {
            child.write_html(&mut out);
        }
        out
    }

    fn write_html(&self, out: &mut String) {
        match &self.0.kind {
            NodeKind::Text => {
                let text = self.0.text.borrow();
                let raw = self
                    .parent()
                    .is_some_and(|parent| matches!(parent.tag_name(), Some("style" | "script")));
                if raw {
                    out.push_str(&text);
                } else {
                    escape_into(out, &text, false);
                }
            }
            NodeKind::Document => out.push_str(&self.inner_html()),
            NodeKind::Element(tag) => {
                let _ = write!(out, "<{tag}");
                for (name, value) in self.0.attributes.borrow().iter() {
                    let _ = write!(out, " {name}=\"");
                    escape_into(out, value, true);
                    out.push('"');
                }
                out.push('>');
                out.push_str(&self.inner_html());
                let _ = write!(out, "</{tag}>");
            }
        }
    }
}

/// Escape markup characters. Attribute values escape `&` and `"`; text
/// escapes `&`, `<` and `>`.
fn escape_into(out: &mut String, value: &str, attribute: bool) {
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' if attribute => out.push_str("&quot;"),
            '<' if !attribute => out.push_str("&lt;"),
            '>' if !attribute => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0.kind {
            NodeKind::Document => f.write_str("#document"),
            NodeKind::Element(tag) => write!(f, "<{tag}> ({} children)", self.child_count()),
            NodeKind::Text => write!(f, "#text {:?}", self.0.text.borrow()),
        }
    }
}
