//! Component and module declarations.
//!
//! A component is an ordinary Rust type implementing [`Component`] (what the
//! template can see) and [`Injectable`] (how it is built). Its runtime state
//! (root node, disposers, child records) lives in the renderer's
//! [`Instance`] record; the component only keeps a [`ComponentHost`] handle
//! to reach it, for owned computeds and re-render scheduling.
//!
//! ```ignore
//! struct Counter {
//!     host: ComponentHost,
//!     count: Signal<Value>,
//! }
//!
//! impl Component for Counter {
//!     fn meta() -> ComponentMeta {
//!         ComponentMeta::new("app-counter")
//!             .template("<button (click)=\"increment()\">{{count}}</button>")
//!     }
//!     fn field(&self, name: &str) -> Option<Field> {
//!         (name == "count").then(|| self.count.clone().into())
//!     }
//!     fn call(&self, method: &str, _args: &[Value]) -> Option<Value> {
//!         (method == "increment").then(|| {
//!             self.count.update(|n| Value::from(n.to_number() + 1.0));
//!             Value::Null
//!         })
//!     }
//!     fn host(&self) -> Option<&ComponentHost> {
//!         Some(&self.host)
//!     }
//! }
//! ```

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::dom::Node;
use crate::engine::{Injectable, Injector, Instance};
use crate::signals::{Cleanup, Computed, Output, Signal};
use crate::types::Value;

// =============================================================================
// Component
// =============================================================================

/// A template-driven UI component.
///
/// Every method except [`meta`](Component::meta) has a default, so a purely
/// static component only declares its metadata.
pub trait Component: 'static {
    /// Selector, template and styles.
    fn meta() -> ComponentMeta
    where
        Self: Sized;

    /// A field visible to the template under `name`.
    fn field(&self, _name: &str) -> Option<Field> {
        None
    }

    /// Write an input that is not exposed as a writable signal field.
    /// Returns false when the component has no such input.
    fn set_field(&self, _name: &str, _value: Value) -> bool {
        false
    }

    /// Invoke a template-callable method. `None` when there is no such method.
    fn call(&self, _method: &str, _args: &[Value]) -> Option<Value> {
        None
    }

    /// An output channel the parent can bind with `(name)="…"`.
    fn output(&self, _name: &str) -> Option<Output<Value>> {
        None
    }

    /// Handle for owned computeds and re-render scheduling.
    fn host(&self) -> Option<&ComponentHost> {
        None
    }

    /// Called once the component has rendered for the first time.
    fn on_init(&self) {}

    /// Called when the mounted instance is destroyed.
    fn on_destroy(&self) {}
}

/// Static component metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComponentMeta {
    pub selector: String,
    /// Inline template. Takes precedence over `template_url`.
    pub template: Option<String>,
    pub template_url: Option<String>,
    /// Inline style sheets.
    pub styles: Vec<String>,
    pub style_urls: Vec<String>,
}

impl ComponentMeta {
    pub fn new(selector: impl Into<String>) -> Self {
        Self {
            selector: selector.into(),
            ..Self::default()
        }
    }

    pub fn template(mut self, template: impl Into<String>) -> Self {
        self.template = Some(template.into());
        self
    }

    pub fn template_url(mut self, url: impl Into<String>) -> Self {
        self.template_url = Some(url.into());
        self
    }

    pub fn style(mut self, css: impl Into<String>) -> Self {
        self.styles.push(css.into());
        self
    }

    pub fn style_url(mut self, url: impl Into<String>) -> Self {
        self.style_urls.push(url.into());
        self
    }
}

// =============================================================================
// Definitions & Modules
// =============================================================================

/// Builds (or fetches) the singleton for a component type.
pub type ComponentFactory = fn(&Injector) -> Rc<dyn Component>;

/// A registered component: metadata plus the factory resolving its singleton.
#[derive(Clone)]
pub struct ComponentDef {
    pub meta: Rc<ComponentMeta>,
    pub factory: ComponentFactory,
}

fn resolve<C: Component + Injectable>(injector: &Injector) -> Rc<dyn Component> {
    injector.inject::<C>()
}

impl ComponentDef {
    pub fn of<C: Component + Injectable>() -> Self {
        Self {
            meta: Rc::new(C::meta()),
            factory: resolve::<C>,
        }
    }

    pub fn selector(&self) -> &str {
        &self.meta.selector
    }
}

impl fmt::Debug for ComponentDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentDef").field("selector", &self.meta.selector).finish()
    }
}

/// A module: declared components, imported modules, bootstrap roots.
#[derive(Debug, Clone, Default)]
pub struct Module {
    pub declarations: Vec<ComponentDef>,
    pub imports: Vec<Module>,
    pub bootstrap: Vec<ComponentDef>,
}

impl Module {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn declare<C: Component + Injectable>(mut self) -> Self {
        self.declarations.push(ComponentDef::of::<C>());
        self
    }

    pub fn import(mut self, module: Module) -> Self {
        self.imports.push(module);
        self
    }

    /// Declare `C` and mount it as a root on bootstrap.
    pub fn bootstrap<C: Component + Injectable>(mut self) -> Self {
        self.bootstrap.push(ComponentDef::of::<C>());
        self
    }
}

/// A type that describes an application module.
pub trait NgModule {
    fn module() -> Module;
}

// =============================================================================
// Fields
// =============================================================================

/// What a component exposes to its template under a name.
///
/// Reading a signal or computed field from a template auto-unwraps it (and
/// subscribes the running effect).
#[derive(Clone)]
pub enum Field {
    Static(Value),
    /// Writable: `[input]` bindings set it directly.
    Signal(Signal<Value>),
    Computed(Computed<Value>),
    /// Computed on every read.
    Getter(Rc<dyn Fn() -> Value>),
}

impl Field {
    /// Expose a typed signal through a getter.
    pub fn from_signal<T: Clone + Into<Value> + 'static>(signal: &Signal<T>) -> Self {
        let signal = signal.clone();
        Field::Getter(Rc::new(move || signal.get().into()))
    }

    pub fn getter(f: impl Fn() -> Value + 'static) -> Self {
        Field::Getter(Rc::new(f))
    }

    /// Current value (tracked).
    pub fn read(&self) -> Value {
        match self {
            Field::Static(value) => value.clone(),
            Field::Signal(signal) => signal.get(),
            Field::Computed(computed) => computed.get(),
            Field::Getter(f) => f(),
        }
    }

    pub fn is_reactive(&self) -> bool {
        !matches!(self, Field::Static(_))
    }
}

impl fmt::Debug for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::Static(value) => f.debug_tuple("Static").field(value).finish(),
            Field::Signal(signal) => f.debug_tuple("Signal").field(signal).finish(),
            Field::Computed(computed) => f.debug_tuple("Computed").field(computed).finish(),
            Field::Getter(_) => f.write_str("Getter(..)"),
        }
    }
}

impl From<Value> for Field {
    fn from(value: Value) -> Self {
        Field::Static(value)
    }
}

impl From<Signal<Value>> for Field {
    fn from(signal: Signal<Value>) -> Self {
        Field::Signal(signal)
    }
}

impl From<Computed<Value>> for Field {
    fn from(computed: Computed<Value>) -> Self {
        Field::Computed(computed)
    }
}

// =============================================================================
// Component Host
// =============================================================================

struct HostInner {
    instance: RefCell<Weak<Instance>>,
    /// Disposers of owned computeds, run on application teardown.
    owned: RefCell<Vec<Cleanup>>,
}

/// A component's link to its mounted instance.
///
/// Cheap to clone. Components are singletons, so when the same component is
/// mounted in several places the host follows the most recent mount.
#[derive(Clone)]
pub struct ComponentHost {
    inner: Rc<HostInner>,
}

impl ComponentHost {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(HostInner {
                instance: RefCell::new(Weak::new()),
                owned: RefCell::new(Vec::new()),
            }),
        }
    }

    pub(crate) fn attach(&self, instance: &Rc<Instance>) {
        *self.inner.instance.borrow_mut() = Rc::downgrade(instance);
    }

    pub(crate) fn instance(&self) -> Option<Rc<Instance>> {
        self.inner.instance.borrow().upgrade()
    }

    /// Id of the mounted instance, `<selector>-<uuid>`.
    pub fn id(&self) -> Option<String> {
        self.instance().map(|instance| instance.id().to_string())
    }

    /// Root element of the mounted instance.
    pub fn root(&self) -> Option<Node> {
        self.instance().map(|instance| instance.root().clone())
    }

    pub fn is_mounted(&self) -> bool {
        self.instance().is_some_and(|instance| instance.is_live())
    }

    /// Queue a re-render of the mounted instance on the microtask queue.
    /// Does nothing while the component is not mounted.
    pub fn schedule_rerender(&self) {
        if let Some(instance) = self.instance() {
            instance.schedule_rerender();
        }
    }

    /// Keep `cleanup` until the application is torn down.
    pub fn own(&self, cleanup: Cleanup) {
        self.inner.owned.borrow_mut().push(cleanup);
    }

    pub fn owned_count(&self) -> usize {
        self.inner.owned.borrow().len()
    }

    pub(crate) fn dispose_owned(&self) {
        let owned = std::mem::take(&mut *self.inner.owned.borrow_mut());
        for cleanup in owned {
            cleanup();
        }
    }
}

impl Default for ComponentHost {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ComponentHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentHost")
            .field("instance", &self.id())
            .field("owned", &self.owned_count())
            .finish()
    }
}
