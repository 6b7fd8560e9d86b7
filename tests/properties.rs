//! End-to-end behaviour of signals, templates, events and teardown.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use mini_ng::{
    computed, effect, signal, App, AppConfig, Component, ComponentHost, ComponentMeta, Computed,
    Document, Event, Field, Injectable, Injector, MemoryLoader, Module, Signal, Value,
};

fn app_with_host(selector: &str) -> App {
    let document = Document::new();
    document.body().append_child(&document.create_element(selector));
    App::with_loader(document, AppConfig::default(), Box::new(MemoryLoader::new()))
}

fn texts(node: &mini_ng::Node) -> Vec<String> {
    node.children().iter().filter(|n| n.is_text()).map(|n| n.text_content()).collect()
}

// =============================================================================
// Signals
// =============================================================================

#[test]
fn test_subscriber_fires_only_on_change() {
    let count = signal(1);
    let calls = Rc::new(Cell::new(0));
    let seen = calls.clone();
    let _unsubscribe = count.subscribe(move |_| seen.set(seen.get() + 1));

    count.set(1);
    assert_eq!(calls.get(), 0);
    count.set(2);
    count.set(2);
    assert_eq!(calls.get(), 1);
}

#[test]
fn test_disposed_effect_never_runs_again() {
    let count = signal(0);
    let runs = Rc::new(Cell::new(0));
    let (source, seen) = (count.clone(), runs.clone());
    let dispose = effect(move || {
        source.get();
        seen.set(seen.get() + 1);
    });
    assert_eq!(runs.get(), 1, "runs once at creation");

    count.set(1);
    assert_eq!(runs.get(), 2);

    dispose();
    count.set(2);
    count.set(3);
    assert_eq!(runs.get(), 2);
}

// =============================================================================
// Rendering
// =============================================================================

struct Score {
    count: Signal<Value>,
    total: Computed<Value>,
}

impl Component for Score {
    fn meta() -> ComponentMeta {
        ComponentMeta::new("app-score").template("<p>{{count}}</p><p>{{total}}</p><p>{{missing}}</p>")
    }
    fn field(&self, name: &str) -> Option<Field> {
        match name {
            "count" => Some(self.count.clone().into()),
            "total" => Some(self.total.clone().into()),
            _ => None,
        }
    }
}

impl Injectable for Score {
    fn create(_: &Injector) -> Self {
        let count = signal(Value::from(3));
        let source = count.clone();
        let total = computed(move || Value::from(source.get().to_number()), None);
        Score { count, total }
    }
}

#[test]
fn test_interpolation_of_signal_and_computed() {
    let app = app_with_host("app-score");
    app.bootstrap(&Module::new().bootstrap::<Score>()).unwrap();

    let paragraphs = app.document().query_selector_all("p");
    let rendered: Vec<String> = paragraphs.iter().map(|p| p.text_content()).collect();
    assert_eq!(rendered, ["3", "3", ""]);
}

struct Toggle {
    active: Signal<Value>,
}

impl Component for Toggle {
    fn meta() -> ComponentMeta {
        ComponentMeta::new("app-toggle")
            .template("@if (active) { <b>on</b> } @else { <i>off</i> }")
    }
    fn field(&self, name: &str) -> Option<Field> {
        (name == "active").then(|| self.active.clone().into())
    }
    fn call(&self, method: &str, _args: &[Value]) -> Option<Value> {
        (method == "flip").then(|| {
            self.active.update(|v| Value::Bool(!v.is_truthy()));
            Value::Null
        })
    }
}

impl Injectable for Toggle {
    fn create(_: &Injector) -> Self {
        Toggle { active: signal(Value::Bool(true)) }
    }
}

#[test]
fn test_if_renders_exactly_one_branch() {
    let app = app_with_host("app-toggle");
    let roots = app.bootstrap(&Module::new().bootstrap::<Toggle>()).unwrap();
    let root = roots[0].root().clone();
    assert_eq!(root.inner_html(), "<b>on</b>");

    app.inject::<Toggle>().active.set(Value::Bool(false));
    roots[0].rerender();
    assert_eq!(root.inner_html(), "<i>off</i>");
}

struct Numbers {
    items: Signal<Value>,
}

impl Component for Numbers {
    fn meta() -> ComponentMeta {
        ComponentMeta::new("app-numbers")
            .template("@for (let i of items track i) { {{i}} } @empty { none }")
    }
    fn field(&self, name: &str) -> Option<Field> {
        (name == "items").then(|| self.items.clone().into())
    }
}

impl Injectable for Numbers {
    fn create(_: &Injector) -> Self {
        Numbers { items: signal(Value::list(Vec::<Value>::new())) }
    }
}

#[test]
fn test_for_renders_items_or_empty_branch() {
    let app = app_with_host("app-numbers");
    let roots = app.bootstrap(&Module::new().bootstrap::<Numbers>()).unwrap();
    let root = roots[0].root().clone();
    assert_eq!(texts(&root), ["none"]);

    app.inject::<Numbers>().items.set(Value::list([1, 2]));
    roots[0].rerender();
    assert_eq!(texts(&root), ["1", "2"]);
}

struct Headline;

impl Component for Headline {
    fn meta() -> ComponentMeta {
        ComponentMeta::new("app-headline").template(
            "<h1>Title</h1><p title=\"{{ a = 1 }}\">{{ 1 + 1 }}</p><button (click)=\"form.submit()\">go</button>",
        )
    }
}

impl Injectable for Headline {
    fn create(_: &Injector) -> Self {
        Headline
    }
}

#[test]
fn test_bad_binding_leaves_siblings_rendered() {
    let app = app_with_host("app-headline");
    let roots = app.bootstrap(&Module::new().bootstrap::<Headline>()).unwrap();
    assert_eq!(roots.len(), 1);
    let root = roots[0].root().clone();
    assert_eq!(root.inner_html(), "<h1>Title</h1><p title=\"\">2</p><button>go</button>");

    let button = app.document().query_selector("button").unwrap();
    button.dispatch_event(&Event::new("click"));
    app.run_until_idle();
    assert_eq!(root.inner_html(), "<h1>Title</h1><p title=\"\">2</p><button>go</button>");
}

// =============================================================================
// Events
// =============================================================================

struct Picker {
    items: Value,
    selected: RefCell<Vec<(Value, Value)>>,
    renders: Cell<usize>,
}

impl Component for Picker {
    fn meta() -> ComponentMeta {
        ComponentMeta::new("app-picker").template(
            "<ul>@for (let item of items) { <li><button (click)=\"select($event, $index)\">{{item}}</button></li> }</ul>{{ trace() }}",
        )
    }
    fn field(&self, name: &str) -> Option<Field> {
        (name == "items").then(|| Field::Static(self.items.clone()))
    }
    fn call(&self, method: &str, args: &[Value]) -> Option<Value> {
        match method {
            "select" => {
                self.selected.borrow_mut().push((args[0].clone(), args[1].clone()));
                Some(Value::Null)
            }
            "trace" => {
                self.renders.set(self.renders.get() + 1);
                Some(Value::Null)
            }
            _ => None,
        }
    }
}

impl Injectable for Picker {
    fn create(_: &Injector) -> Self {
        Picker {
            items: Value::list(["a", "b", "c"]),
            selected: RefCell::new(Vec::new()),
            renders: Cell::new(0),
        }
    }
}

#[test]
fn test_click_handler_gets_event_and_index_then_rerenders_once() {
    let app = app_with_host("app-picker");
    app.bootstrap(&Module::new().bootstrap::<Picker>()).unwrap();
    app.run_until_idle();
    let picker = app.inject::<Picker>();
    assert_eq!(picker.renders.get(), 1);

    let buttons = app.document().query_selector_all("button");
    assert_eq!(buttons.len(), 3);
    let click = Event::new("click");
    let not_prevented = buttons[1].dispatch_event(&click);
    app.run_until_idle();

    assert!(!not_prevented, "click default is prevented");
    let selected = picker.selected.borrow();
    assert_eq!(selected.len(), 1);
    let (event, index) = &selected[0];
    assert!(event.as_event().is_some_and(|e| e.ptr_eq(&click)));
    assert_eq!(*index, Value::from(1));
    assert_eq!(picker.renders.get(), 2, "exactly one re-render");
}

// =============================================================================
// Teardown
// =============================================================================

struct Profile {
    host: ComponentHost,
    name: Signal<Value>,
}

impl Component for Profile {
    fn meta() -> ComponentMeta {
        ComponentMeta::new("app-profile").template("<input [value]=\"name\">")
    }
    fn field(&self, name: &str) -> Option<Field> {
        (name == "name").then(|| self.name.clone().into())
    }
    fn host(&self) -> Option<&ComponentHost> {
        Some(&self.host)
    }
}

impl Injectable for Profile {
    fn create(_: &Injector) -> Self {
        Profile { host: ComponentHost::new(), name: signal(Value::from("ada")) }
    }
}

#[test]
fn test_detached_root_stops_updating_properties() {
    let app = app_with_host("app-profile");
    let roots = app.bootstrap(&Module::new().bootstrap::<Profile>()).unwrap();
    let profile = app.inject::<Profile>();
    let input = app.document().query_selector("input").unwrap();
    assert_eq!(input.property("value"), Some(Value::from("ada")));

    profile.name.set(Value::from("grace"));
    assert_eq!(input.property("value"), Some(Value::from("grace")));

    roots[0].root().remove();
    assert!(roots[0].is_destroyed());
    assert!(!profile.host.is_mounted());

    profile.name.set(Value::from("linus"));
    assert_eq!(input.property("value"), Some(Value::from("grace")));
    assert_eq!(profile.name.subscriber_count(), 0);
}

// =============================================================================
// Injection
// =============================================================================

struct Clock;

impl Injectable for Clock {
    fn create(_: &Injector) -> Self {
        Clock
    }
}

#[test]
fn test_inject_returns_same_singleton() {
    let app = app_with_host("app-none");
    let a = app.inject::<Clock>();
    let b = app.injector().inject::<Clock>();
    assert!(Rc::ptr_eq(&a, &b));
}
