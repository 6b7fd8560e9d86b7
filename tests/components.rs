//! Nested components, lifecycle hooks, styles and resource loading.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use mini_ng::{
    computed, signal, App, AppConfig, Component, ComponentHost, ComponentMeta, Computed, Document,
    Event, Field, Injectable, Injector, MemoryLoader, Module, Output, Signal, Value,
};

fn document_with(selector: &str) -> Document {
    let document = Document::new();
    document.body().append_child(&document.create_element(selector));
    document
}

/// Lifecycle calls, shared by every component of one app.
#[derive(Default)]
struct Journal {
    entries: RefCell<Vec<String>>,
}

impl Journal {
    fn log(&self, entry: impl Into<String>) {
        self.entries.borrow_mut().push(entry.into());
    }

    fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.entries.borrow_mut())
    }
}

impl Injectable for Journal {
    fn create(_: &Injector) -> Self {
        Journal::default()
    }
}

// =============================================================================
// Parent / child
// =============================================================================

struct Choice {
    journal: Rc<Journal>,
    label: Signal<Value>,
    picked: Output<Value>,
}

impl Component for Choice {
    fn meta() -> ComponentMeta {
        ComponentMeta::new("app-choice").template("<button (click)=\"pick()\">{{label}}</button>")
    }
    fn field(&self, name: &str) -> Option<Field> {
        (name == "label").then(|| self.label.clone().into())
    }
    fn call(&self, method: &str, _args: &[Value]) -> Option<Value> {
        (method == "pick").then(|| {
            let label = self.label.get_untracked();
            self.picked.emit(Value::from(format!("{label}!")));
            Value::Null
        })
    }
    fn output(&self, name: &str) -> Option<Output<Value>> {
        (name == "picked").then(|| self.picked.clone())
    }
    fn on_init(&self) {
        self.journal.log("choice init");
    }
    fn on_destroy(&self) {
        self.journal.log("choice destroy");
    }
}

impl Injectable for Choice {
    fn create(injector: &Injector) -> Self {
        Choice {
            journal: injector.inject::<Journal>(),
            label: signal(Value::Null),
            picked: Output::new(),
        }
    }
}

struct Quiz {
    journal: Rc<Journal>,
    title: Signal<Value>,
    last: Signal<Value>,
}

impl Component for Quiz {
    fn meta() -> ComponentMeta {
        ComponentMeta::new("app-quiz").template(
            "<h1>{{title}}</h1><app-choice [label]=\"title\" (picked)=\"onPicked($event)\"></app-choice><p>{{last}}</p>",
        )
    }
    fn field(&self, name: &str) -> Option<Field> {
        match name {
            "title" => Some(self.title.clone().into()),
            "last" => Some(self.last.clone().into()),
            _ => None,
        }
    }
    fn call(&self, method: &str, args: &[Value]) -> Option<Value> {
        (method == "onPicked").then(|| {
            self.last.set(args.first().cloned().unwrap_or_default());
            Value::Null
        })
    }
    fn on_init(&self) {
        self.journal.log("quiz init");
    }
    fn on_destroy(&self) {
        self.journal.log("quiz destroy");
    }
}

impl Injectable for Quiz {
    fn create(injector: &Injector) -> Self {
        Quiz {
            journal: injector.inject::<Journal>(),
            title: signal(Value::from("Quiz")),
            last: signal(Value::Null),
        }
    }
}

fn quiz_app() -> App {
    let app = App::with_loader(
        document_with("app-quiz"),
        AppConfig::default(),
        Box::new(MemoryLoader::new()),
    );
    let module = Module::new().declare::<Choice>().bootstrap::<Quiz>();
    app.bootstrap(&module).unwrap();
    app
}

#[test]
fn test_nested_component_mounts_on_the_timer_queue() {
    let app = quiz_app();
    let choice = app.document().query_selector("app-choice").unwrap();
    assert_eq!(choice.child_count(), 0, "nested mount is deferred");

    app.run_until_idle();
    assert_eq!(choice.inner_html(), "<button>Quiz</button>");
    assert_eq!(app.inject::<Journal>().take(), ["choice init", "quiz init"]);
    assert_eq!(app.roots()[0].children().len(), 1);
}

#[test]
fn test_input_changes_rerender_the_child() {
    let app = quiz_app();
    app.run_until_idle();

    app.inject::<Quiz>().title.set(Value::from("Rust"));
    assert_eq!(app.inject::<Choice>().label.get_untracked(), Value::from("Rust"));

    app.run_until_idle();
    let button = app.document().query_selector("button").unwrap();
    assert_eq!(button.text_content(), "Rust");
}

#[test]
fn test_output_runs_parent_handler_and_rerenders_parent() {
    let app = quiz_app();
    app.run_until_idle();
    let journal = app.inject::<Journal>();
    journal.take();

    let button = app.document().query_selector("button").unwrap();
    button.dispatch_event(&Event::new("click"));

    let paragraph = app.document().query_selector("p").unwrap();
    assert_eq!(paragraph.text_content(), "Quiz!");
    assert_eq!(journal.take(), ["choice destroy"], "parent re-render retires the child");

    app.run_until_idle();
    assert_eq!(journal.take(), ["choice init"]);
    let button = app.document().query_selector("button").unwrap();
    assert_eq!(button.text_content(), "Quiz");
    assert_eq!(app.inject::<Choice>().picked.listener_count(), 1);
}

#[test]
fn test_destroy_runs_hooks_once() {
    let app = quiz_app();
    app.run_until_idle();
    let journal = app.inject::<Journal>();
    journal.take();
    let root = app.roots()[0].clone();

    app.destroy();
    assert!(root.is_destroyed());
    assert!(app.roots().is_empty());
    assert_eq!(journal.take(), ["choice destroy", "quiz destroy"]);

    root.destroy(true);
    assert!(journal.take().is_empty());
    assert_eq!(app.inject::<Choice>().picked.listener_count(), 0);
    assert!(app.document().query_selector("app-quiz").is_none());
}

#[test]
fn test_detach_before_nested_mount_skips_it() {
    let app = quiz_app();
    let journal = app.inject::<Journal>();
    app.document().query_selector("app-quiz").unwrap().remove();

    app.run_until_idle();
    assert_eq!(journal.take(), ["quiz destroy"], "the unmounted child gets no destroy hook");
    assert_eq!(app.inject::<Choice>().picked.listener_count(), 0);
}

// =============================================================================
// Owned computeds
// =============================================================================

struct Tally {
    host: ComponentHost,
    count: Signal<Value>,
    doubled: Computed<Value>,
    renders: Cell<usize>,
}

impl Component for Tally {
    fn meta() -> ComponentMeta {
        ComponentMeta::new("app-tally").template("<p>{{doubled}}</p>{{ trace() }}")
    }
    fn field(&self, name: &str) -> Option<Field> {
        (name == "doubled").then(|| self.doubled.clone().into())
    }
    fn call(&self, method: &str, _args: &[Value]) -> Option<Value> {
        (method == "trace").then(|| {
            self.renders.set(self.renders.get() + 1);
            Value::Null
        })
    }
    fn host(&self) -> Option<&ComponentHost> {
        Some(&self.host)
    }
}

impl Injectable for Tally {
    fn create(_: &Injector) -> Self {
        let host = ComponentHost::new();
        let count = signal(Value::from(0));
        let source = count.clone();
        let doubled = computed(move || Value::from(source.get().to_number() * 2.0), Some(&host));
        Tally { host, count, doubled, renders: Cell::new(0) }
    }
}

#[test]
fn test_computed_writes_coalesce_into_one_rerender() {
    let app = App::with_loader(
        document_with("app-tally"),
        AppConfig::default(),
        Box::new(MemoryLoader::new()),
    );
    app.bootstrap(&Module::new().bootstrap::<Tally>()).unwrap();
    app.run_until_idle();
    let tally = app.inject::<Tally>();
    assert_eq!(tally.renders.get(), 1);
    assert_eq!(tally.host.owned_count(), 1);

    tally.count.set(Value::from(1));
    tally.count.set(Value::from(2));
    tally.count.set(Value::from(3));
    assert_eq!(app.scheduler().pending(), (1, 0));

    app.run_until_idle();
    assert_eq!(tally.renders.get(), 2);
    let paragraph = app.document().query_selector("p").unwrap();
    assert_eq!(paragraph.text_content(), "6");

    app.destroy();
    assert_eq!(tally.host.owned_count(), 0);
    tally.count.set(Value::from(4));
    assert!(app.scheduler().is_idle());
    assert_eq!(tally.doubled.get_untracked(), Value::from(6));
}

// =============================================================================
// Resources & styles
// =============================================================================

struct Card;

impl Component for Card {
    fn meta() -> ComponentMeta {
        ComponentMeta::new("app-card")
            .template_url("card.html")
            .style(".card { padding: 1em }")
            .style_url("card.css")
    }
}

impl Injectable for Card {
    fn create(_: &Injector) -> Self {
        Card
    }
}

#[test]
fn test_template_url_and_styles() {
    let loader = MemoryLoader::new()
        .with("card.html", "<div class=\"card\">{{ 'loaded' }}</div>")
        .with("card.css", ".card { color: red }");
    let app = App::with_loader(document_with("app-card"), AppConfig::default(), Box::new(loader));
    let roots = app.bootstrap(&Module::new().bootstrap::<Card>()).unwrap();

    let card = app.document().query_selector(".card").unwrap();
    assert_eq!(card.text_content(), "loaded");

    let style = app.document().head().query_selector("style").unwrap();
    assert_eq!(style.attribute("data-component").as_deref(), Some(roots[0].id()));
    assert_eq!(style.text_content(), ".card { padding: 1em }\n.card { color: red }");
    assert!(roots[0].id().starts_with("app-card-"));

    app.destroy();
    assert!(app.document().head().query_selector("style").is_none());
}

#[test]
fn test_missing_template_leaves_root_unmounted() {
    let app = App::with_loader(
        document_with("app-card"),
        AppConfig::default(),
        Box::new(MemoryLoader::new()),
    );
    let roots = app.bootstrap(&Module::new().bootstrap::<Card>()).unwrap();

    assert!(roots.is_empty());
    assert_eq!(app.document().query_selector("app-card").unwrap().child_count(), 0);
    assert!(app.registry().contains("app-card"));
}

struct Shell;

impl Component for Shell {
    fn meta() -> ComponentMeta {
        ComponentMeta::new("app-shell")
            .template("<app-missing title=\"x {{ 1 + 1 }}\">kept</app-missing><app-card></app-card>")
    }
}

impl Injectable for Shell {
    fn create(_: &Injector) -> Self {
        Shell
    }
}

#[test]
fn test_unknown_tag_renders_plain_and_failed_child_stays_empty() {
    let app = App::with_loader(
        document_with("app-shell"),
        AppConfig::default(),
        Box::new(MemoryLoader::new()),
    );
    app.bootstrap(&Module::new().declare::<Card>().bootstrap::<Shell>()).unwrap();
    app.run_until_idle();

    let missing = app.document().query_selector("app-missing").unwrap();
    assert_eq!(missing.outer_html(), "<app-missing title=\"x 2\">kept</app-missing>");
    let card = app.document().query_selector("app-card").unwrap();
    assert_eq!(card.child_count(), 0);
}
