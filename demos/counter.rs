//! Counter demo: a root component with a nested display component.
//!
//! Run with `cargo run --example counter`. Mounts and re-renders are logged
//! through `tracing`.

use std::rc::Rc;

use mini_ng::{
    computed, signal, App, AppConfig, Component, ComponentHost, ComponentMeta, Computed, Document,
    Event, Field, Injectable, Injector, Module, Signal, Value,
};

/// Shared counter state.
struct CounterStore {
    count: Signal<Value>,
}

impl Injectable for CounterStore {
    fn create(_: &Injector) -> Self {
        CounterStore { count: signal(Value::from(0)) }
    }
}

struct CountBadge {
    value: Signal<Value>,
}

impl Component for CountBadge {
    fn meta() -> ComponentMeta {
        ComponentMeta::new("count-badge")
            .template("<span class=\"badge\">{{ value }}</span>")
            .style(".badge { font-weight: bold }")
    }
    fn field(&self, name: &str) -> Option<Field> {
        (name == "value").then(|| self.value.clone().into())
    }
}

impl Injectable for CountBadge {
    fn create(_: &Injector) -> Self {
        CountBadge { value: signal(Value::Null) }
    }
}

struct AppCounter {
    host: ComponentHost,
    store: Rc<CounterStore>,
    parity: Computed<Value>,
}

impl Component for AppCounter {
    fn meta() -> ComponentMeta {
        ComponentMeta::new("app-counter").template(
            r#"<h1>Counter</h1>
<count-badge [value]="count"></count-badge>
<p>{{ parity }}</p>
<button (click)="increment()">+1</button>
@if (count >= 3) { <em>three or more</em> }"#,
        )
    }

    fn field(&self, name: &str) -> Option<Field> {
        match name {
            "count" => Some(self.store.count.clone().into()),
            "parity" => Some(self.parity.clone().into()),
            _ => None,
        }
    }

    fn call(&self, method: &str, _args: &[Value]) -> Option<Value> {
        (method == "increment").then(|| {
            self.store.count.update(|n| Value::from(n.to_number() + 1.0));
            Value::Null
        })
    }

    fn host(&self) -> Option<&ComponentHost> {
        Some(&self.host)
    }

    fn on_init(&self) {
        tracing::info!(id = ?self.host.id(), "counter ready");
    }
}

impl Injectable for AppCounter {
    fn create(injector: &Injector) -> Self {
        let host = ComponentHost::new();
        let store = injector.inject::<CounterStore>();
        let count = store.count.clone();
        let parity = computed(
            move || Value::from(if count.get().to_number() % 2.0 == 0.0 { "even" } else { "odd" }),
            Some(&host),
        );
        AppCounter { host, store, parity }
    }
}

fn main() -> mini_ng::Result<()> {
    tracing_subscriber::fmt::init();

    let document = Document::new();
    document.body().append_child(&document.create_element("app-counter"));

    let app = App::new(document, AppConfig::from_env()?);
    app.bootstrap(&Module::new().declare::<CountBadge>().bootstrap::<AppCounter>())?;
    app.run_until_idle();
    println!("{}", app.document().body().inner_html());

    let Some(button) = app.document().query_selector("button") else {
        tracing::error!("counter did not render");
        return Ok(());
    };
    for _ in 0..3 {
        button.dispatch_event(&Event::new("click"));
        app.run_until_idle();
    }
    println!("{}", app.document().body().inner_html());

    app.destroy();
    Ok(())
}
