//! Element Primitive - plain elements and nested component hosts.
//!
//! A plain element gets its static attributes, its children, then its
//! bindings: `[prop]` becomes an effect writing the element property and
//! `(event)` a listener that runs the handler and re-renders the owner.
//!
//! A tag found in the registry becomes a component host instead:
//!
//! ```text
//! injector ─▶ singleton ─▶ Instance ─┬─ [input]  effect ─▶ child field ─▶ deferred rerender
//!                                    ├─ (output) subscribe ─▶ parent handler ─▶ parent rerender
//!                                    └─ timer task: load ─▶ styles ─▶ render ─▶ on_init
//! ```

use std::rc::Rc;

use crate::component::{ComponentDef, Field};
use crate::dom::Node;
use crate::engine::{Instance, InstanceFlags};
use crate::renderer::{evaluate, render_instance, render_nodes, run_handler, RenderContext, Scope};
use crate::signals::{effect, untrack};
use crate::template::{Attribute, Expression, Segment, Token};
use crate::types::Value;

pub(crate) fn render_element(
    ctx: &RenderContext<'_>,
    tag: &str,
    attributes: &[Attribute],
    children: &[Token],
    is_component: bool,
    scope: &Scope,
    parent: &Node,
) {
    let element = ctx.runtime.document.create_element(tag);
    parent.append_child(&element);

    for attribute in attributes {
        if let Attribute::Static { name, value } = attribute {
            element.set_attribute(name, interpolate(value, scope));
        }
    }

    render_nodes(ctx, children, scope, &element);

    let def = if is_component {
        let def = ctx.runtime.registry.get(tag);
        if def.is_none() {
            tracing::warn!(tag, "unknown component, rendering as a plain element");
        }
        def
    } else {
        None
    };

    match def {
        Some(def) => mount_component(ctx, def, attributes, scope, &element),
        None => {
            for attribute in attributes {
                match attribute {
                    Attribute::Static { .. } => {}
                    Attribute::Property { name, value } => bind_property(ctx, &element, name, value, scope),
                    Attribute::Event { name, handler } => listen(ctx, &element, name, handler, scope),
                }
            }
        }
    }
}

/// Concatenate the segments of a static attribute value.
fn interpolate(segments: &[Segment], scope: &Scope) -> String {
    segments
        .iter()
        .map(|segment| match segment {
            Segment::Literal(text) => text.clone(),
            Segment::Expr(expr) => evaluate(expr, scope).to_string(),
        })
        .collect()
}

fn bind_property(ctx: &RenderContext<'_>, element: &Node, name: &str, value: &Expression, scope: &Scope) {
    let element = element.clone();
    let name = name.to_string();
    let value = value.clone();
    let scope = scope.clone();
    let dispose = effect(move || element.set_property(&name, evaluate(&value, &scope)));
    ctx.instance.push_effect_disposer(dispose);
}

/// DOM listener: run the handler, then re-render the owning instance.
fn listen(ctx: &RenderContext<'_>, element: &Node, name: &str, handler: &Expression, scope: &Scope) {
    let owner = Rc::downgrade(ctx.instance);
    let prevent_click_default = ctx.runtime.config.prevent_click_default;
    let handler = handler.clone();
    let scope = scope.clone();
    element.add_event_listener(name, move |event| {
        if prevent_click_default && event.kind() == "click" {
            event.prevent_default();
        }
        run_handler(&handler, &scope, Value::Event(event.clone()));
        if let Some(owner) = owner.upgrade() {
            owner.rerender();
        }
    });
}

// =============================================================================
// Nested Components
// =============================================================================

fn mount_component(
    ctx: &RenderContext<'_>,
    def: ComponentDef,
    attributes: &[Attribute],
    scope: &Scope,
    element: &Node,
) {
    let component = (def.factory)(&ctx.runtime.injector);
    let child = Instance::new(def, component, element.clone(), ctx.runtime);
    ctx.instance.add_child(child.clone());

    for attribute in attributes {
        match attribute {
            Attribute::Static { .. } => {}
            Attribute::Property { name, value } => bind_input(&child, name, value, scope),
            Attribute::Event { name, handler } => {
                if !bind_output(ctx, &child, name, handler, scope) {
                    listen(ctx, element, name, handler, scope);
                }
            }
        }
    }

    queue_mount(ctx, &child);
}

/// `[name]="expr"` on a component: keep the child's input in sync with the
/// parent expression.
fn bind_input(child: &Rc<Instance>, name: &str, value: &Expression, scope: &Scope) {
    let target = Rc::downgrade(child);
    let name = name.to_string();
    let value = value.clone();
    let scope = scope.clone();
    let dispose = effect(move || {
        let next = evaluate(&value, &scope);
        let Some(child) = target.upgrade() else { return };
        untrack(|| write_input(&child, &name, next));
        child.defer_rerender();
    });
    child.push_input_disposer(dispose);
}

fn write_input(child: &Instance, name: &str, value: Value) {
    let component = child.component();
    match component.field(name) {
        Some(Field::Signal(signal)) => signal.set(value),
        _ => {
            if !component.set_field(name, value) {
                tracing::warn!(component = child.selector(), input = name, "unknown input");
            }
        }
    }
}

/// `(name)="handler"` on a component. Returns false when the component has
/// no such output.
fn bind_output(
    ctx: &RenderContext<'_>,
    child: &Rc<Instance>,
    name: &str,
    handler: &Expression,
    scope: &Scope,
) -> bool {
    let Some(output) = child.component().output(name) else {
        tracing::warn!(
            component = child.selector(),
            output = name,
            "unknown output, listening for a host event instead"
        );
        return false;
    };
    let owner = Rc::downgrade(ctx.instance);
    let handler = handler.clone();
    let scope = scope.clone();
    let dispose = output.subscribe(move |value| {
        run_handler(&handler, &scope, value.clone());
        if let Some(owner) = owner.upgrade() {
            owner.rerender();
        }
    });
    child.push_input_disposer(dispose);
    true
}

/// Queue the asynchronous part of a nested mount on the timer queue.
fn queue_mount(ctx: &RenderContext<'_>, child: &Rc<Instance>) {
    let target = Rc::downgrade(child);
    ctx.runtime.scheduler.set_timeout(move || {
        let Some(child) = target.upgrade() else { return };
        let Some(runtime) = child.runtime() else { return };

        let loaded = match runtime.templates.load_component(&child.def().meta) {
            Ok(loaded) => loaded,
            Err(error) => {
                tracing::error!(component = child.selector(), %error, "component mount failed");
                return;
            }
        };
        if child.is_destroyed() {
            tracing::debug!(id = child.id(), "mount skipped: instance destroyed");
            return;
        }

        if runtime.styles.add(child.id(), &loaded.styles) {
            child.insert_flags(InstanceFlags::STYLED);
        }
        child.set_template(loaded.template.clone());
        render_instance(&child, &loaded.template);
        child.component().on_init();
        child.defer_rerender();
        tracing::debug!(id = child.id(), "component mounted");
    });
}
