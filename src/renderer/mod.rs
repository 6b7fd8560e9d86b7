//! Renderer - turns a parsed template into host nodes.
//!
//! Rendering is whole-subtree: every render of an instance disposes the
//! bindings and child instances of the previous render, clears the host
//! element and walks the template again.
//!
//! ```text
//! Template ─▶ render_nodes ─┬─ text / interpolation ─▶ text node
//!                           ├─ @if / @for ──────────▶ primitives::control_flow
//!                           └─ element ─────────────▶ primitives::element
//! ```
//!
//! Interpolations are evaluated untracked. Only `[prop]` and `[input]`
//! bindings are live effects; everything else changes through a re-render.

mod evaluate;
mod scope;

use std::rc::Rc;

pub use evaluate::{eval, evaluate, EvalError, Variables};
pub use scope::Scope;

use crate::dom::Node;
use crate::engine::{Instance, InstanceFlags};
use crate::pipeline::Runtime;
use crate::primitives::{control_flow, element};
use crate::signals::untrack;
use crate::template::{Expr, Expression, Template, Token};
use crate::types::Value;

/// What a render pass needs besides the scope: the instance that owns the
/// bindings and the application it belongs to.
pub(crate) struct RenderContext<'a> {
    pub instance: &'a Rc<Instance>,
    pub runtime: &'a Rc<Runtime>,
}

/// Render `template` into the instance's root element, replacing whatever
/// the previous render produced.
pub(crate) fn render_instance(instance: &Rc<Instance>, template: &Template) {
    let Some(runtime) = instance.runtime() else {
        tracing::debug!(id = instance.id(), "render skipped: application dropped");
        return;
    };
    untrack(|| {
        instance.reset_render_state(false);
        let ctx = RenderContext { instance, runtime: &runtime };
        let scope = Scope::root(instance.component().clone());
        render(&ctx, template.nodes(), &scope, instance.root());
        instance.insert_flags(InstanceFlags::MOUNTED);
    });
    tracing::trace!(id = instance.id(), "rendered");
}

/// Clear `host` and render `nodes` into it.
pub(crate) fn render(ctx: &RenderContext<'_>, nodes: &[Token], scope: &Scope, host: &Node) {
    host.clear_children();
    render_nodes(ctx, nodes, scope, host);
}

/// Append the rendering of `nodes` to `parent`.
pub(crate) fn render_nodes(ctx: &RenderContext<'_>, nodes: &[Token], scope: &Scope, parent: &Node) {
    for node in nodes {
        match node {
            Token::Text(text) => {
                if !text.trim().is_empty() {
                    parent.append_child(&Node::text(text.as_str()));
                }
            }
            Token::Interpolation(expr) => {
                let value = evaluate(expr, scope);
                parent.append_child(&Node::text(value.to_string()));
            }
            Token::Event(name) => {
                tracing::warn!(event = %name, "standalone event marker ignored");
            }
            Token::If { condition, children, else_branch } => {
                control_flow::render_if(ctx, condition, children, else_branch.as_deref(), scope, parent);
            }
            Token::For { item, list, track, children, empty } => {
                control_flow::render_for(
                    ctx,
                    control_flow::ForBlock {
                        item,
                        list,
                        track: track.as_ref(),
                        children,
                        empty: empty.as_deref(),
                    },
                    scope,
                    parent,
                );
            }
            Token::Element { tag, attributes, children, is_component } => {
                element::render_element(ctx, tag, attributes, children, *is_component, scope, parent);
            }
        }
    }
}

/// Run an event handler with `$event` bound.
///
/// A bare method name (`select`) or an empty call (`select()`) receives the
/// event as its only argument; any other expression is evaluated as written.
pub(crate) fn run_handler(handler: &Expression, scope: &Scope, event: Value) -> Value {
    let scope = scope.with_local("$event", event.clone());
    untrack(|| {
        let bare = match handler.root() {
            Expr::Ident(name) => Some(name),
            Expr::Call(name, args) if args.is_empty() => Some(name),
            _ => None,
        };
        if let Some(name) = bare {
            if let Some(result) = scope.context().call(name, std::slice::from_ref(&event)) {
                return result;
            }
        }
        evaluate(handler, &scope)
    })
}
