//! Control Flow Primitives - `@if` and `@for` blocks.
//!
//! Both render eagerly into the parent: a condition or list change is picked
//! up by the next re-render of the owning instance, not by a live effect.
//!
//! ## @if
//! - Exactly one branch renders: the body when the condition is truthy,
//!   otherwise the `@else` branch (an `@else if` chain is a nested `If`).
//!
//! ## @for
//! - Each item renders the body in a child scope binding the item name and
//!   `$index`.
//! - `null` and non-list values count as an empty list (the latter warns).
//! - An empty list renders the `@empty` branch when there is one.
//! - Duplicate `track` keys are reported but still rendered.

use std::collections::HashSet;

use crate::dom::Node;
use crate::renderer::{evaluate, render_nodes, RenderContext, Scope};
use crate::template::{Expression, Token};
use crate::types::Value;

/// Render one branch of an `@if` block.
pub(crate) fn render_if(
    ctx: &RenderContext<'_>,
    condition: &Expression,
    children: &[Token],
    else_branch: Option<&[Token]>,
    scope: &Scope,
    parent: &Node,
) {
    if evaluate(condition, scope).is_truthy() {
        render_nodes(ctx, children, scope, parent);
    } else if let Some(otherwise) = else_branch {
        render_nodes(ctx, otherwise, scope, parent);
    }
}

/// The parts of a parsed `@for` block.
pub(crate) struct ForBlock<'a> {
    pub item: &'a str,
    pub list: &'a Expression,
    pub track: Option<&'a Expression>,
    pub children: &'a [Token],
    pub empty: Option<&'a [Token]>,
}

/// Render an `@for` block.
pub(crate) fn render_for(ctx: &RenderContext<'_>, block: ForBlock<'_>, scope: &Scope, parent: &Node) {
    let items = match evaluate(block.list, scope) {
        Value::List(items) => items,
        Value::Null => Default::default(),
        other => {
            tracing::warn!(
                list = block.list.source(),
                type_name = other.type_name(),
                "@for over a value that is not a list"
            );
            Default::default()
        }
    };

    if items.is_empty() {
        if let Some(empty) = block.empty {
            render_nodes(ctx, empty, scope, parent);
        }
        return;
    }

    let mut seen_keys = HashSet::new();
    for (index, item) in items.iter().enumerate() {
        let item_scope = scope.child(vec![
            (block.item.to_string(), item.clone()),
            ("$index".to_string(), Value::from(index)),
        ]);

        if let Some(track) = block.track {
            let key = format!("{:?}", evaluate(track, &item_scope));
            if !seen_keys.insert(key.clone()) {
                tracing::warn!(
                    track = track.source(),
                    %key,
                    index,
                    "@for: duplicate track key"
                );
            }
        }

        render_nodes(ctx, block.children, &item_scope, parent);
    }
}
