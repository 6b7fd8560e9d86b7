//! Render Primitives - the building blocks the renderer dispatches to.
//!
//! - [`element`] - plain elements with bindings, and nested component hosts
//! - [`control_flow`] - `@if` and `@for` blocks
//!
//! # Bindings and cleanup
//!
//! Every live binding a primitive creates hands its disposer to an
//! [`Instance`](crate::engine::Instance):
//!
//! - `[prop]` effects on plain elements go to the owning instance's effect
//!   disposers, run on its next re-render.
//! - `[input]` effects and `(output)` subscriptions go to the child
//!   instance's input disposers, run when the child is destroyed.
//!
//! Event listeners live on the host nodes and go away with them.

pub(crate) mod control_flow;
pub(crate) mod element;
