//! Host tree - the in-memory document components render into.
//!
//! The renderer only talks to this model: it creates elements and text
//! nodes, writes attributes and properties, registers listeners and
//! watches for detachment of mounted roots. An embedder can mirror the
//! tree into a real UI or inspect it with [`Node::outer_html`].

mod document;
mod event;
mod node;

pub use document::Document;
pub use event::Event;
pub use node::{DetachHook, EventCallback, Node, NodeKind, WeakNode};
