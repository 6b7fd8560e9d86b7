//! Engine - injector, component registry and instance records.
//!
//! - [`Injector`]: one singleton per type, built lazily with its dependencies
//! - [`Registry`]: selector → [`ComponentDef`](crate::component::ComponentDef)
//! - [`Instance`]: runtime record of one mounted component
//!
//! All three are owned by an [`App`](crate::pipeline::App); nothing here is
//! global, so several applications can live side by side.

mod injector;
mod instance;
mod registry;

pub use injector::{Injectable, Injector};
pub use instance::{Instance, InstanceFlags};
pub use registry::Registry;
