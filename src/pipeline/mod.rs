//! Application pipeline
//!
//! Everything an application owns outside the component tree itself:
//!
//! ```text
//! App::bootstrap ─▶ Registry ─▶ TemplateCache (ResourceLoader) ─▶ render ─▶ StyleManager
//!                                         ▲                          │
//!                                         └──── Scheduler tasks ◀────┘
//! ```
//!
//! - **scheduler** - microtask and timer queues driven by `run_until_idle`
//! - **loader** - template and style retrieval plus the parsed-template cache
//! - **styles** - per-instance `<style>` elements in the document head
//! - **mount** - the [`App`] entry point

pub mod loader;
pub mod mount;
mod runtime;
pub mod scheduler;
pub mod styles;

pub use loader::{FsLoader, LoadedComponent, MemoryLoader, ResourceLoader, TemplateCache};
pub use mount::App;
pub(crate) use runtime::Runtime;
pub use scheduler::{Scheduler, Task};
pub use styles::StyleManager;
