//! # mini-ng
//!
//! A miniature component UI framework: fine-grained signals, a small
//! template language, a type-keyed dependency injector and a component
//! lifecycle, rendering into an in-memory host tree.
//!
//! ## Architecture
//!
//! Components are plain Rust types. Their templates are parsed once into a
//! tree of tokens with compiled expressions, then rendered into the host
//! element the component is mounted on. Rendering is whole-subtree:
//! events, output emissions, input changes and owned computeds re-render the
//! affected instance from its template.
//!
//! ```text
//! Module ─▶ App::bootstrap ─▶ Registry ─▶ Injector ─▶ Instance ─▶ render ─▶ Document
//!                                                        ▲                     │
//!                                       signals / events / scheduler ◀─────────┘
//! ```
//!
//! ## Modules
//!
//! - [`signals`] - signals, effects, computeds, outputs
//! - [`template`] - template parser and expression compiler
//! - [`renderer`] - scope chain, expression evaluator, render pass
//! - [`engine`] - injector, registry, instance records
//! - [`pipeline`] - application, scheduler, loaders, styles
//! - [`dom`] - the host tree

pub mod component;
pub mod config;
pub mod dom;
pub mod engine;
pub mod error;
pub mod pipeline;
mod primitives;
pub mod renderer;
pub mod signals;
pub mod template;
pub mod types;

pub use types::Value;

pub use signals::{
    computed, effect, signal, to_observable, untrack, Cleanup, Computed, Observable,
    ObservableSubscription, Output, Signal,
};

pub use component::{
    Component, ComponentDef, ComponentHost, ComponentMeta, Field, Module, NgModule,
};

pub use engine::{Injectable, Injector, Instance, InstanceFlags, Registry};

pub use pipeline::{App, FsLoader, MemoryLoader, ResourceLoader, Scheduler};

pub use config::AppConfig;

pub use dom::{Document, Event, Node};

pub use template::{parse, Template};

pub use error::{BootstrapError, ConfigError, Error, EvalError, LoadError, Result, TemplateError};
