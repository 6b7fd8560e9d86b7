//! Error types.
//!
//! Parse errors ([`TemplateError`]) and evaluation errors ([`EvalError`])
//! live next to the code that raises them; this module holds the errors of
//! loading, bootstrap and configuration plus the crate-level [`Error`].

use std::io;

use thiserror::Error;

pub use crate::renderer::EvalError;
pub use crate::template::TemplateError;

/// A component's template or styles could not be produced.
///
/// The mount of that component is abandoned; its subtree stays empty.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("resource `{url}` not found")]
    NotFound { url: String },

    #[error("failed to read `{url}`")]
    Io {
        url: String,
        #[source]
        source: io::Error,
    },

    #[error("template of <{selector}> does not parse")]
    Template {
        selector: String,
        #[source]
        source: TemplateError,
    },
}

/// Bootstrap refused to start. Returned before anything is mounted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BootstrapError {
    #[error("module declares no bootstrap component")]
    NoBootstrapComponents,

    #[error("component has an empty selector")]
    MissingSelector,

    #[error("no host element matches selector `{selector}`")]
    HostNotFound { selector: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid value `{value}` for {key}, expected a boolean")]
    InvalidBool { key: &'static str, value: String },

    #[error("{key} must not be empty")]
    Empty { key: &'static str },
}

/// Any error surfaced by the crate.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error(transparent)]
    Eval(#[from] EvalError),

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Bootstrap(#[from] BootstrapError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
