//! Application configuration.
//!
//! Defaults suit tests and embedded use; [`AppConfig::from_env`] reads the
//! `MINI_NG_*` variables for standalone runs.

use std::path::PathBuf;

use crate::error::ConfigError;

/// Directory `template_url` and `style_urls` are resolved against.
pub const ENV_ASSET_ROOT: &str = "MINI_NG_ASSET_ROOT";

/// `true`/`false`: call `prevent_default` on bound click events.
pub const ENV_PREVENT_CLICK_DEFAULT: &str = "MINI_NG_PREVENT_CLICK_DEFAULT";

/// Upper bound on tasks run by one `run_until_idle` call. A component that
/// re-schedules itself forever stops here instead of hanging the caller.
const DEFAULT_MAX_TASKS_PER_FLUSH: usize = 10_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub asset_root: PathBuf,
    pub prevent_click_default: bool,
    pub max_tasks_per_flush: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            asset_root: PathBuf::from("."),
            prevent_click_default: true,
            max_tasks_per_flush: DEFAULT_MAX_TASKS_PER_FLUSH,
        }
    }
}

impl AppConfig {
    /// Defaults overridden by the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by `lookup(key)`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(root) = lookup(ENV_ASSET_ROOT) {
            if root.trim().is_empty() {
                return Err(ConfigError::Empty { key: ENV_ASSET_ROOT });
            }
            config.asset_root = PathBuf::from(root);
        }

        if let Some(flag) = lookup(ENV_PREVENT_CLICK_DEFAULT) {
            config.prevent_click_default = parse_bool(ENV_PREVENT_CLICK_DEFAULT, &flag)?;
        }

        Ok(config)
    }

    pub fn with_asset_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.asset_root = root.into();
        self
    }
}

fn parse_bool(key: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidBool { key, value: value.to_string() }),
    }
}
