//! Component Registry - selector to component definition.
//!
//! Filled when a module is processed: its declarations, its bootstrap
//! components and, recursively, everything its imports declare. The
//! renderer resolves every hyphenated tag through it.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;

use crate::component::{ComponentDef, Module};
use crate::error::BootstrapError;

#[derive(Default)]
pub struct Registry {
    components: RefCell<HashMap<String, ComponentDef>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register one definition. A later registration of the same selector
    /// replaces the earlier one.
    pub fn register(&self, def: ComponentDef) -> Result<(), BootstrapError> {
        let selector = def.selector().trim().to_string();
        if selector.is_empty() {
            return Err(BootstrapError::MissingSelector);
        }
        let replaced = self.components.borrow_mut().insert(selector.clone(), def);
        if replaced.is_some() {
            tracing::debug!(%selector, "registry: selector re-registered");
        }
        Ok(())
    }

    /// Register everything `module` declares, imports first.
    /// Returns the number of definitions processed.
    pub fn register_module(&self, module: &Module) -> Result<usize, BootstrapError> {
        let mut count = 0;
        for import in &module.imports {
            count += self.register_module(import)?;
        }
        for def in module.declarations.iter().chain(&module.bootstrap) {
            self.register(def.clone())?;
            count += 1;
        }
        Ok(count)
    }

    pub fn get(&self, selector: &str) -> Option<ComponentDef> {
        self.components.borrow().get(selector).cloned()
    }

    pub fn contains(&self, selector: &str) -> bool {
        self.components.borrow().contains_key(selector)
    }

    pub fn len(&self) -> usize {
        self.components.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.borrow().is_empty()
    }

    /// Registered selectors, sorted.
    pub fn selectors(&self) -> Vec<String> {
        let mut selectors: Vec<String> = self.components.borrow().keys().cloned().collect();
        selectors.sort();
        selectors
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry").field("selectors", &self.selectors()).finish()
    }
}
