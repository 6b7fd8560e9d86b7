//! Application API - bootstrap, task loop and teardown.
//!
//! # Example
//!
//! ```ignore
//! use mini_ng::{App, AppConfig, Document, Module};
//!
//! let document = Document::new();
//! document.body().append_child(&document.create_element("app-root"));
//!
//! let app = App::new(document, AppConfig::from_env()?);
//! app.bootstrap(&Module::new().bootstrap::<AppRoot>())?;
//!
//! // Nested mounts, deferred re-renders and `on_init` run as queued tasks.
//! app.run_until_idle();
//!
//! // Detach every root and tear the application down.
//! app.destroy();
//! ```

use std::fmt;
use std::rc::Rc;

use super::loader::{FsLoader, ResourceLoader};
use super::runtime::Runtime;
use super::scheduler::Scheduler;
use crate::component::{ComponentDef, Module, NgModule};
use crate::config::AppConfig;
use crate::dom::{Document, Node};
use crate::engine::{Injectable, Injector, Instance, InstanceFlags, Registry};
use crate::error::BootstrapError;
use crate::renderer::render_instance;

// =============================================================================
// App
// =============================================================================

/// A running application: one document, one injector, one registry and one
/// task queue. Several apps can coexist on the same thread.
///
/// Dropping the app destroys it.
pub struct App {
    runtime: Rc<Runtime>,
}

impl App {
    /// An app loading `template_url`/`style_urls` from `config.asset_root`.
    pub fn new(document: Document, config: AppConfig) -> Self {
        let loader = FsLoader::new(config.asset_root.clone());
        Self::with_loader(document, config, Box::new(loader))
    }

    pub fn with_loader(document: Document, config: AppConfig, loader: Box<dyn ResourceLoader>) -> Self {
        Self { runtime: Rc::new(Runtime::new(document, config, loader)) }
    }

    pub fn document(&self) -> &Document {
        &self.runtime.document
    }

    pub fn config(&self) -> &AppConfig {
        &self.runtime.config
    }

    pub fn injector(&self) -> &Injector {
        &self.runtime.injector
    }

    /// The app's singleton for `T`.
    pub fn inject<T: Injectable>(&self) -> Rc<T> {
        self.runtime.injector.inject::<T>()
    }

    pub fn registry(&self) -> &Registry {
        &self.runtime.registry
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.runtime.scheduler
    }

    /// Mounted roots, in bootstrap order.
    pub fn roots(&self) -> Vec<Rc<Instance>> {
        self.runtime.roots.borrow().clone()
    }

    // =========================================================================
    // Bootstrap
    // =========================================================================

    /// Register `module` and mount its bootstrap components.
    ///
    /// Nothing mounts unless the module has bootstrap components with
    /// non-empty selectors that all match a host element. A root whose
    /// template or styles fail to load is logged and skipped.
    pub fn bootstrap(&self, module: &Module) -> Result<Vec<Rc<Instance>>, BootstrapError> {
        if module.bootstrap.is_empty() {
            return Err(BootstrapError::NoBootstrapComponents);
        }
        let hosts = module
            .bootstrap
            .iter()
            .map(|def| self.find_host(def))
            .collect::<Result<Vec<_>, _>>()?;
        let registered = self.runtime.registry.register_module(module)?;
        tracing::debug!(registered, roots = hosts.len(), "bootstrapping module");

        Ok(module
            .bootstrap
            .iter()
            .zip(hosts)
            .filter_map(|(def, host)| self.mount_root(def.clone(), host))
            .collect())
    }

    /// [`bootstrap`](App::bootstrap) the module `M` describes.
    pub fn bootstrap_module<M: NgModule>(&self) -> Result<Vec<Rc<Instance>>, BootstrapError> {
        self.bootstrap(&M::module())
    }

    fn find_host(&self, def: &ComponentDef) -> Result<Node, BootstrapError> {
        let selector = def.selector().trim();
        if selector.is_empty() {
            return Err(BootstrapError::MissingSelector);
        }
        self.runtime
            .document
            .query_selector(selector)
            .ok_or_else(|| BootstrapError::HostNotFound { selector: selector.to_string() })
    }

    fn mount_root(&self, def: ComponentDef, host: Node) -> Option<Rc<Instance>> {
        let runtime = &self.runtime;
        let component = (def.factory)(&runtime.injector);
        let loaded = match runtime.templates.load_component(&def.meta) {
            Ok(loaded) => loaded,
            Err(error) => {
                tracing::error!(component = def.selector(), %error, "root mount failed");
                return None;
            }
        };

        let instance = Instance::new(def, component, host.clone(), runtime);
        instance.insert_flags(InstanceFlags::IS_ROOT);
        if runtime.styles.add(instance.id(), &loaded.styles) {
            instance.insert_flags(InstanceFlags::STYLED);
        }
        instance.set_template(loaded.template.clone());
        render_instance(&instance, &loaded.template);

        let target = Rc::downgrade(&instance);
        runtime.scheduler.set_timeout(move || {
            if let Some(instance) = target.upgrade() {
                if !instance.is_destroyed() {
                    instance.component().on_init();
                }
            }
        });

        let target = Rc::downgrade(&instance);
        host.on_detach(move || {
            if let Some(instance) = target.upgrade() {
                instance.destroy(true);
            }
        });

        runtime.roots.borrow_mut().push(instance.clone());
        tracing::info!(id = instance.id(), "root mounted");
        Some(instance)
    }

    // =========================================================================
    // Task Loop
    // =========================================================================

    /// Run queued tasks until both queues are empty. Returns the number of
    /// tasks run.
    pub fn run_until_idle(&self) -> usize {
        self.runtime.scheduler.run_until_idle()
    }

    // =========================================================================
    // Teardown
    // =========================================================================

    /// Detach every mounted root from the document, tearing each one down.
    pub fn destroy(&self) {
        let roots = std::mem::take(&mut *self.runtime.roots.borrow_mut());
        for root in roots {
            root.root().remove();
            root.destroy(true);
        }
    }
}

impl Drop for App {
    fn drop(&mut self) {
        self.destroy();
    }
}

impl fmt::Debug for App {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("App").field(&self.runtime).finish()
    }
}
