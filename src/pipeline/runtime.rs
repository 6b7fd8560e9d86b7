//! Per-application state shared by the renderer and every instance.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use super::loader::{ResourceLoader, TemplateCache};
use super::scheduler::Scheduler;
use super::styles::StyleManager;
use crate::config::AppConfig;
use crate::dom::Document;
use crate::engine::{Injector, Instance, Registry};

/// Everything one application owns. Instances hold it weakly.
pub(crate) struct Runtime {
    pub document: Document,
    pub config: AppConfig,
    pub injector: Injector,
    pub registry: Registry,
    pub scheduler: Scheduler,
    pub templates: TemplateCache,
    pub styles: StyleManager,
    pub roots: RefCell<Vec<Rc<Instance>>>,
}

impl Runtime {
    pub fn new(document: Document, config: AppConfig, loader: Box<dyn ResourceLoader>) -> Self {
        Self {
            styles: StyleManager::new(document.head().clone()),
            scheduler: Scheduler::new(config.max_tasks_per_flush),
            templates: TemplateCache::new(loader),
            injector: Injector::new(),
            registry: Registry::new(),
            roots: RefCell::new(Vec::new()),
            document,
            config,
        }
    }
}

impl fmt::Debug for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("components", &self.registry.len())
            .field("singletons", &self.injector.len())
            .field("roots", &self.roots.borrow().len())
            .field("pending", &self.scheduler.pending())
            .finish()
    }
}
