//! Mounted instance records.
//!
//! One [`Instance`] per mount of a component: its root element, lifecycle
//! flags, cached template, binding disposers and live child instances. The
//! renderer and bootstrap own these records; user components never see them
//! except through their [`ComponentHost`](crate::component::ComponentHost).
//!
//! ```text
//! created ──render──▶ mounted ──rerender──▶ mounted ──destroy──▶ destroyed
//! ```

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use bitflags::bitflags;
use uuid::Uuid;

use crate::component::{Component, ComponentDef};
use crate::dom::Node;
use crate::pipeline::Runtime;
use crate::signals::Cleanup;
use crate::template::Template;

bitflags! {
    /// Lifecycle state of an instance.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct InstanceFlags: u8 {
        /// Rendered at least once.
        const MOUNTED = 1 << 0;
        /// Torn down. Terminal.
        const DESTROYED = 1 << 1;
        /// A microtask re-render is queued.
        const RERENDER_QUEUED = 1 << 2;
        /// Bootstrapped root (teardown also disposes owned computeds).
        const IS_ROOT = 1 << 3;
        /// Has a style sheet in the document head.
        const STYLED = 1 << 4;
    }
}

pub struct Instance {
    id: String,
    def: ComponentDef,
    root: Node,
    component: Rc<dyn Component>,
    flags: Cell<InstanceFlags>,
    template: RefCell<Option<Template>>,
    input_disposers: RefCell<Vec<Cleanup>>,
    effect_disposers: RefCell<Vec<Cleanup>>,
    children: RefCell<Vec<Rc<Instance>>>,
    runtime: Weak<Runtime>,
}

impl Instance {
    /// Create the record and point the component's host at it.
    pub(crate) fn new(
        def: ComponentDef,
        component: Rc<dyn Component>,
        root: Node,
        runtime: &Rc<Runtime>,
    ) -> Rc<Self> {
        let instance = Rc::new(Self {
            id: format!("{}-{}", def.selector(), Uuid::new_v4()),
            def,
            root,
            component,
            flags: Cell::new(InstanceFlags::empty()),
            template: RefCell::new(None),
            input_disposers: RefCell::new(Vec::new()),
            effect_disposers: RefCell::new(Vec::new()),
            children: RefCell::new(Vec::new()),
            runtime: Rc::downgrade(runtime),
        });
        if let Some(host) = instance.component.host() {
            host.attach(&instance);
        }
        instance
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// `<selector>-<uuid v4>`
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn selector(&self) -> &str {
        self.def.selector()
    }

    pub fn def(&self) -> &ComponentDef {
        &self.def
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    pub fn component(&self) -> &Rc<dyn Component> {
        &self.component
    }

    pub fn flags(&self) -> InstanceFlags {
        self.flags.get()
    }

    pub(crate) fn insert_flags(&self, flags: InstanceFlags) {
        self.flags.set(self.flags.get() | flags);
    }

    fn remove_flags(&self, flags: InstanceFlags) {
        self.flags.set(self.flags.get() - flags);
    }

    pub fn is_destroyed(&self) -> bool {
        self.flags().contains(InstanceFlags::DESTROYED)
    }

    pub fn is_root(&self) -> bool {
        self.flags().contains(InstanceFlags::IS_ROOT)
    }

    /// Mounted and not destroyed.
    pub fn is_live(&self) -> bool {
        self.flags().contains(InstanceFlags::MOUNTED) && !self.is_destroyed()
    }

    pub(crate) fn runtime(&self) -> Option<Rc<Runtime>> {
        self.runtime.upgrade()
    }

    pub(crate) fn template(&self) -> Option<Template> {
        self.template.borrow().clone()
    }

    pub(crate) fn set_template(&self, template: Template) {
        *self.template.borrow_mut() = Some(template);
    }

    pub fn children(&self) -> Vec<Rc<Instance>> {
        self.children.borrow().clone()
    }

    pub(crate) fn add_child(&self, child: Rc<Instance>) {
        self.children.borrow_mut().push(child);
    }

    pub(crate) fn push_input_disposer(&self, cleanup: Cleanup) {
        self.input_disposers.borrow_mut().push(cleanup);
    }

    pub(crate) fn push_effect_disposer(&self, cleanup: Cleanup) {
        self.effect_disposers.borrow_mut().push(cleanup);
    }

    pub fn effect_count(&self) -> usize {
        self.effect_disposers.borrow().len()
    }

    // =========================================================================
    // Rendering
    // =========================================================================

    /// Re-render the whole subtree now. No-op once destroyed or before a
    /// template is known.
    pub fn rerender(self: &Rc<Self>) {
        if self.is_destroyed() {
            tracing::debug!(id = %self.id, "rerender skipped: instance destroyed");
            return;
        }
        let Some(template) = self.template() else { return };
        crate::renderer::render_instance(self, &template);
    }

    /// Queue a re-render on the microtask queue. Requests made before it runs
    /// collapse into one.
    pub fn schedule_rerender(self: &Rc<Self>) {
        if !self.is_live() || self.flags().contains(InstanceFlags::RERENDER_QUEUED) {
            return;
        }
        let Some(runtime) = self.runtime() else { return };
        self.insert_flags(InstanceFlags::RERENDER_QUEUED);

        let weak = Rc::downgrade(self);
        runtime.scheduler.queue_microtask(move || {
            let Some(instance) = weak.upgrade() else { return };
            instance.remove_flags(InstanceFlags::RERENDER_QUEUED);
            instance.rerender();
        });
    }

    /// Re-render on the timer queue, after the current synchronous phase.
    pub fn defer_rerender(self: &Rc<Self>) {
        let Some(runtime) = self.runtime() else { return };
        let weak = Rc::downgrade(self);
        runtime.scheduler.set_timeout(move || {
            if let Some(instance) = weak.upgrade() {
                instance.rerender();
            }
        });
    }

    /// Run and clear the binding disposers of the last render, and destroy
    /// the child instances it created.
    pub(crate) fn reset_render_state(&self, teardown: bool) {
        let disposers = std::mem::take(&mut *self.effect_disposers.borrow_mut());
        for dispose in disposers {
            dispose();
        }
        let children = std::mem::take(&mut *self.children.borrow_mut());
        for child in children {
            child.destroy(teardown);
        }
    }

    // =========================================================================
    // Teardown
    // =========================================================================

    /// Destroy this instance and its children. Runs once; later calls are
    /// no-ops.
    ///
    /// With `teardown`, owned computeds of every component in the subtree are
    /// disposed too (application teardown rather than a parent re-render).
    pub fn destroy(&self, teardown: bool) {
        if self.is_destroyed() {
            return;
        }
        let was_mounted = self.flags().contains(InstanceFlags::MOUNTED);
        self.insert_flags(InstanceFlags::DESTROYED);
        self.remove_flags(InstanceFlags::MOUNTED | InstanceFlags::RERENDER_QUEUED);

        let inputs = std::mem::take(&mut *self.input_disposers.borrow_mut());
        for dispose in inputs {
            dispose();
        }
        self.reset_render_state(teardown);

        // A child whose queued mount never ran has nothing to tear down.
        if was_mounted {
            self.component.on_destroy();
        }

        if self.flags().contains(InstanceFlags::STYLED) {
            if let Some(runtime) = self.runtime() {
                runtime.styles.remove(&self.id);
            }
        }
        if teardown {
            if let Some(host) = self.component.host() {
                host.dispose_owned();
            }
        }
        tracing::debug!(id = %self.id, teardown, "instance destroyed");
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("id", &self.id)
            .field("flags", &self.flags())
            .field("children", &self.children.borrow().len())
            .finish()
    }
}
