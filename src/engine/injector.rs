//! Dependency Injector - one singleton per type.
//!
//! Types are their own injection tokens: `inject::<T>()` looks up
//! `TypeId::of::<T>()` and builds the instance with [`Injectable::create`] on
//! first request. `create` resolves its own dependencies with further
//! `inject` calls, so the whole graph is built lazily, depth first.
//!
//! There is no cycle detection. `A::create` injecting `B` whose `create`
//! injects `A` recurses until the stack overflows.

use std::any::{Any, TypeId};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// A type the injector can build.
pub trait Injectable: 'static {
    fn create(injector: &Injector) -> Self
    where
        Self: Sized;
}

/// Singleton cache keyed by type.
#[derive(Default)]
pub struct Injector {
    instances: RefCell<HashMap<TypeId, Rc<dyn Any>>>,
}

impl Injector {
    pub fn new() -> Self {
        Self::default()
    }

    /// The singleton for `T`, built on first request.
    pub fn inject<T: Injectable>(&self) -> Rc<T> {
        if let Some(existing) = self.get::<T>() {
            return existing;
        }

        // No borrow is held here: `create` re-enters the injector.
        let created = Rc::new(T::create(self));
        tracing::debug!(token = std::any::type_name::<T>(), "injector: created singleton");

        let mut instances = self.instances.borrow_mut();
        let stored = instances
            .entry(TypeId::of::<T>())
            .or_insert_with(|| created.clone() as Rc<dyn Any>)
            .clone();
        stored.downcast::<T>().unwrap_or(created)
    }

    /// The singleton for `T` if it has been built or provided.
    pub fn get<T: 'static>(&self) -> Option<Rc<T>> {
        let existing = self.instances.borrow().get(&TypeId::of::<T>()).cloned()?;
        existing.downcast::<T>().ok()
    }

    /// Register a pre-built singleton, replacing any existing one.
    pub fn provide<T: 'static>(&self, value: T) -> Rc<T> {
        let value = Rc::new(value);
        self.provide_rc(value.clone());
        value
    }

    pub fn provide_rc<T: 'static>(&self, value: Rc<T>) {
        self.instances.borrow_mut().insert(TypeId::of::<T>(), value);
    }

    pub fn contains<T: 'static>(&self) -> bool {
        self.instances.borrow().contains_key(&TypeId::of::<T>())
    }

    /// Number of singletons held.
    pub fn len(&self) -> usize {
        self.instances.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.borrow().is_empty()
    }
}

impl fmt::Debug for Injector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Injector").field("singletons", &self.len()).finish()
    }
}
