//! Scope chain for template evaluation.
//!
//! The root scope wraps the component being rendered. Every `@for`
//! iteration pushes a child frame binding the item name and `$index`; event
//! handlers push one binding `$event`. Lookups walk outward from the
//! innermost frame and end at the component's fields.

use std::fmt;
use std::rc::Rc;

use super::evaluate::{EvalError, Variables};
use crate::component::{Component, Field};
use crate::types::Value;

struct Frame {
    context: Rc<dyn Component>,
    parent: Option<Scope>,
    locals: Vec<(String, Value)>,
}

#[derive(Clone)]
pub struct Scope(Rc<Frame>);

impl Scope {
    /// Outermost scope of a component.
    pub fn root(context: Rc<dyn Component>) -> Self {
        Scope(Rc::new(Frame { context, parent: None, locals: Vec::new() }))
    }

    /// A nested scope with extra bindings.
    pub fn child(&self, locals: Vec<(String, Value)>) -> Self {
        Scope(Rc::new(Frame {
            context: self.0.context.clone(),
            parent: Some(self.clone()),
            locals,
        }))
    }

    pub fn with_local(&self, name: &str, value: Value) -> Self {
        self.child(vec![(name.to_string(), value)])
    }

    pub fn context(&self) -> &Rc<dyn Component> {
        &self.0.context
    }

    /// Innermost local binding of `name`.
    pub fn local(&self, name: &str) -> Option<Value> {
        let mut frame = Some(self);
        while let Some(scope) = frame {
            if let Some((_, value)) = scope.0.locals.iter().rev().find(|(n, _)| n == name) {
                return Some(value.clone());
            }
            frame = scope.0.parent.as_ref();
        }
        None
    }

    /// Nesting depth (0 for the root).
    pub fn depth(&self) -> usize {
        let mut depth = 0;
        let mut frame = self.0.parent.as_ref();
        while let Some(scope) = frame {
            depth += 1;
            frame = scope.0.parent.as_ref();
        }
        depth
    }
}

impl Variables for Scope {
    fn lookup(&self, name: &str) -> Option<Value> {
        self.local(name)
            .or_else(|| self.0.context.field(name).map(|field| field.read()))
    }

    /// A component method, or, for `name()` with no arguments, a read of
    /// the field `name`. `sig(value)` on a writable signal field sets it.
    fn call(&self, name: &str, args: &[Value]) -> Result<Value, EvalError> {
        if let Some(result) = self.0.context.call(name, args) {
            return Ok(result);
        }
        match (self.0.context.field(name), args) {
            (Some(field), []) => Ok(field.read()),
            (Some(Field::Signal(signal)), [value]) => {
                signal.set(value.clone());
                Ok(Value::Null)
            }
            _ => Err(EvalError::UnknownMethod { name: name.to_string() }),
        }
    }
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.0.locals.iter().map(|(n, _)| n.as_str()).collect();
        f.debug_struct("Scope")
            .field("locals", &names)
            .field("depth", &self.depth())
            .finish()
    }
}
