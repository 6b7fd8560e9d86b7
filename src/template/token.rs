//! Parsed template tree.

use std::rc::Rc;

use super::expr::Expression;

/// One node of a parsed template. Immutable once parsed.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Raw text, emitted verbatim.
    Text(String),
    /// `{{ expr }}`
    Interpolation(Expression),
    /// Standalone event marker. The parser never produces it; event
    /// bindings live on [`Attribute::Event`].
    Event(String),
    /// `@if (condition) { … } @else { … }`
    If {
        condition: Expression,
        children: Vec<Token>,
        else_branch: Option<Vec<Token>>,
    },
    /// `@for (let item of list; track key) { … } @empty { … }`
    For {
        item: String,
        list: Expression,
        track: Option<Expression>,
        children: Vec<Token>,
        empty: Option<Vec<Token>>,
    },
    Element {
        tag: String,
        attributes: Vec<Attribute>,
        children: Vec<Token>,
        /// Tag contains a hyphen: resolved through the component registry.
        is_component: bool,
    },
}

/// An attribute as written on an element.
#[derive(Debug, Clone, PartialEq)]
pub enum Attribute {
    /// `name="text {{ expr }} text"`, applied verbatim after interpolation.
    Static { name: String, value: Vec<Segment> },
    /// `[name]="expr"`
    Property { name: String, value: Expression },
    /// `(name)="handler"` or `on-name="handler"`
    Event { name: String, handler: Expression },
}

impl Attribute {
    pub fn name(&self) -> &str {
        match self {
            Attribute::Static { name, .. }
            | Attribute::Property { name, .. }
            | Attribute::Event { name, .. } => name,
        }
    }
}

/// Part of a static attribute value.
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    Literal(String),
    Expr(Expression),
}

/// A parsed template, shared between every render of a component.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    nodes: Rc<[Token]>,
}

impl Template {
    pub(crate) fn new(nodes: Vec<Token>) -> Self {
        Self { nodes: nodes.into() }
    }

    pub fn nodes(&self) -> &[Token] {
        &self.nodes
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
