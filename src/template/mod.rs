//! Template language.
//!
//! [`parse`] turns a template string into an immutable [`Template`]: a tree
//! of [`Token`]s whose expressions are already compiled. Templates are
//! parsed once per component and shared by every render.
//!
//! ```text
//! text
//! {{ expression }}
//! <tag name="a {{b}}" [prop]="expr" (event)="handler($event)"> … </tag>
//! @if (expr) { … } @else if (expr) { … } @else { … }
//! @for (let item of expr; track expr) { … } @empty { … }
//! ```

pub mod expr;
mod parser;
mod token;

pub use expr::{compile, compile_binding, BinaryOp, Expr, ExprError, Expression, UnaryOp};
pub use parser::{parse, TemplateError};
pub use token::{Attribute, Segment, Template, Token};
