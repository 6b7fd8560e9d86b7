//! Expression evaluator - a tree-walking interpreter over [`Expr`].
//!
//! Semantics follow the usual scripting rules templates are written
//! against: `&&`/`||` short-circuit and return an operand, `+` concatenates
//! when either side is a string, unknown names and members read as `null`.
//! Anything that cannot be evaluated is an [`EvalError`]; [`evaluate`] logs
//! it and yields `null` so one bad binding never aborts a render.

use std::cmp::Ordering;

use thiserror::Error;

use crate::template::{BinaryOp, Expr, Expression, UnaryOp};
use crate::types::Value;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
    #[error("`{name}` is not a method or field of the component")]
    UnknownMethod { name: String },

    #[error("cannot index into {type_name}")]
    NotIndexable { type_name: &'static str },

    #[error("expression does not compile: {message}")]
    Invalid { message: String },
}

/// Name resolution for the evaluator.
pub trait Variables {
    /// Value bound to `name`. Signals are read (and tracked).
    fn lookup(&self, name: &str) -> Option<Value>;

    /// Call `name(args)`.
    fn call(&self, name: &str, args: &[Value]) -> Result<Value, EvalError>;
}

/// Evaluate `expr`, logging failures as `null`.
pub fn evaluate(expr: &Expression, vars: &dyn Variables) -> Value {
    match eval(expr.root(), vars) {
        Ok(value) => value,
        Err(error) => {
            tracing::warn!(expression = expr.source(), %error, "template expression failed");
            Value::Null
        }
    }
}

pub fn eval(expr: &Expr, vars: &dyn Variables) -> Result<Value, EvalError> {
    Ok(match expr {
        Expr::Invalid(error) => return Err(EvalError::Invalid { message: error.to_string() }),
        Expr::Literal(value) => value.clone(),
        Expr::Ident(name) => vars.lookup(name).unwrap_or_default(),
        Expr::Member(object, name) => eval(object, vars)?.member(name),
        Expr::Index(object, key) => {
            let object = eval(object, vars)?;
            let key = eval(key, vars)?;
            object
                .index(&key)
                .ok_or(EvalError::NotIndexable { type_name: object.type_name() })?
        }
        Expr::Call(name, args) => {
            let args = args.iter().map(|arg| eval(arg, vars)).collect::<Result<Vec<_>, _>>()?;
            vars.call(name, &args)?
        }
        Expr::List(items) => Value::list(
            items.iter().map(|item| eval(item, vars)).collect::<Result<Vec<_>, _>>()?,
        ),
        Expr::Unary(UnaryOp::Not, operand) => Value::Bool(!eval(operand, vars)?.is_truthy()),
        Expr::Unary(UnaryOp::Neg, operand) => Value::Number(-eval(operand, vars)?.to_number()),
        Expr::Binary(op, left, right) => binary(*op, left, right, vars)?,
        Expr::Ternary(condition, then, otherwise) => {
            if eval(condition, vars)?.is_truthy() {
                eval(then, vars)?
            } else {
                eval(otherwise, vars)?
            }
        }
    })
}

fn binary(op: BinaryOp, left: &Expr, right: &Expr, vars: &dyn Variables) -> Result<Value, EvalError> {
    let lhs = eval(left, vars)?;
    match op {
        BinaryOp::And if !lhs.is_truthy() => return Ok(lhs),
        BinaryOp::Or if lhs.is_truthy() => return Ok(lhs),
        BinaryOp::And | BinaryOp::Or => return eval(right, vars),
        _ => {}
    }
    let rhs = eval(right, vars)?;

    let ordered = |accept: fn(Ordering) -> bool| Value::Bool(lhs.compare(&rhs).is_some_and(accept));
    Ok(match op {
        BinaryOp::Eq => Value::Bool(lhs.loose_eq(&rhs)),
        BinaryOp::Ne => Value::Bool(!lhs.loose_eq(&rhs)),
        BinaryOp::StrictEq => Value::Bool(lhs == rhs),
        BinaryOp::StrictNe => Value::Bool(lhs != rhs),
        BinaryOp::Lt => ordered(Ordering::is_lt),
        BinaryOp::Le => ordered(Ordering::is_le),
        BinaryOp::Gt => ordered(Ordering::is_gt),
        BinaryOp::Ge => ordered(Ordering::is_ge),
        BinaryOp::Add => match (&lhs, &rhs) {
            (Value::Str(_), _) | (_, Value::Str(_)) => Value::from(format!("{lhs}{rhs}")),
            _ => Value::Number(lhs.to_number() + rhs.to_number()),
        },
        BinaryOp::Sub => Value::Number(lhs.to_number() - rhs.to_number()),
        BinaryOp::Mul => Value::Number(lhs.to_number() * rhs.to_number()),
        BinaryOp::Div => Value::Number(lhs.to_number() / rhs.to_number()),
        BinaryOp::Rem => Value::Number(lhs.to_number() % rhs.to_number()),
        BinaryOp::And | BinaryOp::Or => unreachable!("short-circuit operators return early"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::{compile, compile_binding};
    use std::collections::HashMap;

    struct Vars(HashMap<&'static str, Value>);

    impl Variables for Vars {
        fn lookup(&self, name: &str) -> Option<Value> {
            self.0.get(name).cloned()
        }
        fn call(&self, name: &str, args: &[Value]) -> Result<Value, EvalError> {
            match name {
                "sum" => Ok(Value::Number(args.iter().map(Value::to_number).sum())),
                _ => Err(EvalError::UnknownMethod { name: name.to_string() }),
            }
        }
    }

    fn vars() -> Vars {
        Vars(HashMap::from([
            ("count", Value::from(3)),
            ("name", Value::from("Ada")),
            ("items", Value::list([1, 2, 3])),
            ("user", Value::map([("id", Value::from(7)), ("admin", Value::Bool(false))])),
            ("answers", Value::map([("7", Value::from("b"))])),
        ]))
    }

    fn run(source: &str) -> Value {
        evaluate(&compile(source).unwrap(), &vars())
    }

    #[test]
    fn test_lookup_and_members() {
        assert_eq!(run("count"), Value::from(3));
        assert_eq!(run("items.length"), Value::from(3));
        assert_eq!(run("user.id"), Value::from(7));
        assert_eq!(run("answers[user.id]"), Value::from("b"));
        assert_eq!(run("items[1]"), Value::from(2));
        assert_eq!(run("missing"), Value::Null);
        assert_eq!(run("missing.deeper"), Value::Null);
    }

    #[test]
    fn test_operators() {
        assert_eq!(run("count * 2 + 1"), Value::from(7));
        assert_eq!(run("'Hi ' + name"), Value::from("Hi Ada"));
        assert_eq!(run("count === 3 && !user.admin"), Value::Bool(true));
        assert_eq!(run("count == '3'"), Value::Bool(true));
        assert_eq!(run("count !== '3'"), Value::Bool(true));
        assert_eq!(run("count >= 3 ? 'pass' : 'fail'"), Value::from("pass"));
        assert_eq!(run("-count % 2"), Value::from(-1));
    }

    #[test]
    fn test_logical_operators_return_operands() {
        assert_eq!(run("missing || name"), Value::from("Ada"));
        assert_eq!(run("name && count"), Value::from(3));
        assert_eq!(run("0 && explode()"), Value::from(0), "right side is not evaluated");
    }

    #[test]
    fn test_failures_yield_null() {
        assert_eq!(run("explode()"), Value::Null);
        assert_eq!(run("count[0]"), Value::Null);
        assert_eq!(run("sum(1, 2, count)"), Value::from(6));
    }

    #[test]
    fn test_invalid_binding_yields_null() {
        let broken = compile_binding("form.submit()");
        let Err(EvalError::Invalid { message }) = eval(broken.root(), &vars()) else {
            panic!("expected an invalid expression error");
        };
        assert!(message.contains("only named methods can be called"), "{message}");
        assert_eq!(evaluate(&broken, &vars()), Value::Null);
        assert_eq!(evaluate(&compile_binding("a = 1"), &vars()), Value::Null);
    }
}
