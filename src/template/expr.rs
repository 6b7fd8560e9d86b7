//! Template expressions.
//!
//! Every `{{ … }}`, `[prop]="…"`, `(event)="…"`, `@if (…)` and `@for (…)`
//! expression is compiled once, at parse time, into an [`Expr`] tree. The
//! renderer evaluates the tree against a scope; nothing is re-parsed on
//! re-render.
//!
//! Grammar (lowest precedence first):
//!
//! ```text
//! ternary  = or ( "?" ternary ":" ternary )?
//! binary   = unary ( op unary )*        op by precedence:
//!                                       ||  &&  == != === !==  < <= > >=  + -  * / %
//! unary    = ( "!" | "-" ) unary | postfix
//! postfix  = primary ( "." name | "?." name | "[" ternary "]" | "(" args ")" )*
//! primary  = number | string | true | false | null | undefined
//!          | name | "(" ternary ")" | "[" args "]"
//! ```
//!
//! Only names can be called: `select(item)` invokes the component method
//! `select`, `count()` reads the signal field `count`.

use std::fmt;
use std::rc::Rc;

use thiserror::Error;

use crate::types::Value;

// =============================================================================
// AST
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Neg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Or,
    And,
    Eq,
    Ne,
    StrictEq,
    StrictNe,
    Lt,
    Le,
    Gt,
    Ge,
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

impl BinaryOp {
    fn from_symbol(symbol: &str) -> Option<Self> {
        Some(match symbol {
            "||" => BinaryOp::Or,
            "&&" => BinaryOp::And,
            "==" => BinaryOp::Eq,
            "!=" => BinaryOp::Ne,
            "===" => BinaryOp::StrictEq,
            "!==" => BinaryOp::StrictNe,
            "<" => BinaryOp::Lt,
            "<=" => BinaryOp::Le,
            ">" => BinaryOp::Gt,
            ">=" => BinaryOp::Ge,
            "+" => BinaryOp::Add,
            "-" => BinaryOp::Sub,
            "*" => BinaryOp::Mul,
            "/" => BinaryOp::Div,
            "%" => BinaryOp::Rem,
            _ => return None,
        })
    }

    fn precedence(self) -> u8 {
        match self {
            BinaryOp::Or => 1,
            BinaryOp::And => 2,
            BinaryOp::Eq | BinaryOp::Ne | BinaryOp::StrictEq | BinaryOp::StrictNe => 3,
            BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => 4,
            BinaryOp::Add | BinaryOp::Sub => 5,
            BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem => 6,
        }
    }
}

/// A compiled expression node.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Value),
    Ident(String),
    Member(Box<Expr>, String),
    Index(Box<Expr>, Box<Expr>),
    Call(String, Vec<Expr>),
    List(Vec<Expr>),
    Unary(UnaryOp, Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
    Ternary(Box<Expr>, Box<Expr>, Box<Expr>),
    /// A binding that did not compile. Evaluates to an error.
    Invalid(ExprError),
}

/// A compiled expression together with its source text.
#[derive(Clone, PartialEq)]
pub struct Expression {
    source: Rc<str>,
    root: Rc<Expr>,
}

impl Expression {
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn root(&self) -> &Expr {
        &self.root
    }

    /// The compile error of a binding kept by [`compile_binding`].
    pub fn error(&self) -> Option<&ExprError> {
        match &*self.root {
            Expr::Invalid(error) => Some(error),
            _ => None,
        }
    }

    /// The name when the whole expression is a bare identifier.
    pub fn as_ident(&self) -> Option<&str> {
        match &*self.root {
            Expr::Ident(name) => Some(name),
            _ => None,
        }
    }
}

impl fmt::Debug for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Expression({:?})", &*self.source)
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// Compile error with a byte offset into the expression source.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} at offset {at}")]
pub struct ExprError {
    pub at: usize,
    pub message: String,
}

impl ExprError {
    fn new(at: usize, message: impl Into<String>) -> Self {
        Self { at, message: message.into() }
    }
}

/// Compile `source` into an [`Expression`].
pub fn compile(source: &str) -> Result<Expression, ExprError> {
    if source.trim().is_empty() {
        return Err(ExprError::new(0, "empty expression"));
    }
    let tokens = lex(source)?;
    let mut parser = ExprParser { tokens, pos: 0 };
    let root = parser.ternary()?;
    let (at, tok) = parser.peek();
    if *tok != Tok::End {
        return Err(ExprError::new(at, format!("unexpected {tok}")));
    }
    Ok(Expression {
        source: Rc::from(source.trim()),
        root: Rc::new(root),
    })
}

/// Compile a binding. A compile error is kept inside the expression rather
/// than returned, so only the binding fails, at evaluation time.
pub fn compile_binding(source: &str) -> Expression {
    compile(source).unwrap_or_else(|error| {
        tracing::debug!(source = source.trim(), %error, "binding kept as invalid expression");
        Expression {
            source: Rc::from(source.trim()),
            root: Rc::new(Expr::Invalid(error)),
        }
    })
}

// =============================================================================
// Lexer
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
enum Tok {
    Num(f64),
    Str(String),
    Name(String),
    Punct(&'static str),
    End,
}

impl fmt::Display for Tok {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tok::Num(n) => write!(f, "number {n}"),
            Tok::Str(s) => write!(f, "string {s:?}"),
            Tok::Name(name) => write!(f, "`{name}`"),
            Tok::Punct(p) => write!(f, "`{p}`"),
            Tok::End => f.write_str("end of expression"),
        }
    }
}

/// Longest first, so `===` wins over `==`.
const PUNCTUATION: &[&str] = &[
    "===", "!==", "==", "!=", "<=", ">=", "&&", "||", "?.", "<", ">", "+", "-", "*", "/", "%",
    "!", "?", ":", ".", ",", "(", ")", "[", "]",
];

fn is_name_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == '$'
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '$'
}

fn lex(source: &str) -> Result<Vec<(usize, Tok)>, ExprError> {
    let mut tokens = Vec::new();
    let mut chars = source.char_indices().peekable();

    while let Some(&(start, c)) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }

        if c.is_ascii_digit() {
            let mut end = start;
            while let Some(&(i, d)) = chars.peek() {
                if d.is_ascii_digit() || d == '.' {
                    end = i + d.len_utf8();
                    chars.next();
                } else {
                    break;
                }
            }
            let text = &source[start..end];
            let n = text
                .parse::<f64>()
                .map_err(|_| ExprError::new(start, format!("invalid number `{text}`")))?;
            tokens.push((start, Tok::Num(n)));
            continue;
        }

        if is_name_start(c) {
            let mut end = start;
            while let Some(&(i, d)) = chars.peek() {
                if is_name_char(d) {
                    end = i + d.len_utf8();
                    chars.next();
                } else {
                    break;
                }
            }
            tokens.push((start, Tok::Name(source[start..end].to_string())));
            continue;
        }

        if c == '\'' || c == '"' {
            chars.next();
            let mut text = String::new();
            let mut closed = false;
            while let Some((_, d)) = chars.next() {
                match d {
                    '\\' => match chars.next() {
                        Some((_, 'n')) => text.push('\n'),
                        Some((_, 't')) => text.push('\t'),
                        Some((_, other)) => text.push(other),
                        None => break,
                    },
                    d if d == c => {
                        closed = true;
                        break;
                    }
                    d => text.push(d),
                }
            }
            if !closed {
                return Err(ExprError::new(start, "unterminated string"));
            }
            tokens.push((start, Tok::Str(text)));
            continue;
        }

        let rest = &source[start..];
        let Some(punct) = PUNCTUATION.iter().find(|p| rest.starts_with(**p)) else {
            if c == '=' {
                return Err(ExprError::new(start, "assignment is not supported"));
            }
            return Err(ExprError::new(start, format!("unexpected character `{c}`")));
        };
        // `a ?.5 : 1` is a ternary, not optional chaining.
        let punct = if *punct == "?." && rest[2..].starts_with(|d: char| d.is_ascii_digit()) {
            "?"
        } else {
            punct
        };
        for _ in 0..punct.len() {
            chars.next();
        }
        tokens.push((start, Tok::Punct(punct)));
    }

    tokens.push((source.len(), Tok::End));
    Ok(tokens)
}

// =============================================================================
// Parser
// =============================================================================

struct ExprParser {
    tokens: Vec<(usize, Tok)>,
    pos: usize,
}

impl ExprParser {
    fn peek(&self) -> (usize, &Tok) {
        let (at, tok) = &self.tokens[self.pos.min(self.tokens.len() - 1)];
        (*at, tok)
    }

    fn advance(&mut self) -> (usize, Tok) {
        let entry = self.tokens[self.pos.min(self.tokens.len() - 1)].clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        entry
    }

    fn eat(&mut self, punct: &str) -> bool {
        if matches!(self.peek().1, Tok::Punct(p) if *p == punct) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, punct: &str) -> Result<(), ExprError> {
        if self.eat(punct) {
            return Ok(());
        }
        let (at, tok) = self.peek();
        Err(ExprError::new(at, format!("expected `{punct}`, found {tok}")))
    }

    fn ternary(&mut self) -> Result<Expr, ExprError> {
        let condition = self.binary(1)?;
        if !self.eat("?") {
            return Ok(condition);
        }
        let then = self.ternary()?;
        self.expect(":")?;
        let otherwise = self.ternary()?;
        Ok(Expr::Ternary(Box::new(condition), Box::new(then), Box::new(otherwise)))
    }

    fn binary(&mut self, min_precedence: u8) -> Result<Expr, ExprError> {
        let mut left = self.unary()?;
        loop {
            let op = match self.peek().1 {
                Tok::Punct(p) => BinaryOp::from_symbol(p),
                _ => None,
            };
            let Some(op) = op.filter(|op| op.precedence() >= min_precedence) else {
                return Ok(left);
            };
            self.pos += 1;
            let right = self.binary(op.precedence() + 1)?;
            left = Expr::Binary(op, Box::new(left), Box::new(right));
        }
    }

    fn unary(&mut self) -> Result<Expr, ExprError> {
        if self.eat("!") {
            return Ok(Expr::Unary(UnaryOp::Not, Box::new(self.unary()?)));
        }
        if self.eat("-") {
            return Ok(Expr::Unary(UnaryOp::Neg, Box::new(self.unary()?)));
        }
        self.postfix()
    }

    fn postfix(&mut self) -> Result<Expr, ExprError> {
        let mut expr = self.primary()?;
        loop {
            if self.eat(".") || self.eat("?.") {
                match self.advance() {
                    (_, Tok::Name(name)) => expr = Expr::Member(Box::new(expr), name),
                    (at, tok) => {
                        return Err(ExprError::new(at, format!("expected property name, found {tok}")));
                    }
                }
            } else if self.eat("[") {
                let key = self.ternary()?;
                self.expect("]")?;
                expr = Expr::Index(Box::new(expr), Box::new(key));
            } else if matches!(self.peek().1, Tok::Punct("(")) {
                let (at, _) = self.peek();
                let Expr::Ident(name) = expr else {
                    return Err(ExprError::new(at, "only named methods can be called"));
                };
                self.pos += 1;
                let args = self.arguments(")")?;
                expr = Expr::Call(name, args);
            } else {
                return Ok(expr);
            }
        }
    }

    fn arguments(&mut self, close: &str) -> Result<Vec<Expr>, ExprError> {
        let mut args = Vec::new();
        if self.eat(close) {
            return Ok(args);
        }
        loop {
            args.push(self.ternary()?);
            if self.eat(close) {
                return Ok(args);
            }
            self.expect(",")?;
        }
    }

    fn primary(&mut self) -> Result<Expr, ExprError> {
        let (at, tok) = self.advance();
        match tok {
            Tok::Num(n) => Ok(Expr::Literal(Value::Number(n))),
            Tok::Str(s) => Ok(Expr::Literal(Value::from(s))),
            Tok::Name(name) => Ok(match name.as_str() {
                "true" => Expr::Literal(Value::Bool(true)),
                "false" => Expr::Literal(Value::Bool(false)),
                "null" | "undefined" => Expr::Literal(Value::Null),
                _ => Expr::Ident(name),
            }),
            Tok::Punct("(") => {
                let inner = self.ternary()?;
                self.expect(")")?;
                Ok(inner)
            }
            Tok::Punct("[") => Ok(Expr::List(self.arguments("]")?)),
            tok => Err(ExprError::new(at, format!("unexpected {tok}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ident(name: &str) -> Box<Expr> {
        Box::new(Expr::Ident(name.to_string()))
    }

    #[test]
    fn test_precedence() {
        let expr = compile("a || b && c == 1 + 2 * 3").unwrap();
        let Expr::Binary(BinaryOp::Or, left, right) = expr.root() else {
            panic!("expected || at the root, got {:?}", expr.root());
        };
        assert_eq!(**left, Expr::Ident("a".into()));
        assert!(matches!(**right, Expr::Binary(BinaryOp::And, _, _)));
    }

    #[test]
    fn test_ternary_is_right_associative() {
        let expr = compile("a ? 1 : b ? 2 : 3").unwrap();
        let Expr::Ternary(_, _, otherwise) = expr.root() else {
            panic!("expected ternary");
        };
        assert!(matches!(**otherwise, Expr::Ternary(_, _, _)));
    }

    #[test]
    fn test_calls_members_and_index() {
        let expr = compile("select($event, $index)").unwrap();
        assert_eq!(
            *expr.root(),
            Expr::Call("select".into(), vec![Expr::Ident("$event".into()), Expr::Ident("$index".into())])
        );

        let expr = compile("answers[question.id]").unwrap();
        assert_eq!(
            *expr.root(),
            Expr::Index(ident("answers"), Box::new(Expr::Member(ident("question"), "id".into())))
        );

        assert_eq!(compile(" count ").unwrap().as_ident(), Some("count"));
    }

    #[test]
    fn test_literals() {
        let expr = compile("['a', \"b\", 1.5, true, null]").unwrap();
        let Expr::List(items) = expr.root() else { panic!("expected list") };
        assert_eq!(items.len(), 5);
        assert_eq!(items[2], Expr::Literal(Value::Number(1.5)));
        assert_eq!(items[4], Expr::Literal(Value::Null));
    }

    #[test]
    fn test_errors_carry_offsets() {
        assert_eq!(compile("").unwrap_err().message, "empty expression");
        assert_eq!(compile("a = 1").unwrap_err().at, 2);
        assert_eq!(compile("a b").unwrap_err().at, 2);
        assert!(compile("(a").is_err());
        assert!(compile("'open").is_err());
        assert!(compile("user.name()").is_err(), "only names are callable");
    }

    #[test]
    fn test_binding_keeps_compile_error() {
        let expr = compile_binding("form.submit()");
        assert_eq!(expr.source(), "form.submit()");
        assert_eq!(expr.error().map(|e| e.message.as_str()), Some("only named methods can be called"));

        let expr = compile_binding(" count ");
        assert!(expr.error().is_none());
        assert_eq!(expr.as_ident(), Some("count"));
    }

}
