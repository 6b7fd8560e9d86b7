//! Recursive-descent template parser.
//!
//! A single pass over the source with a byte cursor. Structural markers are
//! ASCII, so every slice boundary falls on a char boundary.
//!
//! ```text
//! <       element (or comment, or closing tag of the enclosing element)
//! {{      interpolation
//! @if     conditional, optionally followed by @else / @else if
//! @for    loop, optionally followed by @empty
//! other   text up to the next marker
//! ```
//!
//! Block bodies (`{ … }`) are parsed as independent templates. Without a
//! `{`, a body runs inline up to the next `@else`, `@empty`, `@if`, `@for`
//! or closing tag.

use thiserror::Error;

use super::expr::{compile, compile_binding, ExprError, Expression};
use super::token::{Attribute, Segment, Template, Token};

/// Tags that never have children.
const VOID_TAGS: &[&str] = &["img", "br", "hr", "input", "meta", "link"];

/// Fatal template syntax errors. Offsets are byte positions in the
/// template source.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("expected `(` after {directive} at offset {at}")]
    ExpectedParen { directive: &'static str, at: usize },

    #[error("unbalanced parentheses starting at offset {at}")]
    UnbalancedParens { at: usize },

    #[error("malformed @for header `{header}` at offset {at}, expected `let item of list [; track expr]`")]
    MalformedFor { header: String, at: usize },

    #[error("unclosed `{{` block starting at offset {at}")]
    UnclosedBlock { at: usize },

    #[error("unterminated interpolation starting at offset {at}")]
    UnterminatedInterpolation { at: usize },

    #[error("missing tag name at offset {at}")]
    ExpectedTagName { at: usize },

    #[error("element <{tag}> opened at offset {at} is never closed")]
    UnclosedElement { tag: String, at: usize },

    #[error("unexpected closing tag </{tag}> at offset {at}")]
    UnexpectedClosingTag { tag: String, at: usize },

    #[error("unterminated attribute value starting at offset {at}")]
    UnterminatedAttribute { at: usize },

    /// An `@if`/`@for` header expression does not compile. Binding
    /// expressions never fail the parse; see [`compile_binding`].
    #[error("invalid expression at offset {at}: {message}")]
    Expression { at: usize, message: String },
}

/// Parse a template string.
pub fn parse(source: &str) -> Result<Template, TemplateError> {
    let nodes = Parser::new(source, 0).parse_children(None)?;
    Ok(Template::new(nodes))
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
    /// Offset of `src` inside the full template, for error positions.
    base: usize,
}

impl<'a> Parser<'a> {
    fn new(src: &'a str, base: usize) -> Self {
        Self { src, pos: 0, base }
    }

    // =========================================================================
    // Cursor
    // =========================================================================

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn at_end(&self) -> bool {
        self.pos >= self.src.len()
    }

    fn starts_with(&self, pattern: &str) -> bool {
        self.rest().starts_with(pattern)
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn skip_whitespace(&mut self) {
        let rest = self.rest();
        self.pos += rest.len() - rest.trim_start().len();
    }

    /// Absolute offset of a local position.
    fn offset(&self, local: usize) -> usize {
        self.base + local
    }

    /// Read while `keep` holds. Returns the slice read.
    fn read_while(&mut self, keep: impl Fn(char) -> bool) -> &'a str {
        let start = self.pos;
        let rest = self.rest();
        let len = rest.find(|c: char| !keep(c)).unwrap_or(rest.len());
        self.pos += len;
        &self.src[start..self.pos]
    }

    fn compile_at(&self, source: &str, local: usize) -> Result<Expression, TemplateError> {
        compile(source).map_err(|ExprError { at, message }| TemplateError::Expression {
            at: self.offset(local + at),
            message,
        })
    }

    /// Parse a detached sub-template that starts at `local` in our source.
    fn sub_template(&self, content: &str, local: usize) -> Result<Vec<Token>, TemplateError> {
        let trimmed = content.trim();
        let lead = content.len() - content.trim_start().len();
        Parser::new(trimmed, self.offset(local + lead)).parse_children(None)
    }

    // =========================================================================
    // Node Lists
    // =========================================================================

    /// Parse nodes until the closing tag of `parent` (or end of input when
    /// `parent` is `None`).
    fn parse_children(&mut self, parent: Option<(&str, usize)>) -> Result<Vec<Token>, TemplateError> {
        let mut nodes = Vec::new();
        loop {
            if self.at_end() {
                return match parent {
                    Some((tag, at)) => Err(TemplateError::UnclosedElement { tag: tag.to_string(), at }),
                    None => Ok(nodes),
                };
            }
            if self.starts_with("</") {
                let at = self.offset(self.pos);
                let closing = self.read_closing_tag()?;
                return match parent {
                    Some((tag, _)) if closing == tag => Ok(nodes),
                    _ => Err(TemplateError::UnexpectedClosingTag { tag: closing, at }),
                };
            }
            if let Some(node) = self.parse_node(false)? {
                nodes.push(node);
            }
        }
    }

    /// Parse one node at the cursor. `None` for comments and dropped
    /// whitespace.
    fn parse_node(&mut self, inline: bool) -> Result<Option<Token>, TemplateError> {
        if self.starts_with("<!--") {
            match self.rest().find("-->") {
                Some(end) => self.pos += end + 3,
                None => self.pos = self.src.len(),
            }
            return Ok(None);
        }
        if self.starts_with("<") {
            return self.parse_element().map(Some);
        }
        if self.starts_with("{{") {
            return self.parse_interpolation().map(Some);
        }
        if self.starts_with("@if") {
            return self.parse_if().map(Some);
        }
        if self.starts_with("@for") {
            return self.parse_for().map(Some);
        }
        Ok(self.parse_text(inline))
    }

    /// Text up to the next structural marker. Whitespace-only runs are
    /// dropped.
    fn parse_text(&mut self, inline: bool) -> Option<Token> {
        let start = self.pos;
        let rest = self.rest();
        let end = rest
            .char_indices()
            .skip(1)
            .map(|(i, _)| i)
            .find(|&i| {
                let tail = &rest[i..];
                tail.starts_with('<')
                    || tail.starts_with("{{")
                    || tail.starts_with("@if")
                    || tail.starts_with("@for")
                    || (inline && (tail.starts_with("@else") || tail.starts_with("@empty")))
            })
            .unwrap_or(rest.len());
        self.pos = start + end;

        let text = &self.src[start..self.pos];
        if text.trim().is_empty() {
            None
        } else {
            Some(Token::Text(text.to_string()))
        }
    }

    // =========================================================================
    // Elements
    // =========================================================================

    fn parse_element(&mut self) -> Result<Token, TemplateError> {
        let open_at = self.offset(self.pos);
        self.pos += 1; // <
        let tag = self.read_while(|c| !c.is_whitespace() && c != '/' && c != '>');
        if tag.is_empty() {
            return Err(TemplateError::ExpectedTagName { at: open_at });
        }
        let unclosed = || TemplateError::UnclosedElement { tag: tag.to_string(), at: open_at };

        let mut attributes = Vec::new();
        let self_closing = loop {
            self.skip_whitespace();
            if self.at_end() {
                return Err(unclosed());
            }
            if self.starts_with("/") {
                self.pos += 1;
                self.skip_whitespace();
                if !self.starts_with(">") {
                    return Err(unclosed());
                }
                self.pos += 1;
                break true;
            }
            if self.starts_with(">") {
                self.pos += 1;
                break false;
            }
            attributes.push(self.parse_attribute()?);
        };

        let is_void = VOID_TAGS.iter().any(|v| v.eq_ignore_ascii_case(tag));
        let children = if self_closing || is_void {
            Vec::new()
        } else {
            self.parse_children(Some((tag, open_at)))?
        };

        Ok(Token::Element {
            tag: tag.to_string(),
            attributes,
            children,
            is_component: tag.contains('-'),
        })
    }

    /// Consume `</name>` and return `name`.
    fn read_closing_tag(&mut self) -> Result<String, TemplateError> {
        let at = self.offset(self.pos);
        self.pos += 2; // </
        let tag = self.read_while(|c| !c.is_whitespace() && c != '>').to_string();
        self.skip_whitespace();
        if !self.starts_with(">") {
            return Err(TemplateError::UnexpectedClosingTag { tag, at });
        }
        self.pos += 1;
        Ok(tag)
    }

    fn parse_attribute(&mut self) -> Result<Attribute, TemplateError> {
        let src = self.src;
        let name = self.read_while(|c| !c.is_whitespace() && !matches!(c, '=' | '>' | '/'));
        let (value, value_at) = if self.starts_with("=") {
            self.pos += 1;
            match self.peek() {
                Some(quote @ ('"' | '\'')) => {
                    let at = self.pos;
                    self.pos += 1;
                    let start = self.pos;
                    let Some(len) = self.rest().find(quote) else {
                        return Err(TemplateError::UnterminatedAttribute { at: self.offset(at) });
                    };
                    self.pos += len + 1;
                    (&src[start..start + len], start)
                }
                _ => {
                    let start = self.pos;
                    (self.read_while(|c| !c.is_whitespace() && c != '>' && c != '/'), start)
                }
            }
        } else {
            ("", self.pos)
        };

        if let Some(prop) = name.strip_prefix('[').and_then(|n| n.strip_suffix(']')) {
            return Ok(Attribute::Property {
                name: prop.to_string(),
                value: compile_binding(value),
            });
        }
        let event = name
            .strip_prefix('(')
            .and_then(|n| n.strip_suffix(')'))
            .or_else(|| name.strip_prefix("on-"));
        if let Some(event) = event {
            return Ok(Attribute::Event {
                name: event.to_string(),
                handler: compile_binding(value),
            });
        }
        Ok(Attribute::Static {
            name: name.to_string(),
            value: self.segments(value, value_at)?,
        })
    }

    /// Split an attribute value into literal and `{{ }}` parts.
    fn segments(&self, value: &str, local: usize) -> Result<Vec<Segment>, TemplateError> {
        let mut segments = Vec::new();
        let mut cursor = 0;
        while let Some(open) = value[cursor..].find("{{").map(|i| cursor + i) {
            if open > cursor {
                segments.push(Segment::Literal(value[cursor..open].to_string()));
            }
            let Some(close) = value[open + 2..].find("}}").map(|i| open + 2 + i) else {
                return Err(TemplateError::UnterminatedInterpolation { at: self.offset(local + open) });
            };
            segments.push(Segment::Expr(compile_binding(&value[open + 2..close])));
            cursor = close + 2;
        }
        if cursor < value.len() {
            segments.push(Segment::Literal(value[cursor..].to_string()));
        }
        Ok(segments)
    }

    // =========================================================================
    // Interpolation
    // =========================================================================

    fn parse_interpolation(&mut self) -> Result<Token, TemplateError> {
        let at = self.pos;
        self.pos += 2; // {{
        let start = self.pos;
        let Some(len) = self.rest().find("}}") else {
            return Err(TemplateError::UnterminatedInterpolation { at: self.offset(at) });
        };
        self.pos += len + 2;
        Ok(Token::Interpolation(compile_binding(&self.src[start..start + len])))
    }

    // =========================================================================
    // Control Flow
    // =========================================================================

    /// Content of a `( … )` header. The cursor must be on the `(`.
    fn read_parenthesized(&mut self, directive: &'static str) -> Result<(&'a str, usize), TemplateError> {
        if !self.starts_with("(") {
            return Err(TemplateError::ExpectedParen { directive, at: self.offset(self.pos) });
        }
        let src = self.src;
        let open = self.pos;
        let start = open + 1;
        let mut depth = 1usize;
        let mut quote: Option<char> = None;
        for (i, c) in src[start..].char_indices() {
            match (quote, c) {
                (Some(q), c) if c == q => quote = None,
                (Some(_), _) => {}
                (None, '"' | '\'') => quote = Some(c),
                (None, '(') => depth += 1,
                (None, ')') => {
                    depth -= 1;
                    if depth == 0 {
                        self.pos = start + i + 1;
                        return Ok((&src[start..start + i], start));
                    }
                }
                _ => {}
            }
        }
        Err(TemplateError::UnbalancedParens { at: self.offset(open) })
    }

    /// A `{ … }` block or an inline body.
    fn parse_body(&mut self) -> Result<Vec<Token>, TemplateError> {
        self.skip_whitespace();
        if !self.starts_with("{") || self.starts_with("{{") {
            return self.parse_inline();
        }

        let src = self.src;
        let open = self.pos;
        let start = open + 1;
        let mut depth = 1usize;
        for (i, c) in src[start..].char_indices() {
            match c {
                '{' => depth += 1,
                '}' => {
                    depth -= 1;
                    if depth == 0 {
                        self.pos = start + i + 1;
                        return self.sub_template(&src[start..start + i], start);
                    }
                }
                _ => {}
            }
        }
        Err(TemplateError::UnclosedBlock { at: self.offset(open) })
    }

    /// Nodes up to the next `@else`, `@empty`, `@if`, `@for` or closing tag.
    fn parse_inline(&mut self) -> Result<Vec<Token>, TemplateError> {
        let mut nodes = Vec::new();
        loop {
            self.skip_whitespace();
            let stop = ["@else", "@empty", "@if", "@for", "</"];
            if self.at_end() || stop.iter().any(|s| self.starts_with(s)) {
                break;
            }
            if let Some(node) = self.parse_node(true)? {
                nodes.push(node);
            }
        }
        if let Some(Token::Text(text)) = nodes.last_mut() {
            text.truncate(text.trim_end().len());
        }
        Ok(nodes)
    }

    /// Consume `keyword` if it follows (after whitespace). Leaves the cursor
    /// untouched otherwise.
    fn eat_keyword(&mut self, keyword: &str) -> bool {
        let saved = self.pos;
        self.skip_whitespace();
        if self.starts_with(keyword) {
            self.pos += keyword.len();
            true
        } else {
            self.pos = saved;
            false
        }
    }

    fn parse_if(&mut self) -> Result<Token, TemplateError> {
        self.pos += 3; // @if
        self.parse_if_tail()
    }

    /// Everything after the `@if` (or `@else if`) keyword.
    fn parse_if_tail(&mut self) -> Result<Token, TemplateError> {
        self.skip_whitespace();
        let (header, header_at) = self.read_parenthesized("@if")?;
        let condition = self.compile_at(header, header_at)?;
        let children = self.parse_body()?;

        let else_branch = if self.eat_keyword("@else") {
            self.skip_whitespace();
            if self.starts_with("@if") {
                Some(vec![self.parse_if()?])
            } else if self.starts_with("if") && self.rest()[2..].starts_with(|c: char| c.is_whitespace() || c == '(') {
                self.pos += 2;
                Some(vec![self.parse_if_tail()?])
            } else {
                Some(self.parse_body()?)
            }
        } else {
            None
        };

        Ok(Token::If { condition, children, else_branch })
    }

    fn parse_for(&mut self) -> Result<Token, TemplateError> {
        self.pos += 4; // @for
        self.skip_whitespace();
        let (header, header_at) = self.read_parenthesized("@for")?;
        let (item, list, track) = self.parse_for_header(header, header_at)?;
        let children = self.parse_body()?;

        let empty = if self.eat_keyword("@empty") {
            Some(self.parse_body()?)
        } else {
            None
        };

        Ok(Token::For { item, list, track, children, empty })
    }

    /// `let <item> of <list> [;] [track <expr>]`
    fn parse_for_header(
        &self,
        header: &str,
        local: usize,
    ) -> Result<(String, Expression, Option<Expression>), TemplateError> {
        let malformed = || TemplateError::MalformedFor {
            header: header.trim().to_string(),
            at: self.offset(local),
        };

        let after_let = header
            .trim_start()
            .strip_prefix("let")
            .filter(|rest| rest.starts_with(char::is_whitespace))
            .ok_or_else(malformed)?
            .trim_start();
        let item_len = after_let
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_' || c == '$'))
            .unwrap_or(after_let.len());
        let item = &after_let[..item_len];
        if item.is_empty() || item.starts_with(|c: char| c.is_ascii_digit()) {
            return Err(malformed());
        }
        let list_and_track = after_let[item_len..]
            .trim_start()
            .strip_prefix("of")
            .filter(|rest| rest.starts_with(char::is_whitespace))
            .ok_or_else(malformed)?;

        // Positions inside `header` for error offsets.
        let list_start = header.len() - list_and_track.len();
        let (list_src, track_src) = split_track(list_and_track);
        if list_src.trim().is_empty() {
            return Err(malformed());
        }

        let list = self.compile_at(list_src, local + list_start)?;
        let track = match track_src {
            Some(track_src) => {
                let track_start = header.len() - track_src.len();
                Some(self.compile_at(track_src, local + track_start)?)
            }
            None => None,
        };
        Ok((item.to_string(), list, track))
    }
}

/// Split `items; track item.id` (the `;` is optional) into the list part and
/// the track part.
fn split_track(source: &str) -> (&str, Option<&str>) {
    if let Some(semi) = source.find(';') {
        let tail = source[semi + 1..].trim_start();
        let track = tail
            .strip_prefix("track")
            .filter(|rest| rest.starts_with(char::is_whitespace));
        return (&source[..semi], track);
    }
    let mut search = 0;
    while let Some(found) = source[search..].find("track").map(|i| search + i) {
        let before = source[..found].chars().next_back();
        let after = &source[found + 5..];
        if before.is_some_and(char::is_whitespace) && after.starts_with(char::is_whitespace) {
            return (&source[..found], Some(after));
        }
        search = found + 5;
    }
    (source, None)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nodes(source: &str) -> Vec<Token> {
        parse(source).unwrap().nodes().to_vec()
    }

    #[test]
    fn test_text_and_interpolation() {
        let parsed = nodes("Hello {{ name }}!");
        assert_eq!(parsed.len(), 3);
        assert_eq!(parsed[0], Token::Text("Hello ".into()));
        let Token::Interpolation(expr) = &parsed[1] else { panic!("expected interpolation") };
        assert_eq!(expr.source(), "name");
        assert_eq!(parsed[2], Token::Text("!".into()));
    }

    #[test]
    fn test_element_with_bindings() {
        let parsed = nodes(r#"<button class="btn {{kind}}" [disabled]="busy" (click)="save($event)" on-focus="touch()">Go</button>"#);
        let Token::Element { tag, attributes, children, is_component } = &parsed[0] else {
            panic!("expected element");
        };
        assert_eq!(tag, "button");
        assert!(!is_component);
        assert_eq!(children.len(), 1);

        let Attribute::Static { name, value } = &attributes[0] else { panic!("static") };
        assert_eq!(name, "class");
        assert_eq!(value.len(), 2);
        assert_eq!(value[0], Segment::Literal("btn ".into()));

        assert!(matches!(&attributes[1], Attribute::Property { name, .. } if name == "disabled"));
        assert!(matches!(&attributes[2], Attribute::Event { name, .. } if name == "click"));
        assert!(matches!(&attributes[3], Attribute::Event { name, .. } if name == "focus"));
    }

    #[test]
    fn test_void_and_self_closing() {
        let parsed = nodes(r#"<img src=logo.png><br/><app-timer [seconds]="left" /><p>x</p>"#);
        assert_eq!(parsed.len(), 4);
        assert!(matches!(&parsed[2], Token::Element { is_component: true, .. }));
    }

    #[test]
    fn test_if_else_chain() {
        let parsed = nodes("@if (a) { A } @else if (b) { B } @else { C }");
        assert_eq!(parsed.len(), 1);
        let Token::If { children, else_branch: Some(else_branch), .. } = &parsed[0] else {
            panic!("expected if with else");
        };
        assert_eq!(children, &vec![Token::Text("A".into())]);
        let Token::If { else_branch: Some(last), .. } = &else_branch[0] else {
            panic!("expected nested if");
        };
        assert_eq!(last, &vec![Token::Text("C".into())]);
    }

    #[test]
    fn test_if_condition_with_nested_parens() {
        let parsed = nodes("@if (isSelected(option.id) && (count() > 0)) { yes }");
        let Token::If { condition, .. } = &parsed[0] else { panic!("expected if") };
        assert_eq!(condition.source(), "isSelected(option.id) && (count() > 0)");
    }

    #[test]
    fn test_inline_bodies() {
        let parsed = nodes("<p>@if (ok) <b>yes</b> @else no</p>");
        let Token::Element { children, .. } = &parsed[0] else { panic!("expected element") };
        let Token::If { children: then, else_branch: Some(otherwise), .. } = &children[0] else {
            panic!("expected if");
        };
        assert!(matches!(&then[0], Token::Element { tag, .. } if tag == "b"));
        assert_eq!(otherwise, &vec![Token::Text("no".into())]);
    }

    #[test]
    fn test_for_with_track_and_empty() {
        for source in [
            "@for (let item of items; track item.id) { <li>{{item.name}}</li> } @empty { none }",
            "@for (let item of items track item.id) { <li>{{item.name}}</li> } @empty { none }",
        ] {
            let parsed = nodes(source);
            let Token::For { item, list, track, children, empty } = &parsed[0] else {
                panic!("expected for");
            };
            assert_eq!(item, "item");
            assert_eq!(list.source(), "items");
            assert_eq!(track.as_ref().map(Expression::source), Some("item.id"));
            assert_eq!(children.len(), 1);
            assert_eq!(empty.as_deref(), Some(&[Token::Text("none".into())][..]));
        }
    }

    #[test]
    fn test_comments_are_skipped() {
        assert_eq!(nodes("<!-- note -->x"), vec![Token::Text("x".into())]);
    }

    #[test]
    fn test_fatal_errors() {
        assert!(matches!(parse("@if a { x }"), Err(TemplateError::ExpectedParen { .. })));
        assert!(matches!(parse("@if (a { x }"), Err(TemplateError::UnbalancedParens { .. })));
        assert!(matches!(parse("@for (item in items) { x }"), Err(TemplateError::MalformedFor { .. })));
        assert!(matches!(parse("@if (a) { x"), Err(TemplateError::UnclosedBlock { .. })));
        assert!(matches!(parse("{{ a"), Err(TemplateError::UnterminatedInterpolation { .. })));
        assert!(matches!(parse("<div><span></div>"), Err(TemplateError::UnexpectedClosingTag { .. })));
        assert!(matches!(parse("<div>text"), Err(TemplateError::UnclosedElement { .. })));
        assert!(matches!(parse("</p>"), Err(TemplateError::UnexpectedClosingTag { .. })));
        assert!(matches!(parse(r#"<a href="x>"#), Err(TemplateError::UnterminatedAttribute { .. })));
    }

    #[test]
    fn test_header_expression_error_offset() {
        let err = parse("@if (a = 1) { x }").unwrap_err();
        assert_eq!(err, TemplateError::Expression { at: 7, message: "assignment is not supported".into() });
    }

    #[test]
    fn test_bad_bindings_do_not_fail_the_template() {
        let nodes = nodes("<p title=\"{{ a = 1 }}\" [x]=\"form.submit()\" (click)=\"=\">{{ user.getName() }}</p>");
        let Token::Element { attributes, children, .. } = &nodes[0] else { panic!("expected element") };
        assert_eq!(attributes.len(), 3);
        let Attribute::Static { value, .. } = &attributes[0] else { panic!("expected static") };
        assert!(matches!(&value[0], Segment::Expr(expr) if expr.error().is_some()));
        assert!(matches!(&attributes[1], Attribute::Property { value, .. } if value.error().is_some()));
        assert!(matches!(&attributes[2], Attribute::Event { handler, .. } if handler.error().is_some()));
        assert!(matches!(&children[0], Token::Interpolation(expr) if expr.error().is_some()));
    }
}
