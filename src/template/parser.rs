// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Recursive-descent parser for the expression language.
//!
//! Binary operators are parsed by precedence climbing, lowest first:
//! `?:`, `??`, `||`, `&&`, equality, relational, additive, multiplicative,
//! unary, then member/index/call postfixes.
//!
//! Nesting is capped at [`MAX_NESTING`] levels so that neither parsing nor
//! evaluating a hostile template can exhaust the stack.

use serde_json::Value;

use crate::error::TemplateError;

use super::ast::{BinaryOp, Expr, LogicalOp, Stmt, TemplatePart, UnaryOp};
use super::lexer::{Token, TokenKind, tokenize, unescape};
use super::value::number;

type ParseResult<T> = Result<T, TemplateError>;

/// Deepest nesting of statements and expressions a template may use.
///
/// Parentheses, unary operators, nested blocks and every link of an
/// operator or member chain each count as one level.
pub(crate) const MAX_NESTING: usize = 64;

/// Parses the body of a `[[[ ... ]]]` block.
pub(crate) fn parse_program(source: &str) -> ParseResult<Vec<Stmt>> {
    let mut parser = Parser::new(source, 0, 0)?;
    let mut body = Vec::new();
    while !parser.at_end() {
        body.push(parser.statement()?);
    }
    Ok(body)
}

/// Parses a single expression spanning all of `source`.
#[cfg(test)]
pub(crate) fn parse_expression(source: &str) -> ParseResult<Expr> {
    parse_expression_at(source, 0, 0)
}

/// Parses a string containing `${...}` placeholders.
///
/// Text outside placeholders is kept verbatim.
pub(crate) fn parse_interpolation(text: &str) -> ParseResult<Vec<TemplatePart>> {
    split_template(text, 0, false, 0)
}

fn parse_expression_at(source: &str, base: usize, depth: usize) -> ParseResult<Expr> {
    let mut parser = Parser::new(source, base, depth)?;
    if parser.at_end() {
        return Err(TemplateError::syntax(base, "expected expression"));
    }
    let expr = parser.expression()?;
    if let Some(token) = parser.peek() {
        return Err(TemplateError::syntax(
            base + token.span.start,
            format!("unexpected {}", token.kind.describe()),
        ));
    }
    Ok(expr)
}

/// Splits template text into literal and `${...}` parts.
///
/// `escaped` decodes backslash escapes in the literal parts, as inside a
/// backtick literal. `depth` is the nesting already spent by the
/// enclosing expression.
fn split_template(
    text: &str,
    base: usize,
    escaped: bool,
    depth: usize,
) -> ParseResult<Vec<TemplatePart>> {
    let mut parts = Vec::new();
    let mut literal = String::new();
    let mut rest = text;
    let mut offset = base;

    while let Some(start) = rest.find("${") {
        literal.push_str(&rest[..start]);
        let inner_start = start + 2;
        let Some(len) = matching_brace(&rest[inner_start..]) else {
            return Err(TemplateError::syntax(
                offset + start,
                "unterminated ${ placeholder",
            ));
        };

        if !literal.is_empty() {
            let text = std::mem::take(&mut literal);
            parts.push(TemplatePart::Text(if escaped { unescape(&text) } else { text }));
        }
        let inner = &rest[inner_start..inner_start + len];
        parts.push(TemplatePart::Expr(parse_expression_at(
            inner,
            offset + inner_start,
            depth,
        )?));

        let consumed = inner_start + len + 1;
        rest = &rest[consumed..];
        offset += consumed;
    }

    literal.push_str(rest);
    if !literal.is_empty() {
        parts.push(TemplatePart::Text(if escaped {
            unescape(&literal)
        } else {
            literal
        }));
    }
    Ok(parts)
}

/// Returns the byte length up to the `}` closing a placeholder whose
/// opening brace was just consumed.
fn matching_brace(text: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for (i, c) in text.char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '\'' | '"' | '`' => quote = Some(c),
            '{' => depth += 1,
            '}' if depth == 0 => return Some(i),
            '}' => depth -= 1,
            _ => {}
        }
    }
    None
}

struct Parser<'src> {
    source: &'src str,
    base: usize,
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

/// An operator handled by precedence climbing.
#[derive(Debug, Clone, Copy)]
enum Infix {
    Logical(LogicalOp),
    Binary(BinaryOp),
}

impl Infix {
    fn apply(self, left: Expr, right: Expr) -> Expr {
        let (left, right) = (Box::new(left), Box::new(right));
        match self {
            Self::Logical(op) => Expr::Logical { op, left, right },
            Self::Binary(op) => Expr::Binary { op, left, right },
        }
    }
}

impl<'src> Parser<'src> {
    fn new(source: &'src str, base: usize, depth: usize) -> ParseResult<Self> {
        let tokens = tokenize(source).map_err(|e| match e {
            TemplateError::Lex { offset, text } => TemplateError::Lex {
                offset: base + offset,
                text,
            },
            other => other,
        })?;
        Ok(Self {
            source,
            base,
            tokens,
            pos: 0,
            depth,
        })
    }

    // =========================================================================
    // Token cursor
    // =========================================================================

    fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_kind(&self) -> Option<TokenKind> {
        self.peek().map(|t| t.kind)
    }

    fn peek_kind_at(&self, ahead: usize) -> Option<TokenKind> {
        self.tokens.get(self.pos + ahead).map(|t| t.kind)
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.peek_kind() == Some(kind)
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn advance(&mut self) -> ParseResult<Token> {
        let token = self
            .peek()
            .cloned()
            .ok_or_else(|| self.error_here("unexpected end of expression"))?;
        self.pos += 1;
        Ok(token)
    }

    fn expect(&mut self, kind: TokenKind) -> ParseResult<Token> {
        if self.check(kind) {
            self.advance()
        } else {
            Err(self.error_here(format!("expected {}", kind.describe())))
        }
    }

    fn text(&self, token: &Token) -> &'src str {
        &self.source[token.span.clone()]
    }

    fn offset_here(&self) -> usize {
        self.base + self.peek().map_or(self.source.len(), |t| t.span.start)
    }

    fn error_here(&self, message: impl Into<String>) -> TemplateError {
        let message = message.into();
        match self.peek() {
            Some(token) => TemplateError::syntax(
                self.offset_here(),
                format!("{message}, found {}", token.kind.describe()),
            ),
            None => TemplateError::syntax(self.offset_here(), message),
        }
    }

    // =========================================================================
    // Nesting
    // =========================================================================

    /// Enters one nesting level, failing past [`MAX_NESTING`].
    fn descend(&mut self) -> ParseResult<()> {
        if self.depth >= MAX_NESTING {
            return Err(TemplateError::syntax(
                self.offset_here(),
                "expression nested too deeply",
            ));
        }
        self.depth += 1;
        Ok(())
    }

    /// Runs `parse` one nesting level down.
    fn nested<T>(&mut self, parse: impl FnOnce(&mut Self) -> ParseResult<T>) -> ParseResult<T> {
        self.descend()?;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    // =========================================================================
    // Statements
    // =========================================================================

    fn statement(&mut self) -> ParseResult<Stmt> {
        self.nested(Self::statement_body)
    }

    fn statement_body(&mut self) -> ParseResult<Stmt> {
        let Some(kind) = self.peek_kind() else {
            return Err(self.error_here("expected statement"));
        };

        let stmt = match kind {
            TokenKind::Semicolon => {
                self.pos += 1;
                return Ok(Stmt::Empty);
            }
            TokenKind::LBrace => {
                self.pos += 1;
                let mut body = Vec::new();
                while !self.check(TokenKind::RBrace) {
                    if self.at_end() {
                        return Err(self.error_here("expected '}'"));
                    }
                    body.push(self.statement()?);
                }
                self.pos += 1;
                return Ok(Stmt::Block(body));
            }
            TokenKind::If => return self.if_statement(),
            TokenKind::Const | TokenKind::Let | TokenKind::Var => {
                self.pos += 1;
                let name = self.expect(TokenKind::Ident)?;
                let name = self.text(&name).to_string();
                let init = if self.eat(TokenKind::Assign) {
                    Some(self.expression()?)
                } else {
                    None
                };
                Stmt::Declare { name, init }
            }
            TokenKind::Return => {
                self.pos += 1;
                let ends = matches!(
                    self.peek_kind(),
                    None | Some(TokenKind::Semicolon | TokenKind::RBrace)
                );
                Stmt::Return(if ends { None } else { Some(self.expression()?) })
            }
            TokenKind::Ident if self.peek_kind_at(1) == Some(TokenKind::Assign) => {
                let name = self.advance()?;
                let name = self.text(&name).to_string();
                self.pos += 1;
                Stmt::Assign {
                    name,
                    value: self.expression()?,
                }
            }
            _ => Stmt::Expr(self.expression()?),
        };

        self.eat(TokenKind::Semicolon);
        Ok(stmt)
    }

    fn if_statement(&mut self) -> ParseResult<Stmt> {
        self.expect(TokenKind::If)?;
        self.expect(TokenKind::LParen)?;
        let test = self.expression()?;
        self.expect(TokenKind::RParen)?;
        let then = Box::new(self.statement()?);
        let otherwise = if self.eat(TokenKind::Else) {
            Some(Box::new(self.statement()?))
        } else {
            None
        };
        Ok(Stmt::If {
            test,
            then,
            otherwise,
        })
    }

    // =========================================================================
    // Expressions
    // =========================================================================

    fn expression(&mut self) -> ParseResult<Expr> {
        self.nested(Self::conditional)
    }

    fn conditional(&mut self) -> ParseResult<Expr> {
        let test = self.infix(0)?;
        if !self.eat(TokenKind::Question) {
            return Ok(test);
        }
        let consequent = self.expression()?;
        self.expect(TokenKind::Colon)?;
        let alternate = self.expression()?;
        Ok(Expr::Conditional {
            test: Box::new(test),
            consequent: Box::new(consequent),
            alternate: Box::new(alternate),
        })
    }

    /// Parses operators binding at least as tightly as `min_precedence`.
    ///
    /// All infix operators are left-associative.
    fn infix(&mut self, min_precedence: u8) -> ParseResult<Expr> {
        let mut left = self.unary()?;
        let mut links = 0;

        while let Some((precedence, op)) = self.peek_kind().and_then(infix_op) {
            if precedence < min_precedence {
                break;
            }
            self.pos += 1;
            let right = self.infix(precedence + 1)?;
            self.descend()?;
            links += 1;
            left = op.apply(left, right);
        }

        self.depth -= links;
        Ok(left)
    }

    fn unary(&mut self) -> ParseResult<Expr> {
        let op = match self.peek_kind() {
            Some(TokenKind::Bang) => UnaryOp::Not,
            Some(TokenKind::Minus) => UnaryOp::Neg,
            Some(TokenKind::Plus) => UnaryOp::Plus,
            _ => return self.postfix(),
        };
        self.pos += 1;
        let operand = self.nested(Self::unary)?;
        Ok(Expr::Unary {
            op,
            operand: Box::new(operand),
        })
    }

    fn postfix(&mut self) -> ParseResult<Expr> {
        let mut expr = self.primary()?;
        let mut links = 0;

        loop {
            if matches!(
                self.peek_kind(),
                Some(
                    TokenKind::Dot
                        | TokenKind::QuestionDot
                        | TokenKind::LBracket
                        | TokenKind::LParen
                )
            ) {
                self.descend()?;
                links += 1;
            }
            match self.peek_kind() {
                Some(TokenKind::Dot) => {
                    self.pos += 1;
                    let property = self.property_name()?;
                    expr = Expr::Member {
                        object: Box::new(expr),
                        property,
                        optional: false,
                    };
                }
                Some(TokenKind::QuestionDot) => {
                    self.pos += 1;
                    if self.eat(TokenKind::LBracket) {
                        let index = self.expression()?;
                        self.expect(TokenKind::RBracket)?;
                        expr = Expr::Index {
                            object: Box::new(expr),
                            index: Box::new(index),
                            optional: true,
                        };
                    } else {
                        let property = self.property_name()?;
                        expr = Expr::Member {
                            object: Box::new(expr),
                            property,
                            optional: true,
                        };
                    }
                }
                Some(TokenKind::LBracket) => {
                    self.pos += 1;
                    let index = self.expression()?;
                    self.expect(TokenKind::RBracket)?;
                    expr = Expr::Index {
                        object: Box::new(expr),
                        index: Box::new(index),
                        optional: false,
                    };
                }
                Some(TokenKind::LParen) => {
                    self.pos += 1;
                    let args = self.list(TokenKind::RParen)?;
                    expr = Expr::Call {
                        callee: Box::new(expr),
                        args,
                    };
                }
                _ => break,
            }
        }

        self.depth -= links;
        Ok(expr)
    }

    /// Parses a comma-separated expression list up to `close`, allowing a
    /// trailing comma.
    fn list(&mut self, close: TokenKind) -> ParseResult<Vec<Expr>> {
        let mut items = Vec::new();
        while !self.eat(close) {
            items.push(self.expression()?);
            if !self.eat(TokenKind::Comma) {
                self.expect(close)?;
                break;
            }
        }
        Ok(items)
    }

    /// Accepts identifiers and keywords after `.`, as JavaScript does.
    fn property_name(&mut self) -> ParseResult<String> {
        let token = self.advance()?;
        let text = self.text(&token);
        let is_word = text
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == '$');
        if is_word {
            Ok(text.to_string())
        } else {
            Err(TemplateError::syntax(
                self.base + token.span.start,
                "expected property name",
            ))
        }
    }

    fn primary(&mut self) -> ParseResult<Expr> {
        let Some(kind) = self.peek_kind() else {
            return Err(self.error_here("expected expression"));
        };
        let start = self.offset_here();

        match kind {
            TokenKind::Number => {
                let token = self.advance()?;
                let text = self.text(&token);
                let value: f64 = text
                    .parse()
                    .map_err(|_| TemplateError::syntax(start, format!("bad number {text}")))?;
                Ok(Expr::Literal(number(value)))
            }
            TokenKind::String => {
                let token = self.advance()?;
                let text = self.text(&token);
                Ok(Expr::Literal(Value::String(unescape(&text[1..text.len() - 1]))))
            }
            TokenKind::Template => {
                let token = self.advance()?;
                let text = self.text(&token);
                let body = &text[1..text.len() - 1];
                Ok(Expr::Template(split_template(
                    body,
                    start + 1,
                    true,
                    self.depth,
                )?))
            }
            TokenKind::True => {
                self.pos += 1;
                Ok(Expr::Literal(Value::Bool(true)))
            }
            TokenKind::False => {
                self.pos += 1;
                Ok(Expr::Literal(Value::Bool(false)))
            }
            TokenKind::Null | TokenKind::Undefined => {
                self.pos += 1;
                Ok(Expr::Literal(Value::Null))
            }
            TokenKind::Ident => {
                let token = self.advance()?;
                Ok(Expr::Ident(self.text(&token).to_string()))
            }
            TokenKind::LParen => {
                self.pos += 1;
                let expr = self.expression()?;
                self.expect(TokenKind::RParen)?;
                Ok(expr)
            }
            TokenKind::LBracket => {
                self.pos += 1;
                Ok(Expr::Array(self.list(TokenKind::RBracket)?))
            }
            TokenKind::LBrace => {
                self.pos += 1;
                self.object_literal()
            }
            _ => Err(self.error_here("expected expression")),
        }
    }

    fn object_literal(&mut self) -> ParseResult<Expr> {
        let mut entries = Vec::new();

        while !self.eat(TokenKind::RBrace) {
            let token = self.advance()?;
            let key = match token.kind {
                TokenKind::String => {
                    let text = self.text(&token);
                    unescape(&text[1..text.len() - 1])
                }
                TokenKind::Ident | TokenKind::Number => self.text(&token).to_string(),
                _ => {
                    return Err(TemplateError::syntax(
                        self.base + token.span.start,
                        "expected property key",
                    ));
                }
            };

            let value = if self.eat(TokenKind::Colon) {
                self.expression()?
            } else if token.kind == TokenKind::Ident {
                Expr::Ident(key.clone())
            } else {
                return Err(self.error_here("expected ':'"));
            };
            entries.push((key, value));

            if !self.eat(TokenKind::Comma) {
                self.expect(TokenKind::RBrace)?;
                break;
            }
        }

        Ok(Expr::Object(entries))
    }
}

/// Precedence and operator of an infix token.
fn infix_op(kind: TokenKind) -> Option<(u8, Infix)> {
    let op = match kind {
        TokenKind::Nullish => (0, Infix::Logical(LogicalOp::Nullish)),
        TokenKind::OrOr => (1, Infix::Logical(LogicalOp::Or)),
        TokenKind::AndAnd => (2, Infix::Logical(LogicalOp::And)),
        TokenKind::EqEq => (3, Infix::Binary(BinaryOp::LooseEq)),
        TokenKind::NotEq => (3, Infix::Binary(BinaryOp::LooseNotEq)),
        TokenKind::EqEqEq => (3, Infix::Binary(BinaryOp::StrictEq)),
        TokenKind::NotEqEq => (3, Infix::Binary(BinaryOp::StrictNotEq)),
        TokenKind::Lt => (4, Infix::Binary(BinaryOp::Lt)),
        TokenKind::LtEq => (4, Infix::Binary(BinaryOp::LtEq)),
        TokenKind::Gt => (4, Infix::Binary(BinaryOp::Gt)),
        TokenKind::GtEq => (4, Infix::Binary(BinaryOp::GtEq)),
        TokenKind::Plus => (5, Infix::Binary(BinaryOp::Add)),
        TokenKind::Minus => (5, Infix::Binary(BinaryOp::Sub)),
        TokenKind::Star => (6, Infix::Binary(BinaryOp::Mul)),
        TokenKind::Slash => (6, Infix::Binary(BinaryOp::Div)),
        TokenKind::Percent => (6, Infix::Binary(BinaryOp::Rem)),
        _ => return None,
    };
    Some(op)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ident(name: &str) -> Box<Expr> {
        Box::new(Expr::Ident(name.to_string()))
    }

    #[test]
    fn multiplication_binds_tighter_than_addition() {
        let expr = parse_expression("1 + 2 * 3").unwrap();
        let Expr::Binary { op, right, .. } = expr else {
            panic!("expected binary");
        };
        assert_eq!(op, BinaryOp::Add);
        assert!(matches!(*right, Expr::Binary { op: BinaryOp::Mul, .. }));
    }

    #[test]
    fn member_chain_and_call() {
        let expr = parse_expression("states['light.desk'].state.toUpperCase()").unwrap();
        let Expr::Call { callee, args } = expr else {
            panic!("expected call");
        };
        assert!(args.is_empty());
        assert!(matches!(*callee, Expr::Member { ref property, .. } if property == "toUpperCase"));
    }

    #[test]
    fn ternary_is_right_associative() {
        let expr = parse_expression("a ? b : c ? d : e").unwrap();
        let Expr::Conditional { alternate, .. } = expr else {
            panic!("expected conditional");
        };
        assert!(matches!(*alternate, Expr::Conditional { .. }));
    }

    #[test]
    fn nullish_and_logical() {
        let expr = parse_expression("a ?? b || c").unwrap();
        assert_eq!(
            expr,
            Expr::Logical {
                op: LogicalOp::Nullish,
                left: ident("a"),
                right: Box::new(Expr::Logical {
                    op: LogicalOp::Or,
                    left: ident("b"),
                    right: ident("c"),
                }),
            }
        );
    }

    #[test]
    fn program_with_declarations_and_if() {
        let program = parse_program(
            "const t = 21; if (t > 20) { return 'warm' } else return 'cold';",
        )
        .unwrap();
        assert_eq!(program.len(), 2);
        assert!(matches!(program[0], Stmt::Declare { .. }));
        assert!(matches!(program[1], Stmt::If { otherwise: Some(_), .. }));
    }

    #[test]
    fn bare_return() {
        let program = parse_program("return;").unwrap();
        assert_eq!(program, vec![Stmt::Return(None)]);
    }

    #[test]
    fn object_and_array_literals() {
        let expr = parse_expression("{a: 1, 'b c': [1, 2,], d}").unwrap();
        let Expr::Object(entries) = expr else {
            panic!("expected object");
        };
        let keys: Vec<&str> = entries.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["a", "b c", "d"]);
    }

    #[test]
    fn unbalanced_paren_is_a_syntax_error() {
        let err = parse_program("return (").unwrap_err();
        assert!(matches!(err, TemplateError::Syntax { offset: 8, .. }));
    }

    #[test]
    fn interpolation_parts() {
        let parts = parse_interpolation("Temp: ${ t.toFixed(1) }°C").unwrap();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], TemplatePart::Text("Temp: ".to_string()));
        assert!(matches!(parts[1], TemplatePart::Expr(Expr::Call { .. })));
        assert_eq!(parts[2], TemplatePart::Text("°C".to_string()));
    }

    #[test]
    fn interpolation_with_braces_inside() {
        let parts = parse_interpolation("${ {a: '}'}.a }!").unwrap();
        assert_eq!(parts.len(), 2);
    }

    #[test]
    fn unterminated_placeholder() {
        let err = parse_interpolation("x ${ 1 + 2").unwrap_err();
        assert!(matches!(err, TemplateError::Syntax { offset: 2, .. }));
    }

    fn parens(depth: usize) -> String {
        format!("{}1{}", "(".repeat(depth), ")".repeat(depth))
    }

    fn is_too_deep(err: &TemplateError) -> bool {
        matches!(
            err,
            TemplateError::Syntax { message, .. } if message.contains("nested too deeply")
        )
    }

    #[test]
    fn moderate_nesting_parses() {
        let expr = parse_expression(&parens(20)).unwrap();
        assert_eq!(expr, Expr::Literal(number(1.0)));
        assert!(parse_program(&format!("return {};", parens(20))).is_ok());
    }

    #[test]
    fn deep_parentheses_are_rejected() {
        let err = parse_program(&format!("return {}", parens(1000))).unwrap_err();
        assert!(is_too_deep(&err), "{err:?}");
    }

    #[test]
    fn deep_unary_and_blocks_are_rejected() {
        let err = parse_expression(&format!("{}1", "!".repeat(1000))).unwrap_err();
        assert!(is_too_deep(&err), "{err:?}");

        let blocks = format!("{}return 1;{}", "{".repeat(1000), "}".repeat(1000));
        assert!(is_too_deep(&parse_program(&blocks).unwrap_err()));

        let branches = "if (true) ".repeat(1000) + "return 1;";
        assert!(is_too_deep(&parse_program(&branches).unwrap_err()));
    }

    #[test]
    fn long_chains_are_rejected() {
        let sum = vec!["1"; 1000].join(" + ");
        assert!(is_too_deep(&parse_expression(&sum).unwrap_err()));

        let members = format!("a{}", ".b".repeat(1000));
        assert!(is_too_deep(&parse_expression(&members).unwrap_err()));

        let short = vec!["1"; 20].join(" + ");
        assert!(parse_expression(&short).is_ok());
    }

    #[test]
    fn nesting_carries_into_backtick_placeholders() {
        let inner = format!("`${{{}}}`", parens(1000));
        assert!(is_too_deep(&parse_expression(&inner).unwrap_err()));
    }

    #[test]
    fn backtick_literal() {
        let expr = parse_expression("`${a}%`").unwrap();
        let Expr::Template(parts) = expr else {
            panic!("expected template");
        };
        assert_eq!(parts[1], TemplatePart::Text("%".to_string()));
    }
}
