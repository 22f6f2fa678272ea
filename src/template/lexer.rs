// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Tokens of the expression language.

use std::ops::Range;

use logos::Logos;

use crate::error::TemplateError;

/// All token kinds of the expression language.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[logos(skip r"[ \t\r\n\f]+")]
#[logos(skip(r"//[^\r\n]*", allow_greedy = true))]
#[logos(skip r"/\*([^*]|\*+[^*/])*\*+/")]
pub(crate) enum TokenKind {
    // =========================================================================
    // PUNCTUATION
    // =========================================================================
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token(",")]
    Comma,
    #[token(";")]
    Semicolon,
    #[token(":")]
    Colon,
    #[token(".")]
    Dot,
    #[token("?")]
    Question,
    #[token("?.")]
    QuestionDot,

    // =========================================================================
    // OPERATORS
    // =========================================================================
    #[token("=")]
    Assign,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,
    #[token("!")]
    Bang,
    #[token("==")]
    EqEq,
    #[token("!=")]
    NotEq,
    #[token("===")]
    EqEqEq,
    #[token("!==")]
    NotEqEq,
    #[token("<")]
    Lt,
    #[token("<=")]
    LtEq,
    #[token(">")]
    Gt,
    #[token(">=")]
    GtEq,
    #[token("&&")]
    AndAnd,
    #[token("||")]
    OrOr,
    #[token("??")]
    Nullish,

    // =========================================================================
    // KEYWORDS
    // =========================================================================
    #[token("const")]
    Const,
    #[token("let")]
    Let,
    #[token("var")]
    Var,
    #[token("if")]
    If,
    #[token("else")]
    Else,
    #[token("return")]
    Return,
    #[token("true")]
    True,
    #[token("false")]
    False,
    #[token("null")]
    Null,
    #[token("undefined")]
    Undefined,

    // =========================================================================
    // LITERALS
    // =========================================================================
    #[regex(r"[0-9]+(\.[0-9]*)?([eE][+-]?[0-9]+)?")]
    #[regex(r"\.[0-9]+([eE][+-]?[0-9]+)?")]
    Number,

    #[regex(r#""([^"\\\r\n]|\\.)*""#)]
    #[regex(r"'([^'\\\r\n]|\\.)*'")]
    String,

    /// A backtick template literal; `${...}` parts are parsed separately.
    #[regex(r"`([^`\\]|\\.)*`")]
    Template,

    #[regex(r"[A-Za-z_$][A-Za-z0-9_$]*")]
    Ident,
}

impl TokenKind {
    /// Returns a short description for error messages.
    pub(crate) fn describe(self) -> &'static str {
        match self {
            Self::LParen => "'('",
            Self::RParen => "')'",
            Self::LBracket => "'['",
            Self::RBracket => "']'",
            Self::LBrace => "'{'",
            Self::RBrace => "'}'",
            Self::Comma => "','",
            Self::Semicolon => "';'",
            Self::Colon => "':'",
            Self::Dot => "'.'",
            Self::Question => "'?'",
            Self::QuestionDot => "'?.'",
            Self::Number => "number",
            Self::String | Self::Template => "string",
            Self::Ident => "identifier",
            _ => "operator or keyword",
        }
    }
}

/// A token and its byte range in the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Token {
    pub(crate) kind: TokenKind,
    pub(crate) span: Range<usize>,
}

/// Splits `source` into tokens.
///
/// # Errors
///
/// Returns [`TemplateError::Lex`] at the first unrecognized character.
pub(crate) fn tokenize(source: &str) -> Result<Vec<Token>, TemplateError> {
    let mut lexer = TokenKind::lexer(source);
    let mut tokens = Vec::new();

    while let Some(kind) = lexer.next() {
        let span = lexer.span();
        match kind {
            Ok(kind) => tokens.push(Token { kind, span }),
            Err(()) => {
                return Err(TemplateError::Lex {
                    offset: span.start,
                    text: lexer.slice().to_string(),
                });
            }
        }
    }

    Ok(tokens)
}

/// Decodes the body of a quoted string literal (without its quotes).
pub(crate) fn unescape(body: &str) -> String {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }

    out
}
