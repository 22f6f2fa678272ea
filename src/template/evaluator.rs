// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The pluggable expression evaluator.
//!
//! [`TemplateEngine`](super::TemplateEngine) finds template syntax in
//! configuration values; an [`ExpressionEvaluator`] turns the source it
//! finds into something runnable. [`ScriptEvaluator`] is the built-in
//! restricted language: fixed bindings, a fixed helper set and no access to
//! anything else. It is not a security boundary; templates come from the
//! card author and are trusted as such.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::error::TemplateError;

use super::ast::{Stmt, TemplatePart};
use super::context::TemplateContext;
use super::interpreter::Interpreter;
use super::parser::{parse_interpolation, parse_program};

/// Which template syntax a source string came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    /// The body of a `[[[ ... ]]]` block.
    Block,
    /// A whole string containing `${...}` placeholders.
    Interpolation,
}

/// A compiled template, reusable across contexts.
pub trait CompiledTemplate: Send + Sync + fmt::Debug {
    /// Evaluates against `ctx`.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError`] if evaluation fails.
    fn evaluate(&self, ctx: &TemplateContext) -> Result<Value, TemplateError>;
}

/// Compiles template sources.
pub trait ExpressionEvaluator: Send + Sync {
    /// Short name; part of the compilation cache key.
    fn name(&self) -> &'static str;

    /// Compiles `source`.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError`] if the source does not parse.
    fn compile(
        &self,
        source: &str,
        kind: SourceKind,
    ) -> Result<Arc<dyn CompiledTemplate>, TemplateError>;
}

/// The built-in restricted expression language.
///
/// # Examples
///
/// ```
/// use room_card::template::{ExpressionEvaluator, ScriptEvaluator, SourceKind, TemplateContext};
///
/// let compiled = ScriptEvaluator.compile("return 6 * 7", SourceKind::Block).unwrap();
/// let value = compiled.evaluate(&TemplateContext::empty()).unwrap();
/// assert_eq!(value, 42);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScriptEvaluator;

impl ExpressionEvaluator for ScriptEvaluator {
    fn name(&self) -> &'static str {
        "script"
    }

    fn compile(
        &self,
        source: &str,
        kind: SourceKind,
    ) -> Result<Arc<dyn CompiledTemplate>, TemplateError> {
        let compiled = match kind {
            SourceKind::Block => Script::Block(parse_program(source)?),
            SourceKind::Interpolation => Script::Interpolation(parse_interpolation(source)?),
        };
        Ok(Arc::new(compiled))
    }
}

#[derive(Debug)]
enum Script {
    Block(Vec<Stmt>),
    Interpolation(Vec<TemplatePart>),
}

impl CompiledTemplate for Script {
    fn evaluate(&self, ctx: &TemplateContext) -> Result<Value, TemplateError> {
        let mut interpreter = Interpreter::new(ctx);
        match self {
            Self::Block(program) => interpreter.run(program),
            Self::Interpolation(parts) => interpreter.render(parts).map(Value::String),
        }
    }
}
