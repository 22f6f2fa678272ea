// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Templates embedded in card configuration.
//!
//! Two syntaxes are recognized inside any configuration string:
//!
//! - `[[[ ... ]]]` blocks hold a small script (`const`, `if`, `return`, ...)
//!   whose result replaces the block in place.
//! - `${...}` placeholders turn the whole string into one interpolated
//!   template.
//!
//! Scripts see `hass`, `states`, `user`, `config`, `entity` and `variables`
//! plus the helpers listed in [`HELPER_NAMES`]. Compiled templates are kept
//! in a [`TemplateCache`], never their results.

mod ast;
mod cache;
mod context;
mod engine;
mod evaluator;
mod helpers;
mod interpreter;
mod lexer;
mod parser;
pub(crate) mod value;

pub use cache::TemplateCache;
pub use context::{CONTEXT_BINDINGS, TemplateContext};
pub use engine::{TemplateEngine, TemplateResult};
pub use evaluator::{CompiledTemplate, ExpressionEvaluator, ScriptEvaluator, SourceKind};
pub use helpers::{DEFAULT_DATE_FORMAT, HELPER_NAMES, is_helper, relative_time};
