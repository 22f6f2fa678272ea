// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Resolving templates embedded in configuration values.

use std::sync::{Arc, OnceLock};

use regex::{Captures, Regex};
use serde_json::{Map, Value};

use crate::error::TemplateError;

use super::cache::TemplateCache;
use super::context::TemplateContext;
use super::evaluator::{ExpressionEvaluator, ScriptEvaluator, SourceKind};
use super::value::to_text;

fn block_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?s)\[\[\[(.*?)\]\]\]").expect("static block pattern compiles")
    })
}

fn interpolation_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?s)\$\{.*?\}").expect("static interpolation pattern compiles")
    })
}

/// Returns `true` if `text` has interpolation outside of `[[[ ]]]` blocks.
fn has_interpolation(text: &str) -> bool {
    block_pattern()
        .split(text)
        .any(|outside| interpolation_pattern().is_match(outside))
}

fn string_has_template(text: &str) -> bool {
    block_pattern().is_match(text) || interpolation_pattern().is_match(text)
}

/// The outcome of [`TemplateEngine::process`].
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateResult {
    /// The resolved value; fragments that failed keep their original text.
    pub value: Value,
    /// Whether any template syntax was found.
    pub has_template: bool,
    /// The first error met, if any.
    pub error: Option<TemplateError>,
}

impl TemplateResult {
    fn plain(value: Value) -> Self {
        Self {
            value,
            has_template: false,
            error: None,
        }
    }

    /// Returns `true` if nothing failed.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    /// Returns the resolved value.
    #[must_use]
    pub fn into_value(self) -> Value {
        self.value
    }

    /// Folds a child result in, keeping the first error.
    fn absorb(&mut self, child: Self) -> Value {
        self.has_template |= child.has_template;
        if self.error.is_none() {
            self.error = child.error;
        }
        child.value
    }
}

#[derive(Debug, Clone)]
enum CacheRef {
    Global,
    Owned(Arc<TemplateCache>),
}

/// Resolves `[[[ ... ]]]` blocks and `${...}` interpolation in configuration
/// values.
///
/// Evaluation errors never escape: the failing fragment keeps its literal
/// text and the first error is reported on the [`TemplateResult`].
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use room_card::template::{TemplateContext, TemplateEngine};
///
/// let engine = TemplateEngine::new();
/// let ctx = TemplateContext::empty().with_variable("room", "Office");
///
/// let result = engine.process(&json!({
///     "title": "${variables.room}",
///     "badge": "Value: [[[ return 2 + 2 ]]]",
///     "icon": "mdi:sofa",
/// }), &ctx);
///
/// assert!(result.has_template);
/// assert_eq!(result.value["title"], "Office");
/// assert_eq!(result.value["badge"], "Value: 4");
/// assert_eq!(result.value["icon"], "mdi:sofa");
/// ```
#[derive(Clone)]
pub struct TemplateEngine {
    evaluator: Arc<dyn ExpressionEvaluator>,
    cache: CacheRef,
}

impl TemplateEngine {
    /// Creates an engine with the built-in evaluator and the global cache.
    #[must_use]
    pub fn new() -> Self {
        Self {
            evaluator: Arc::new(ScriptEvaluator),
            cache: CacheRef::Global,
        }
    }

    /// Uses another expression evaluator.
    #[must_use]
    pub fn with_evaluator(mut self, evaluator: Arc<dyn ExpressionEvaluator>) -> Self {
        self.evaluator = evaluator;
        self
    }

    /// Uses a private cache instead of the global one.
    #[must_use]
    pub fn with_cache(mut self, cache: Arc<TemplateCache>) -> Self {
        self.cache = CacheRef::Owned(cache);
        self
    }

    /// Returns the cache this engine compiles into.
    #[must_use]
    pub fn cache(&self) -> &TemplateCache {
        match &self.cache {
            CacheRef::Global => TemplateCache::global(),
            CacheRef::Owned(cache) => cache,
        }
    }

    /// Returns `true` if any string nested in `value` contains template
    /// syntax. Evaluates nothing.
    #[must_use]
    pub fn has_template(value: &Value) -> bool {
        match value {
            Value::String(text) => string_has_template(text),
            Value::Array(items) => items.iter().any(Self::has_template),
            Value::Object(map) => map.values().any(Self::has_template),
            _ => false,
        }
    }

    /// Resolves every template in `value` against `ctx`.
    ///
    /// Strings, arrays and objects are processed recursively, keeping key
    /// and element order; other values come back unchanged.
    #[must_use]
    pub fn process(&self, value: &Value, ctx: &TemplateContext) -> TemplateResult {
        match value {
            Value::String(text) => self.process_str(text, ctx),
            Value::Array(items) => {
                let mut result = TemplateResult::plain(Value::Null);
                let resolved: Vec<Value> = items
                    .iter()
                    .map(|item| result.absorb(self.process(item, ctx)))
                    .collect();
                result.value = Value::Array(resolved);
                result
            }
            Value::Object(map) => {
                let mut result = TemplateResult::plain(Value::Null);
                let resolved: Map<String, Value> = map
                    .iter()
                    .map(|(key, item)| (key.clone(), result.absorb(self.process(item, ctx))))
                    .collect();
                result.value = Value::Object(resolved);
                result
            }
            other => TemplateResult::plain(other.clone()),
        }
    }

    /// Resolves the templates in one string.
    #[must_use]
    pub fn process_str(&self, text: &str, ctx: &TemplateContext) -> TemplateResult {
        let has_blocks = block_pattern().is_match(text);
        let interpolate = has_interpolation(text);
        if !has_blocks && !interpolate {
            return TemplateResult::plain(Value::String(text.to_string()));
        }

        let mut error = None;
        let mut output = text.to_string();

        if has_blocks {
            output = block_pattern()
                .replace_all(text, |caps: &Captures<'_>| {
                    match self.evaluate(&caps[1], SourceKind::Block, ctx) {
                        Ok(value) => to_text(&value),
                        Err(e) => {
                            tracing::warn!(error = %e, "Template block failed, keeping its text");
                            error.get_or_insert(e);
                            caps[0].to_string()
                        }
                    }
                })
                .into_owned();
        }

        if interpolate {
            match self.evaluate(&output, SourceKind::Interpolation, ctx) {
                Ok(value) => output = to_text(&value),
                Err(e) => {
                    tracing::warn!(error = %e, "Template interpolation failed, keeping its text");
                    error.get_or_insert(e);
                }
            }
        }

        TemplateResult {
            value: Value::String(output),
            has_template: true,
            error,
        }
    }

    /// Checks that `template` resolves without error.
    ///
    /// Runs against `ctx` when given, else an empty context, so templates
    /// that read live entities may fail here and still work at render time.
    ///
    /// # Errors
    ///
    /// Returns the first [`TemplateError`] met.
    pub fn validate_template(
        &self,
        template: &str,
        ctx: Option<&TemplateContext>,
    ) -> Result<(), TemplateError> {
        let empty;
        let ctx = match ctx {
            Some(ctx) => ctx,
            None => {
                empty = TemplateContext::empty();
                &empty
            }
        };
        match self.process_str(template, ctx).error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn evaluate(
        &self,
        source: &str,
        kind: SourceKind,
        ctx: &TemplateContext,
    ) -> Result<Value, TemplateError> {
        let compiled = self
            .cache()
            .get_or_compile(self.evaluator.as_ref(), source, kind)?;
        compiled.evaluate(ctx)
    }
}

impl Default for TemplateEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TemplateEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemplateEngine")
            .field("evaluator", &self.evaluator.name())
            .field("cache", &self.cache)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::state::{EntityState, StateSnapshot};

    fn engine() -> TemplateEngine {
        TemplateEngine::new().with_cache(Arc::new(TemplateCache::new()))
    }

    fn ctx() -> TemplateContext {
        let states = StateSnapshot::new()
            .with(EntityState::new("sensor.temp", "22.5"))
            .with(EntityState::new("light.desk", "off"));
        TemplateContext::new(states).with_entity("light.desk")
    }

    #[test]
    fn block_replaced_in_place() {
        let result = engine().process(&json!("Value: [[[ return 2 + 2 ]]]"), &ctx());
        assert_eq!(result.value, json!("Value: 4"));
        assert!(result.has_template);
        assert!(result.is_ok());
    }

    #[test]
    fn malformed_block_keeps_text() {
        let source = "[[[ return ( ]]]";
        let result = engine().process(&json!(source), &ctx());
        assert_eq!(result.value, json!(source));
        assert!(result.has_template);
        assert!(result.error.is_some());
    }

    #[test]
    fn deeply_nested_block_keeps_text() {
        let depth = 1000;
        let block = format!(
            "[[[ return {}1{} ]]]",
            "(".repeat(depth),
            ")".repeat(depth)
        );
        let interpolated = format!("${{{}1{}}}", "(".repeat(depth), ")".repeat(depth));

        // Same stack size as a tokio worker thread.
        let results = std::thread::Builder::new()
            .stack_size(2 * 1024 * 1024)
            .spawn({
                let (block, interpolated) = (block.clone(), interpolated.clone());
                move || {
                    let engine = engine();
                    (
                        engine.process_str(&block, &ctx()),
                        engine.process_str(&interpolated, &ctx()),
                    )
                }
            })
            .unwrap()
            .join()
            .unwrap();

        assert_eq!(results.0.value, json!(block));
        assert!(matches!(results.0.error, Some(TemplateError::Syntax { .. })));
        assert_eq!(results.1.value, json!(interpolated));
        assert!(matches!(results.1.error, Some(TemplateError::Syntax { .. })));
    }

    #[test]
    fn each_block_fails_on_its_own() {
        let result = engine().process(
            &json!("[[[ return 1 ]]] / [[[ return nope ]]] / [[[ return 3 ]]]"),
            &ctx(),
        );
        assert_eq!(result.value, json!("1 / [[[ return nope ]]] / 3"));
        assert_eq!(result.error, Some(TemplateError::Undefined("nope".into())));
    }

    #[test]
    fn interpolation_failure_keeps_whole_string() {
        let source = "A ${states['sensor.temp'].state} B ${missing.x}";
        let result = engine().process(&json!(source), &ctx());
        assert_eq!(result.value, json!(source));
        assert!(result.error.is_some());
    }

    #[test]
    fn both_syntaxes_in_one_string() {
        let result = engine().process(
            &json!("[[[ return entity.state.toUpperCase() ]]] at ${states['sensor.temp'].state}°"),
            &ctx(),
        );
        assert_eq!(result.value, json!("OFF at 22.5°"));
    }

    #[test]
    fn non_strings_pass_through() {
        let result = engine().process(&json!(42), &ctx());
        assert_eq!(result, TemplateResult::plain(json!(42)));
        let result = engine().process(&json!("plain"), &ctx());
        assert!(!result.has_template);
    }

    #[test]
    fn nested_structures_keep_order_and_first_error() {
        let input = json!({
            "z": "[[[ return bad1 ]]]",
            "a": ["x", "[[[ return bad2 ]]]", "[[[ return 'ok' ]]]"],
            "m": 1,
        });
        let result = engine().process(&input, &ctx());
        let keys: Vec<&String> = result.value.as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["z", "a", "m"]);
        assert_eq!(result.value["a"][2], "ok");
        assert_eq!(result.error, Some(TemplateError::Undefined("bad1".into())));
    }

    #[test]
    fn has_template_is_recursive() {
        assert!(!TemplateEngine::has_template(&json!({"a": ["b", {"c": 1}]})));
        assert!(TemplateEngine::has_template(&json!({"a": ["b", {"c": "${x}"}]})));
        assert!(!TemplateEngine::has_template(&json!("[[[ broken")));
        assert!(!TemplateEngine::has_template(&json!(null)));
        assert!(TemplateEngine::has_template(&json!([[["[[[ 1 ]]]"]]])));
    }

    #[test]
    fn validate_template_reports() {
        let engine = engine();
        assert!(engine.validate_template("[[[ return 1 + 1 ]]]", None).is_ok());
        assert!(engine.validate_template("[[[ return ( ]]]", None).is_err());
        assert!(
            engine
                .validate_template("${states['sensor.temp'].state}", None)
                .is_err()
        );
        assert!(
            engine
                .validate_template("${states['sensor.temp'].state}", Some(&ctx()))
                .is_ok()
        );
    }

    #[test]
    fn same_template_new_context() {
        let engine = engine();
        let source = json!("${variables.n}");
        let one = TemplateContext::empty().with_variable("n", 1);
        let two = TemplateContext::empty().with_variable("n", 2);
        assert_eq!(engine.process(&source, &one).value, json!("1"));
        assert_eq!(engine.process(&source, &two).value, json!("2"));
        assert_eq!(engine.cache().len(), 1);
    }
}
