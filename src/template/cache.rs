// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Process-wide cache of compiled templates.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use parking_lot::RwLock;

use crate::error::TemplateError;

use super::evaluator::{CompiledTemplate, ExpressionEvaluator, SourceKind};

/// Identifies one compiled template: evaluator, syntax and exact source.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    evaluator: &'static str,
    kind: SourceKind,
    source: String,
}

/// Compiled templates keyed by their exact source text.
///
/// Only compiled evaluators are stored, never results: the same template
/// evaluated against a new context runs again. Compile failures are not
/// cached. Entries live until [`clear`](Self::clear).
///
/// # Examples
///
/// ```
/// use room_card::template::TemplateCache;
///
/// let cache = TemplateCache::global();
/// cache.clear();
/// assert!(cache.is_empty());
/// ```
#[derive(Debug, Default)]
pub struct TemplateCache {
    entries: RwLock<HashMap<CacheKey, Arc<dyn CompiledTemplate>>>,
}

impl TemplateCache {
    /// Returns the process-wide cache.
    ///
    /// Engines built with [`TemplateEngine::new`](super::TemplateEngine::new)
    /// share it.
    pub fn global() -> &'static Self {
        static CACHE: OnceLock<TemplateCache> = OnceLock::new();
        CACHE.get_or_init(Self::new)
    }

    /// Creates an empty, private cache.
    ///
    /// Prefer [`TemplateCache::global()`] outside of tests.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the compiled form of `source`, compiling it on a miss.
    ///
    /// # Errors
    ///
    /// Returns the compile error on a miss that fails to compile.
    pub fn get_or_compile(
        &self,
        evaluator: &dyn ExpressionEvaluator,
        source: &str,
        kind: SourceKind,
    ) -> Result<Arc<dyn CompiledTemplate>, TemplateError> {
        let key = CacheKey {
            evaluator: evaluator.name(),
            kind,
            source: source.to_string(),
        };

        if let Some(compiled) = self.entries.read().get(&key) {
            tracing::trace!(?kind, "Template cache hit");
            return Ok(Arc::clone(compiled));
        }

        tracing::debug!(?kind, len = source.len(), "Compiling template");
        let compiled = evaluator.compile(source, kind)?;
        self.entries
            .write()
            .entry(key)
            .or_insert_with(|| Arc::clone(&compiled));
        Ok(compiled)
    }

    /// Returns the number of cached templates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns `true` if nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Drops every cached template.
    pub fn clear(&self) {
        let mut entries = self.entries.write();
        tracing::debug!(count = entries.len(), "Clearing template cache");
        entries.clear();
    }
}
