// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The read-only data an expression can see.

use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use serde_json::{Map, Value, json};

use crate::state::{EntityState, StateSnapshot};

/// Names bound in every evaluation scope, besides locals and helpers.
pub const CONTEXT_BINDINGS: [&str; 6] = ["hass", "states", "user", "config", "entity", "variables"];

/// Snapshot of everything a template may read.
///
/// Built once per render pass and never mutated during evaluation.
///
/// # Examples
///
/// ```
/// use room_card::state::{EntityState, StateSnapshot};
/// use room_card::template::TemplateContext;
///
/// let states = StateSnapshot::new().with(EntityState::new("sensor.temp", "21.5"));
/// let ctx = TemplateContext::new(states)
///     .with_entity("sensor.temp")
///     .with_variable("room", "Office");
///
/// assert_eq!(ctx.entity_id(), Some("sensor.temp"));
/// assert_eq!(ctx.binding("variables").unwrap()["room"], "Office");
/// ```
#[derive(Debug, Clone)]
pub struct TemplateContext {
    states: StateSnapshot,
    user: Option<Value>,
    config: Option<Value>,
    entity: Option<String>,
    variables: Map<String, Value>,
    now: DateTime<Utc>,
    states_json: OnceLock<Value>,
}

impl TemplateContext {
    /// Creates a context over a state snapshot, with `now` set to the
    /// current time.
    #[must_use]
    pub fn new(states: StateSnapshot) -> Self {
        Self {
            states,
            user: None,
            config: None,
            entity: None,
            variables: Map::new(),
            now: Utc::now(),
            states_json: OnceLock::new(),
        }
    }

    /// Creates a context with no entities, used for validation.
    #[must_use]
    pub fn empty() -> Self {
        Self::new(StateSnapshot::new())
    }

    /// Sets the current user object.
    #[must_use]
    pub fn with_user(mut self, user: Value) -> Self {
        self.user = Some(user);
        self
    }

    /// Sets the card configuration object.
    #[must_use]
    pub fn with_config(mut self, config: Value) -> Self {
        self.config = Some(config);
        self
    }

    /// Sets the target entity.
    #[must_use]
    pub fn with_entity(mut self, entity_id: impl Into<String>) -> Self {
        self.entity = Some(entity_id.into());
        self
    }

    /// Replaces all variables.
    #[must_use]
    pub fn with_variables(mut self, variables: Map<String, Value>) -> Self {
        self.variables = variables;
        self
    }

    /// Adds one variable.
    #[must_use]
    pub fn with_variable(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.variables.insert(name.into(), value.into());
        self
    }

    /// Sets the instant `relativeTime` measures from.
    #[must_use]
    pub fn with_now(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    /// Returns the state snapshot.
    #[must_use]
    pub fn states(&self) -> &StateSnapshot {
        &self.states
    }

    /// Returns the target entity id.
    #[must_use]
    pub fn entity_id(&self) -> Option<&str> {
        self.entity.as_deref()
    }

    /// Returns the target entity's state.
    #[must_use]
    pub fn entity(&self) -> Option<&EntityState> {
        self.entity.as_deref().and_then(|id| self.states.get(id))
    }

    /// Returns the reference instant.
    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    /// Returns the value bound to one of [`CONTEXT_BINDINGS`].
    #[must_use]
    pub fn binding(&self, name: &str) -> Option<Value> {
        let value = match name {
            "hass" => json!({
                "states": self.states_json(),
                "user": self.user.clone().unwrap_or(Value::Null),
            }),
            "states" => self.states_json().clone(),
            "user" => self.user.clone().unwrap_or(Value::Null),
            "config" => self.config.clone().unwrap_or(Value::Null),
            "entity" => self.entity().map_or(Value::Null, EntityState::to_json),
            "variables" => Value::Object(self.variables.clone()),
            _ => return None,
        };
        Some(value)
    }

    fn states_json(&self) -> &Value {
        self.states_json.get_or_init(|| self.states.to_json())
    }
}

impl Default for TemplateContext {
    fn default() -> Self {
        Self::empty()
    }
}
