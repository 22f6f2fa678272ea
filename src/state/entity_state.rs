// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Host-reported entity state and the snapshot the card renders from.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// State string the host reports for a device it cannot reach.
pub const STATE_UNAVAILABLE: &str = "unavailable";

/// State string the host reports for a device that is off.
pub const STATE_OFF: &str = "off";

/// One entity as reported by the host.
///
/// # Examples
///
/// ```
/// use room_card::state::EntityState;
///
/// let lamp = EntityState::new("light.desk", "on").with_attribute("brightness", 128);
/// assert!(lamp.is_on());
/// assert_eq!(lamp.attribute_f64("brightness"), Some(128.0));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityState {
    /// The host's entity identifier, e.g. `light.living_room`.
    pub entity_id: String,
    /// The raw state string.
    pub state: String,
    /// Entity attributes.
    #[serde(default)]
    pub attributes: Map<String, Value>,
    /// When the state string last changed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_changed: Option<DateTime<Utc>>,
}

impl EntityState {
    /// Creates an entity state with no attributes.
    #[must_use]
    pub fn new(entity_id: impl Into<String>, state: impl Into<String>) -> Self {
        Self {
            entity_id: entity_id.into(),
            state: state.into(),
            attributes: Map::new(),
            last_changed: None,
        }
    }

    /// Adds an attribute.
    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Sets the last-changed timestamp.
    #[must_use]
    pub fn with_last_changed(mut self, at: DateTime<Utc>) -> Self {
        self.last_changed = Some(at);
        self
    }

    /// Returns the entity's domain (the part before the first dot).
    #[must_use]
    pub fn domain(&self) -> &str {
        self.entity_id
            .split_once('.')
            .map_or(self.entity_id.as_str(), |(domain, _)| domain)
    }

    /// Returns `true` unless the state is `off` or `unavailable`.
    #[must_use]
    pub fn is_on(&self) -> bool {
        self.state != STATE_OFF && self.state != STATE_UNAVAILABLE
    }

    /// Returns `true` unless the state is `unavailable`.
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.state != STATE_UNAVAILABLE
    }

    /// Returns an attribute.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    /// Returns an attribute as a number.
    ///
    /// Numeric strings are accepted since many integrations report them.
    #[must_use]
    pub fn attribute_f64(&self, name: &str) -> Option<f64> {
        self.attribute(name).and_then(value_as_f64)
    }

    /// Returns an attribute as a string slice.
    #[must_use]
    pub fn attribute_str(&self, name: &str) -> Option<&str> {
        self.attribute(name).and_then(Value::as_str)
    }

    /// Returns the state string as a number, if it is one.
    #[must_use]
    pub fn state_f64(&self) -> Option<f64> {
        self.state.trim().parse::<f64>().ok().filter(|v| v.is_finite())
    }

    /// Converts the entity to the JSON shape templates see.
    #[must_use]
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

fn value_as_f64(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    number.filter(|v| v.is_finite())
}

/// A read-only view of every entity the host knows, taken at one instant.
///
/// The card never mutates a snapshot; the host hands over a new one on
/// every state tick.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateSnapshot {
    states: HashMap<String, EntityState>,
}

impl StateSnapshot {
    /// Creates an empty snapshot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces an entity, returning the snapshot for chaining.
    #[must_use]
    pub fn with(mut self, state: EntityState) -> Self {
        self.insert(state);
        self
    }

    /// Adds or replaces an entity.
    pub fn insert(&mut self, state: EntityState) {
        self.states.insert(state.entity_id.clone(), state);
    }

    /// Looks up an entity.
    #[must_use]
    pub fn get(&self, entity_id: &str) -> Option<&EntityState> {
        self.states.get(entity_id)
    }

    /// Returns the number of entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.states.len()
    }

    /// Returns `true` if the snapshot is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Iterates over all entities in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = &EntityState> {
        self.states.values()
    }

    /// Converts the snapshot to a JSON object keyed by entity id.
    #[must_use]
    pub fn to_json(&self) -> Value {
        let mut ids: Vec<&String> = self.states.keys().collect();
        ids.sort();
        Value::Object(
            ids.into_iter()
                .map(|id| (id.clone(), self.states[id].to_json()))
                .collect(),
        )
    }
}

impl FromIterator<EntityState> for StateSnapshot {
    fn from_iter<I: IntoIterator<Item = EntityState>>(iter: I) -> Self {
        let mut snapshot = Self::new();
        for state in iter {
            snapshot.insert(state);
        }
        snapshot
    }
}
