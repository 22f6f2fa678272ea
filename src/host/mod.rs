// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Capabilities the dashboard host lends to the card.
//!
//! The card owns no device state and performs no I/O. It reads entities
//! through a [`StateProvider`], requests mutations through a
//! [`ServiceCaller`], hands declarative actions to an [`ActionDispatcher`]
//! and pulses the vibration motor through [`Haptics`]. All requests are
//! fire-and-forget: the new state arrives later as a fresh snapshot.

mod recording;

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::action::ActionDescriptor;
use crate::error::HostError;
use crate::state::{EntityState, StateSnapshot};

pub use recording::RecordingHost;

/// Read access to the host's entity store.
pub trait StateProvider {
    /// Looks up one entity.
    fn state(&self, entity_id: &str) -> Option<&EntityState>;

    /// Iterates over every known entity.
    fn entities(&self) -> Box<dyn Iterator<Item = &EntityState> + '_>;

    /// Copies every entity into an owned snapshot.
    fn to_snapshot(&self) -> StateSnapshot {
        self.entities().cloned().collect()
    }
}

impl StateProvider for StateSnapshot {
    fn state(&self, entity_id: &str) -> Option<&EntityState> {
        self.get(entity_id)
    }

    fn entities(&self) -> Box<dyn Iterator<Item = &EntityState> + '_> {
        Box::new(self.iter())
    }

    fn to_snapshot(&self) -> StateSnapshot {
        self.clone()
    }
}

/// A request for the host to run a domain service.
///
/// # Examples
///
/// ```
/// use room_card::host::ServiceCall;
///
/// let call = ServiceCall::new("light", "turn_on")
///     .with_entity("light.desk")
///     .with_data("brightness_pct", 40);
/// assert_eq!(call.to_string(), "light.turn_on");
/// assert_eq!(call.entity_id(), Some("light.desk"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceCall {
    /// Service domain, e.g. `light`.
    pub domain: String,
    /// Service name, e.g. `turn_on`.
    pub service: String,
    /// Service data.
    #[serde(default)]
    pub data: Map<String, Value>,
}

impl ServiceCall {
    /// Creates a call with no data.
    #[must_use]
    pub fn new(domain: impl Into<String>, service: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            service: service.into(),
            data: Map::new(),
        }
    }

    /// Targets an entity.
    #[must_use]
    pub fn with_entity(self, entity_id: impl Into<String>) -> Self {
        self.with_data("entity_id", entity_id.into())
    }

    /// Adds one data field.
    #[must_use]
    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    /// Returns the targeted entity, if any.
    #[must_use]
    pub fn entity_id(&self) -> Option<&str> {
        self.data.get("entity_id").and_then(Value::as_str)
    }
}

impl std::fmt::Display for ServiceCall {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.domain, self.service)
    }
}

/// Runs domain services on the host.
pub trait ServiceCaller: Send + Sync {
    /// Requests a service call.
    ///
    /// # Errors
    ///
    /// Returns [`HostError`] if the host refuses the call outright.
    fn call_service(&self, call: ServiceCall) -> Result<(), HostError>;
}

/// Executes declarative actions the card does not handle itself
/// (navigation, URLs, more-info dialogs).
pub trait ActionDispatcher: Send + Sync {
    /// Dispatches an action on behalf of `entity`.
    ///
    /// # Errors
    ///
    /// Returns [`HostError::Unsupported`] if the host cannot perform it.
    fn dispatch(&self, action: &ActionDescriptor, entity: Option<&str>) -> Result<(), HostError>;
}

/// Best-effort vibration.
pub trait Haptics: Send + Sync {
    /// Pulses for `pulse`. Does nothing where unsupported.
    fn vibrate(&self, pulse: Duration);
}

/// Everything the card needs from the host to act on user input.
///
/// Implemented for every type that provides the three capabilities.
pub trait Host: ServiceCaller + ActionDispatcher + Haptics {}

impl<T: ServiceCaller + ActionDispatcher + Haptics + ?Sized> Host for T {}

/// Haptics for runtimes without a vibration motor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoHaptics;

impl Haptics for NoHaptics {
    fn vibrate(&self, _pulse: Duration) {}
}
