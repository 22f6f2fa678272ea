// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device entries of the room configuration.

use serde::{Deserialize, Serialize};

use crate::action::{ActionDescriptor, ActionSet};
use crate::error::ConfigError;
use crate::state::ControlSpec;
use crate::types::{ControlMode, DeviceKind, ValueRange};

/// One device entry as the card author writes it.
///
/// Enumerations are kept as raw strings so a typo is reported by
/// [`validate`](Self::validate) with the offending value instead of a
/// generic parse failure.
///
/// # Examples
///
/// ```
/// use room_card::config::DeviceConfig;
///
/// let fan = DeviceConfig::new("fan.bedroom", "fan")
///     .with_name("Ceiling fan")
///     .with_modes(["low", "medium", "high"]);
///
/// let device = fan.validate(0).unwrap();
/// assert_eq!(device.control.modes().unwrap().len(), 3);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Host entity identifier.
    #[serde(default)]
    pub entity: String,
    /// Display name; may contain templates.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Device kind (`light`, `fan`, ...).
    #[serde(default, rename = "type", alias = "kind")]
    pub kind: String,
    /// `continuous` (default) or `discrete`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub control_mode: Option<String>,
    /// Lower bound of a continuous control.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_value: Option<f64>,
    /// Upper bound of a continuous control.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_value: Option<f64>,
    /// Step of a continuous control.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<f64>,
    /// Labels of a discrete control.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub modes: Vec<String>,
    /// Attribute the current value is read from, overriding the kind's.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribute: Option<String>,
    /// Tap, hold and double-tap actions.
    #[serde(flatten)]
    pub actions: ActionSet,
}

impl DeviceConfig {
    /// Creates an entry for `entity` of the given kind.
    #[must_use]
    pub fn new(entity: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            kind: kind.into(),
            ..Self::default()
        }
    }

    /// Sets the display name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Makes the control continuous over `[min, max]`.
    #[must_use]
    pub fn with_range(mut self, min: f64, max: f64, step: f64) -> Self {
        self.control_mode = Some(ControlMode::Continuous.as_str().to_string());
        self.min_value = Some(min);
        self.max_value = Some(max);
        self.step = Some(step);
        self
    }

    /// Makes the control discrete over `modes`.
    #[must_use]
    pub fn with_modes<I, S>(mut self, modes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.control_mode = Some(ControlMode::Discrete.as_str().to_string());
        self.modes = modes.into_iter().map(Into::into).collect();
        self
    }

    /// Reads the current value from `attribute`.
    #[must_use]
    pub fn with_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.attribute = Some(attribute.into());
        self
    }

    /// Sets the tap action.
    #[must_use]
    pub fn with_tap_action(mut self, action: ActionDescriptor) -> Self {
        self.actions.tap = Some(action);
        self
    }

    /// Sets the hold action.
    #[must_use]
    pub fn with_hold_action(mut self, action: ActionDescriptor) -> Self {
        self.actions.hold = Some(action);
        self
    }

    /// Sets the double-tap action.
    #[must_use]
    pub fn with_double_tap_action(mut self, action: ActionDescriptor) -> Self {
        self.actions.double_tap = Some(action);
        self
    }

    /// Checks the entry and converts it into a [`DeviceDescriptor`].
    ///
    /// `position` is the entry's index in the device list and only names
    /// the offending field in errors.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::MissingField`] if the entity or kind is empty
    /// - [`ConfigError::UnknownKind`] / [`ConfigError::UnknownControlMode`]
    ///   for unrecognized strings
    /// - [`ConfigError::InvalidDevice`] if `min_value >= max_value`, the step
    ///   is not positive or a discrete control has no modes
    pub fn validate(&self, position: usize) -> Result<DeviceDescriptor, ConfigError> {
        let entity = self.entity.trim();
        if entity.is_empty() {
            return Err(ConfigError::MissingField(format!(
                "devices[{position}].entity"
            )));
        }
        if self.kind.trim().is_empty() {
            return Err(ConfigError::MissingField(format!("devices[{position}].type")));
        }

        let kind: DeviceKind = self.kind.trim().parse()?;
        let mode = match &self.control_mode {
            Some(mode) => mode.trim().parse()?,
            None => ControlMode::default(),
        };

        let invalid = |source| ConfigError::InvalidDevice {
            entity: entity.to_string(),
            source,
        };
        let control = match mode {
            ControlMode::Continuous => {
                let defaults = ValueRange::default();
                let range = ValueRange::new(
                    self.min_value.unwrap_or(defaults.min()),
                    self.max_value.unwrap_or(defaults.max()),
                    self.step.unwrap_or(defaults.step()),
                )
                .map_err(invalid)?;
                ControlSpec::Continuous(range)
            }
            ControlMode::Discrete => {
                ControlSpec::discrete(self.modes.clone()).map_err(invalid)?
            }
        };

        if let Some(modes) = control.modes()
            && has_duplicates(modes)
        {
            tracing::warn!(entity, "Mode list has duplicate labels; host values match the first");
        }

        Ok(DeviceDescriptor {
            entity: entity.to_string(),
            name: self.name.clone().filter(|name| !name.trim().is_empty()),
            kind,
            control,
            attribute: self.attribute.clone().filter(|a| !a.trim().is_empty()),
            actions: self.actions.clone(),
        })
    }
}

fn has_duplicates(modes: &[String]) -> bool {
    modes
        .iter()
        .enumerate()
        .any(|(i, label)| modes[..i].contains(label))
}

/// A validated device entry.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceDescriptor {
    /// Host entity identifier.
    pub entity: String,
    /// Display name, possibly templated; `None` falls back to the host's
    /// friendly name.
    pub name: Option<String>,
    /// Device kind.
    pub kind: DeviceKind,
    /// Value model.
    pub control: ControlSpec,
    /// Explicit value attribute.
    pub attribute: Option<String>,
    /// Gesture actions.
    pub actions: ActionSet,
}

impl DeviceDescriptor {
    /// Returns the attribute the current value is read from.
    ///
    /// `None` means the entity state itself.
    #[must_use]
    pub fn value_attribute(&self) -> Option<&str> {
        self.attribute
            .as_deref()
            .or_else(|| self.kind.default_attribute(self.control.mode()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValueError;

    #[test]
    fn continuous_defaults_to_percent() {
        let device = DeviceConfig::new("light.desk", "light").validate(0).unwrap();
        assert_eq!(device.control, ControlSpec::Continuous(ValueRange::PERCENT));
        assert_eq!(device.value_attribute(), Some("brightness"));
    }

    #[test]
    fn equal_bounds_rejected() {
        let err = DeviceConfig::new("climate.hall", "climate")
            .with_range(20.0, 20.0, 0.5)
            .validate(0)
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidDevice {
                source: ValueError::InvalidRange { .. },
                ..
            }
        ));

        let ok = DeviceConfig::new("climate.hall", "climate")
            .with_range(16.0, 30.0, 0.5)
            .validate(0);
        assert!(ok.is_ok());
    }

    #[test]
    fn overflowing_span_rejected() {
        let err = DeviceConfig::new("light.a", "light")
            .with_range(-1e308, 1e308, 1.0)
            .validate(0)
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidDevice {
                source: ValueError::InvalidRange { .. },
                ..
            }
        ));
    }

    #[test]
    fn non_positive_step_rejected() {
        let err = DeviceConfig::new("fan.a", "fan")
            .with_range(0.0, 100.0, 0.0)
            .validate(0)
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidDevice {
                source: ValueError::InvalidStep(_),
                ..
            }
        ));
    }

    #[test]
    fn discrete_needs_modes() {
        let mut config = DeviceConfig::new("fan.a", "fan").with_modes(Vec::<String>::new());
        let err = config.validate(0).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidDevice {
                source: ValueError::EmptyModes,
                ..
            }
        ));
        config.modes = vec!["eco".to_string()];
        assert!(config.validate(0).is_ok());
    }

    #[test]
    fn unknown_enumerations_rejected() {
        let err = DeviceConfig::new("toaster.kitchen", "toaster")
            .validate(0)
            .unwrap_err();
        assert!(matches!(err, ConfigError::UnknownKind(kind) if kind == "toaster"));

        let mut config = DeviceConfig::new("fan.a", "fan");
        config.control_mode = Some("stepped".to_string());
        assert!(matches!(
            config.validate(0),
            Err(ConfigError::UnknownControlMode(_))
        ));
    }

    #[test]
    fn missing_entity_names_position() {
        let err = DeviceConfig::new("  ", "light").validate(3).unwrap_err();
        assert!(matches!(err, ConfigError::MissingField(field) if field == "devices[3].entity"));
    }

    #[test]
    fn attribute_override_wins() {
        let device = DeviceConfig::new("climate.hall", "climate")
            .with_range(10.0, 30.0, 0.5)
            .with_attribute("target_temp_high")
            .validate(0)
            .unwrap();
        assert_eq!(device.value_attribute(), Some("target_temp_high"));
    }

    #[test]
    fn deserializes_with_flattened_actions() {
        let config: DeviceConfig = serde_json::from_value(serde_json::json!({
            "entity": "media_player.kitchen",
            "type": "speaker",
            "hold_action": {"action": "more-info"},
        }))
        .unwrap();
        assert_eq!(config.kind, "speaker");
        assert!(config.actions.hold_enabled());
        assert!(!config.actions.double_tap_enabled());
    }
}
