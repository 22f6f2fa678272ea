// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The room descriptor.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ConfigError;
use crate::types::{CssColor, TemperatureBand};

use super::device::{DeviceConfig, DeviceDescriptor};

/// The card configuration as the author writes it.
///
/// Deserialize it with serde, then call [`validate`](Self::validate) before
/// use; [`RoomConfig::load`] does both.
///
/// # Examples
///
/// ```
/// use room_card::config::{DeviceConfig, RoomConfig};
///
/// let room = RoomConfig::new("Living room")
///     .with_temperature_sensor("sensor.living_temperature")
///     .with_device(DeviceConfig::new("light.ceiling", "light"))
///     .validate()
///     .unwrap();
///
/// assert_eq!(room.devices.len(), 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoomConfig {
    /// Room name; may contain templates.
    #[serde(default)]
    pub name: String,
    /// Sensor whose state is the room temperature.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature_sensor: Option<String>,
    /// Sensor whose state is the room humidity.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub humidity_sensor: Option<String>,
    /// Background color per temperature band; all five bands when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_colors: Option<BTreeMap<String, String>>,
    /// Devices in display order.
    #[serde(default)]
    pub devices: Vec<DeviceConfig>,
}

impl RoomConfig {
    /// Creates a configuration for a room without sensors or devices.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Parses a configuration without validating it.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Malformed`] if the JSON does not match the
    /// configuration shape.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Converts a JSON value without validating it.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Malformed`] if the value does not match the
    /// configuration shape.
    pub fn from_value(value: Value) -> Result<Self, ConfigError> {
        Ok(serde_json::from_value(value)?)
    }

    /// Parses and validates a configuration.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] met.
    pub fn load(json: &str) -> Result<RoomDescriptor, ConfigError> {
        Self::from_json(json)?.validate()
    }

    /// Sets the temperature sensor.
    #[must_use]
    pub fn with_temperature_sensor(mut self, entity: impl Into<String>) -> Self {
        self.temperature_sensor = Some(entity.into());
        self
    }

    /// Sets the humidity sensor.
    #[must_use]
    pub fn with_humidity_sensor(mut self, entity: impl Into<String>) -> Self {
        self.humidity_sensor = Some(entity.into());
        self
    }

    /// Sets the background color of one band.
    #[must_use]
    pub fn with_background_color(
        mut self,
        band: TemperatureBand,
        color: impl Into<String>,
    ) -> Self {
        self.background_colors
            .get_or_insert_with(BTreeMap::new)
            .insert(band.as_str().to_string(), color.into());
        self
    }

    /// Appends a device.
    #[must_use]
    pub fn with_device(mut self, device: DeviceConfig) -> Self {
        self.devices.push(device);
        self
    }

    /// Checks the configuration and converts it into a [`RoomDescriptor`].
    ///
    /// # Errors
    ///
    /// - [`ConfigError::MissingField`] for an empty name, an empty device
    ///   entity or kind, or a background color mapping missing a band
    /// - [`ConfigError::InvalidColor`] for an unknown band key or a
    ///   malformed color
    /// - any error of [`DeviceConfig::validate`]
    pub fn validate(&self) -> Result<RoomDescriptor, ConfigError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(ConfigError::MissingField("name".to_string()));
        }

        let background_colors = match &self.background_colors {
            Some(colors) => BandColors::from_config(colors)?,
            None => BandColors::default(),
        };

        let devices = self
            .devices
            .iter()
            .enumerate()
            .map(|(position, device)| device.validate(position))
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!(room = name, devices = devices.len(), "Room configuration validated");

        Ok(RoomDescriptor {
            name: name.to_string(),
            temperature_sensor: non_empty(self.temperature_sensor.as_deref()),
            humidity_sensor: non_empty(self.humidity_sensor.as_deref()),
            background_colors,
            devices,
        })
    }
}

fn non_empty(entity: Option<&str>) -> Option<String> {
    entity
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .map(str::to_string)
}

/// Display color for each temperature band.
#[derive(Debug, Clone, PartialEq)]
pub struct BandColors([CssColor; 5]);

impl BandColors {
    fn from_config(colors: &BTreeMap<String, String>) -> Result<Self, ConfigError> {
        for key in colors.keys() {
            key.parse::<TemperatureBand>()
                .map_err(|source| ConfigError::InvalidColor {
                    band: key.clone(),
                    source,
                })?;
        }

        let mut parsed = Self::default();
        for band in TemperatureBand::ALL {
            let raw = colors
                .iter()
                .find(|(key, _)| key.trim().eq_ignore_ascii_case(band.as_str()))
                .map(|(_, color)| color)
                .ok_or_else(|| {
                    ConfigError::MissingField(format!("background_colors.{band}"))
                })?;
            parsed.0[band as usize] = raw.parse().map_err(|source| ConfigError::InvalidColor {
                band: band.to_string(),
                source,
            })?;
        }
        Ok(parsed)
    }

    /// Returns the color of `band`.
    #[must_use]
    pub fn get(&self, band: TemperatureBand) -> &CssColor {
        &self.0[band as usize]
    }
}

impl Default for BandColors {
    fn default() -> Self {
        Self(TemperatureBand::ALL.map(TemperatureBand::default_color))
    }
}

/// A validated room.
#[derive(Debug, Clone, PartialEq)]
pub struct RoomDescriptor {
    /// Room name, possibly templated.
    pub name: String,
    /// Temperature sensor entity.
    pub temperature_sensor: Option<String>,
    /// Humidity sensor entity.
    pub humidity_sensor: Option<String>,
    /// Background colors by band.
    pub background_colors: BandColors,
    /// Devices in display order.
    pub devices: Vec<DeviceDescriptor>,
}

impl RoomDescriptor {
    /// Looks up a device by entity.
    #[must_use]
    pub fn device(&self, entity: &str) -> Option<&DeviceDescriptor> {
        self.devices.iter().find(|d| d.entity == entity)
    }
}
