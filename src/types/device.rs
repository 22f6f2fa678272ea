// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device kinds and the two value models a device can be driven with.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ValueError};

/// The kind of device a card entry controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceKind {
    /// A dimmable light.
    Light,
    /// A media player with volume.
    Speaker,
    /// An air purifier (fan domain).
    Purifier,
    /// A fan.
    Fan,
    /// A thermostat.
    Climate,
    /// A plain on/off switch.
    Switch,
    /// A blind, shutter or garage door.
    Cover,
    /// A robot vacuum.
    Vacuum,
}

impl DeviceKind {
    /// Every known kind.
    pub const ALL: [Self; 8] = [
        Self::Light,
        Self::Speaker,
        Self::Purifier,
        Self::Fan,
        Self::Climate,
        Self::Switch,
        Self::Cover,
        Self::Vacuum,
    ];

    /// Returns the host domain commands for this kind are sent to.
    #[must_use]
    pub const fn domain(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Speaker => "media_player",
            Self::Purifier | Self::Fan => "fan",
            Self::Climate => "climate",
            Self::Switch => "switch",
            Self::Cover => "cover",
            Self::Vacuum => "vacuum",
        }
    }

    /// Returns the configuration name of the kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Speaker => "speaker",
            Self::Purifier => "purifier",
            Self::Fan => "fan",
            Self::Climate => "climate",
            Self::Switch => "switch",
            Self::Cover => "cover",
            Self::Vacuum => "vacuum",
        }
    }

    /// Returns the attribute the current value is read from by default.
    ///
    /// `None` means the value is read from the entity state itself.
    #[must_use]
    pub const fn default_attribute(self, mode: ControlMode) -> Option<&'static str> {
        match (self, mode) {
            (Self::Light, ControlMode::Continuous) => Some("brightness"),
            (Self::Light, ControlMode::Discrete) => Some("effect"),
            (Self::Speaker, ControlMode::Continuous) => Some("volume_level"),
            (Self::Speaker, ControlMode::Discrete) => Some("source"),
            (Self::Purifier | Self::Fan, ControlMode::Continuous) => Some("percentage"),
            (Self::Purifier | Self::Fan, ControlMode::Discrete) => Some("preset_mode"),
            (Self::Climate, ControlMode::Continuous) => Some("temperature"),
            (Self::Cover, ControlMode::Continuous) => Some("current_position"),
            (Self::Vacuum, _) => Some("fan_speed"),
            (Self::Climate | Self::Cover | Self::Switch, _) => None,
        }
    }
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeviceKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| ConfigError::UnknownKind(s.to_string()))
    }
}

/// How a device's value is picked on the circular control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlMode {
    /// A numeric value between a minimum and a maximum.
    #[default]
    Continuous,
    /// One label out of an ordered list.
    Discrete,
}

impl ControlMode {
    /// Returns the configuration name of the mode.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Continuous => "continuous",
            Self::Discrete => "discrete",
        }
    }
}

impl FromStr for ControlMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "continuous" => Ok(Self::Continuous),
            "discrete" => Ok(Self::Discrete),
            other => Err(ConfigError::UnknownControlMode(other.to_string())),
        }
    }
}

/// A validated numeric range with `min < max` and `step > 0`.
///
/// # Examples
///
/// ```
/// use room_card::types::ValueRange;
///
/// let range = ValueRange::new(0.0, 100.0, 5.0).unwrap();
/// assert_eq!(range.snap(42.0), 40.0);
/// assert!(ValueRange::new(10.0, 10.0, 1.0).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawRange")]
pub struct ValueRange {
    min: f64,
    max: f64,
    step: f64,
}

/// Unchecked wire form of [`ValueRange`].
#[derive(Deserialize)]
struct RawRange {
    min: f64,
    max: f64,
    step: f64,
}

impl TryFrom<RawRange> for ValueRange {
    type Error = ValueError;

    fn try_from(raw: RawRange) -> Result<Self, Self::Error> {
        Self::new(raw.min, raw.max, raw.step)
    }
}

impl ValueRange {
    /// The range used when a continuous device declares none.
    pub const PERCENT: Self = Self {
        min: 0.0,
        max: 100.0,
        step: 1.0,
    };

    /// Creates a range.
    ///
    /// # Errors
    ///
    /// Returns [`ValueError::InvalidRange`] unless `min < max` with a finite
    /// span between them, and [`ValueError::InvalidStep`] unless `step` is a
    /// positive finite number.
    pub fn new(min: f64, max: f64, step: f64) -> Result<Self, ValueError> {
        if !min.is_finite() {
            return Err(ValueError::NotFinite(min));
        }
        if !max.is_finite() {
            return Err(ValueError::NotFinite(max));
        }
        if min >= max || !(max - min).is_finite() {
            return Err(ValueError::InvalidRange { min, max });
        }
        if !(step.is_finite() && step > 0.0) {
            return Err(ValueError::InvalidStep(step));
        }
        Ok(Self { min, max, step })
    }

    /// Lower bound.
    #[must_use]
    pub const fn min(&self) -> f64 {
        self.min
    }

    /// Upper bound.
    #[must_use]
    pub const fn max(&self) -> f64 {
        self.max
    }

    /// Step between selectable values.
    #[must_use]
    pub const fn step(&self) -> f64 {
        self.step
    }

    /// Width of the range.
    #[must_use]
    pub fn span(&self) -> f64 {
        self.max - self.min
    }

    /// Clamps a value into the range.
    #[must_use]
    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.min, self.max)
    }

    /// Clamps a value into the range and snaps it to the nearest step.
    #[must_use]
    pub fn snap(&self, value: f64) -> f64 {
        let steps = ((self.clamp(value) - self.min) / self.step).round();
        self.clamp(self.min + steps * self.step)
    }
}

impl Default for ValueRange {
    fn default() -> Self {
        Self::PERCENT
    }
}

/// A discrete mode picked by position.
///
/// Carrying the index alongside the label keeps duplicate labels apart:
/// `["low", "low", "high"]` has two distinct `low` selections.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModeSelection {
    /// The mode label sent to the host.
    pub label: String,
    /// Position of the label in the mode list.
    pub index: usize,
}

impl ModeSelection {
    /// Creates a selection.
    #[must_use]
    pub fn new(label: impl Into<String>, index: usize) -> Self {
        Self {
            label: label.into(),
            index,
        }
    }

    /// Finds the first position of `label` in `modes`.
    #[must_use]
    pub fn find(modes: &[String], label: &str) -> Option<Self> {
        modes
            .iter()
            .position(|m| m == label)
            .map(|index| Self::new(label, index))
    }
}

impl fmt::Display for ModeSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}

/// A device value, always matching the device's [`ControlMode`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DeviceValue {
    /// A continuous numeric value.
    Number(f64),
    /// A discrete mode.
    Mode(ModeSelection),
}

impl DeviceValue {
    /// Returns the control mode this value belongs to.
    #[must_use]
    pub const fn mode(&self) -> ControlMode {
        match self {
            Self::Number(_) => ControlMode::Continuous,
            Self::Mode(_) => ControlMode::Discrete,
        }
    }

    /// Returns the numeric value, if continuous.
    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Mode(_) => None,
        }
    }

    /// Returns the mode selection, if discrete.
    #[must_use]
    pub fn as_mode(&self) -> Option<&ModeSelection> {
        match self {
            Self::Number(_) => None,
            Self::Mode(m) => Some(m),
        }
    }
}

impl fmt::Display for DeviceValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Mode(m) => write!(f, "{m}"),
        }
    }
}
