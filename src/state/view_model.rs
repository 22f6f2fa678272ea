// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Per-device view models derived from host state on every tick.

use serde::Serialize;

use crate::error::ValueError;
use crate::types::{ControlMode, DeviceKind, DeviceValue, ModeSelection, ValueRange};

/// The value model a device is driven with.
///
/// The variant carries exactly the data its mode needs, so a continuous
/// control always has a range and a discrete control always has modes.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlSpec {
    /// A numeric range.
    Continuous(ValueRange),
    /// An ordered list of mode labels; order defines angular sectors.
    Discrete(Vec<String>),
}

impl ControlSpec {
    /// Creates a discrete spec, rejecting an empty mode list.
    ///
    /// # Errors
    ///
    /// Returns [`ValueError::EmptyModes`] if `modes` is empty.
    pub fn discrete(modes: Vec<String>) -> Result<Self, ValueError> {
        if modes.is_empty() {
            return Err(ValueError::EmptyModes);
        }
        Ok(Self::Discrete(modes))
    }

    /// Returns the control mode.
    #[must_use]
    pub const fn mode(&self) -> ControlMode {
        match self {
            Self::Continuous(_) => ControlMode::Continuous,
            Self::Discrete(_) => ControlMode::Discrete,
        }
    }

    /// Returns the range for continuous specs.
    #[must_use]
    pub fn range(&self) -> Option<&ValueRange> {
        match self {
            Self::Continuous(range) => Some(range),
            Self::Discrete(_) => None,
        }
    }

    /// Returns the modes for discrete specs.
    #[must_use]
    pub fn modes(&self) -> Option<&[String]> {
        match self {
            Self::Continuous(_) => None,
            Self::Discrete(modes) => Some(modes),
        }
    }

    /// Returns the value shown when the host reports nothing usable.
    ///
    /// `None` for a discrete spec without modes.
    #[must_use]
    pub fn default_value(&self) -> Option<DeviceValue> {
        match self {
            Self::Continuous(range) => Some(DeviceValue::Number(range.min())),
            Self::Discrete(modes) => modes
                .first()
                .map(|label| DeviceValue::Mode(ModeSelection::new(label.clone(), 0))),
        }
    }
}

/// Everything the card needs to render one device.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceViewModel {
    /// The host entity identifier; stable key.
    pub entity: String,
    /// Display name, with templates already resolved.
    pub name: String,
    /// Kind of device.
    pub kind: DeviceKind,
    /// Value model.
    pub control: ControlSpec,
    /// Current value, consistent with `control`.
    pub current_value: DeviceValue,
    /// `state != off && state != unavailable`.
    pub is_on: bool,
    /// `state != unavailable`; a missing entity is unavailable too.
    pub available: bool,
}

impl DeviceViewModel {
    /// Returns the control mode.
    #[must_use]
    pub const fn control_mode(&self) -> ControlMode {
        self.control.mode()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discrete_rejects_empty_modes() {
        assert_eq!(ControlSpec::discrete(vec![]), Err(ValueError::EmptyModes));
        let spec = ControlSpec::discrete(vec!["eco".to_string()]).unwrap();
        assert_eq!(spec.mode(), ControlMode::Discrete);
        assert_eq!(spec.modes(), Some(&["eco".to_string()][..]));
        assert!(spec.range().is_none());
    }

    #[test]
    fn default_values_follow_mode() {
        let range = ValueRange::new(10.0, 20.0, 1.0).unwrap();
        assert_eq!(
            ControlSpec::Continuous(range).default_value(),
            Some(DeviceValue::Number(10.0))
        );
        assert_eq!(
            ControlSpec::Discrete(vec!["a".into(), "b".into()]).default_value(),
            Some(DeviceValue::Mode(ModeSelection::new("a", 0)))
        );
        assert_eq!(ControlSpec::Discrete(vec![]).default_value(), None);
    }
}
