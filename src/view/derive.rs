// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Reading a device's current value out of host state.

use serde_json::Value;

use crate::config::DeviceDescriptor;
use crate::state::{ControlSpec, EntityState};
use crate::types::{DeviceKind, DeviceValue, ModeSelection, ValueRange};

/// Full scale of a light's `brightness` attribute.
const BRIGHTNESS_SCALE: f64 = 255.0;

/// Derives the value shown for `device` from its entity state.
///
/// Missing entities, missing attributes and unparsable values fall back to
/// the range minimum or the first mode. Numbers are clamped and snapped to
/// the step; labels not in the mode list fall back to the first mode.
#[must_use]
pub fn current_value(device: &DeviceDescriptor, state: Option<&EntityState>) -> DeviceValue {
    match &device.control {
        ControlSpec::Continuous(range) => {
            DeviceValue::Number(continuous_value(device, range, state))
        }
        ControlSpec::Discrete(modes) => DeviceValue::Mode(discrete_value(device, modes, state)),
    }
}

fn continuous_value(
    device: &DeviceDescriptor,
    range: &ValueRange,
    state: Option<&EntityState>,
) -> f64 {
    let Some(state) = state else {
        return range.min();
    };
    let attribute = device.value_attribute();

    let raw = match (device.kind, attribute) {
        (DeviceKind::Switch, None) => Some(if state.is_on() { range.max() } else { range.min() }),
        (DeviceKind::Light, Some("brightness")) => state
            .attribute_f64("brightness")
            .map(|b| b / BRIGHTNESS_SCALE * 100.0),
        (DeviceKind::Speaker, Some("volume_level")) => {
            state.attribute_f64("volume_level").map(|v| v * 100.0)
        }
        (_, Some(name)) => state.attribute_f64(name),
        (_, None) => state.state_f64(),
    };

    match raw {
        Some(value) if value.is_finite() => range.snap(value),
        _ => {
            tracing::trace!(entity = %device.entity, ?attribute, "No usable value, using minimum");
            range.min()
        }
    }
}

fn discrete_value(
    device: &DeviceDescriptor,
    modes: &[String],
    state: Option<&EntityState>,
) -> ModeSelection {
    let label = state.and_then(|state| match device.value_attribute() {
        Some(name) => state.attribute(name).and_then(label_of),
        None => Some(state.state.clone()),
    });

    label
        .and_then(|label| ModeSelection::find(modes, &label))
        .unwrap_or_else(|| {
            let first = modes.first().cloned().unwrap_or_default();
            ModeSelection::new(first, 0)
        })
}

/// Mode attributes are usually strings; numeric speeds are matched by text.
fn label_of(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DeviceConfig;

    fn device(config: DeviceConfig) -> DeviceDescriptor {
        config.validate(0).unwrap()
    }

    #[test]
    fn light_brightness_scaled_to_percent() {
        let light = device(DeviceConfig::new("light.a", "light"));
        let state = EntityState::new("light.a", "on").with_attribute("brightness", 128);
        assert_eq!(current_value(&light, Some(&state)), DeviceValue::Number(50.0));
    }

    #[test]
    fn light_off_without_brightness_is_minimum() {
        let light = device(DeviceConfig::new("light.a", "light"));
        let state = EntityState::new("light.a", "off");
        assert_eq!(current_value(&light, Some(&state)), DeviceValue::Number(0.0));
    }

    #[test]
    fn speaker_volume_scaled() {
        let speaker = device(DeviceConfig::new("media_player.a", "speaker"));
        let state =
            EntityState::new("media_player.a", "playing").with_attribute("volume_level", 0.35);
        assert_eq!(current_value(&speaker, Some(&state)), DeviceValue::Number(35.0));
    }

    #[test]
    fn climate_clamped_and_snapped() {
        let climate = device(DeviceConfig::new("climate.a", "climate").with_range(16.0, 30.0, 0.5));
        let state = EntityState::new("climate.a", "heat").with_attribute("temperature", 21.3);
        assert_eq!(current_value(&climate, Some(&state)), DeviceValue::Number(21.5));
        let state = EntityState::new("climate.a", "heat").with_attribute("temperature", 35);
        assert_eq!(current_value(&climate, Some(&state)), DeviceValue::Number(30.0));
    }

    #[test]
    fn climate_mode_read_from_state() {
        let climate =
            device(DeviceConfig::new("climate.a", "climate").with_modes(["off", "heat", "cool"]));
        let state = EntityState::new("climate.a", "cool");
        assert_eq!(
            current_value(&climate, Some(&state)),
            DeviceValue::Mode(ModeSelection::new("cool", 2))
        );
    }

    #[test]
    fn unknown_label_falls_back_to_first_mode() {
        let fan = device(DeviceConfig::new("fan.a", "fan").with_modes(["low", "high"]));
        let state = EntityState::new("fan.a", "on").with_attribute("preset_mode", "turbo");
        assert_eq!(
            current_value(&fan, Some(&state)),
            DeviceValue::Mode(ModeSelection::new("low", 0))
        );
    }

    #[test]
    fn missing_entity_uses_defaults() {
        let cover = device(DeviceConfig::new("cover.a", "cover").with_range(10.0, 90.0, 5.0));
        assert_eq!(current_value(&cover, None), DeviceValue::Number(10.0));
    }

    #[test]
    fn switch_follows_state() {
        let switch = device(DeviceConfig::new("switch.a", "switch").with_range(0.0, 1.0, 1.0));
        let on = EntityState::new("switch.a", "on");
        assert_eq!(current_value(&switch, Some(&on)), DeviceValue::Number(1.0));

        let switch = device(DeviceConfig::new("switch.a", "switch").with_modes(["off", "on"]));
        assert_eq!(
            current_value(&switch, Some(&on)),
            DeviceValue::Mode(ModeSelection::new("on", 1))
        );
    }

    #[test]
    fn attribute_override_is_read_raw() {
        let light = device(
            DeviceConfig::new("light.a", "light")
                .with_range(2000.0, 6500.0, 100.0)
                .with_attribute("color_temp_kelvin"),
        );
        let state = EntityState::new("light.a", "on").with_attribute("color_temp_kelvin", 3010);
        assert_eq!(current_value(&light, Some(&state)), DeviceValue::Number(3000.0));
    }

    #[test]
    fn numeric_fan_speed_matches_label() {
        let vacuum = device(DeviceConfig::new("vacuum.a", "vacuum").with_modes(["1", "2", "3"]));
        let state = EntityState::new("vacuum.a", "cleaning").with_attribute("fan_speed", 2);
        assert_eq!(
            current_value(&vacuum, Some(&state)),
            DeviceValue::Mode(ModeSelection::new("2", 1))
        );
    }
}
