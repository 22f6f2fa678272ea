// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Service calls for control values and chip toggles.

use crate::host::ServiceCall;
use crate::state::ControlSpec;
use crate::template::value::number;
use crate::types::{DeviceKind, DeviceValue, ModeSelection};

/// Builds the service call setting `entity` to `value`.
///
/// Returns `None` when the kind has no command for the value, e.g. a
/// continuous vacuum or a cover mode other than `open`, `close` or `stop`.
///
/// # Examples
///
/// ```
/// use room_card::state::ControlSpec;
/// use room_card::types::{DeviceKind, DeviceValue, ValueRange};
/// use room_card::view::value_command;
///
/// let spec = ControlSpec::Continuous(ValueRange::PERCENT);
/// let volume = DeviceValue::Number(40.0);
/// let call = value_command(DeviceKind::Speaker, "media_player.den", &spec, &volume).unwrap();
/// assert_eq!(call.to_string(), "media_player.volume_set");
/// assert_eq!(call.data["volume_level"], 0.4);
/// ```
#[must_use]
pub fn value_command(
    kind: DeviceKind,
    entity: &str,
    control: &ControlSpec,
    value: &DeviceValue,
) -> Option<ServiceCall> {
    let call = match value {
        DeviceValue::Number(v) => continuous_call(kind, control, *v)?,
        DeviceValue::Mode(selection) => discrete_call(kind, selection)?,
    };
    Some(call.with_entity(entity))
}

/// Builds the call a chip tap sends: off when the device is on, else on.
#[must_use]
pub fn toggle_command(kind: DeviceKind, entity: &str, is_on: bool) -> ServiceCall {
    let service = if is_on { "turn_off" } else { "turn_on" };
    ServiceCall::new(kind.domain(), service).with_entity(entity)
}

fn continuous_call(kind: DeviceKind, control: &ControlSpec, value: f64) -> Option<ServiceCall> {
    let domain = kind.domain();
    let call = match kind {
        DeviceKind::Light => {
            ServiceCall::new(domain, "turn_on").with_data("brightness_pct", number(value))
        }
        DeviceKind::Speaker => {
            ServiceCall::new(domain, "volume_set").with_data("volume_level", number(value / 100.0))
        }
        DeviceKind::Purifier | DeviceKind::Fan => {
            ServiceCall::new(domain, "set_percentage").with_data("percentage", number(value))
        }
        DeviceKind::Climate => {
            ServiceCall::new(domain, "set_temperature").with_data("temperature", number(value))
        }
        DeviceKind::Cover => {
            ServiceCall::new(domain, "set_cover_position").with_data("position", number(value))
        }
        DeviceKind::Switch => {
            let min = control.range().map_or(0.0, |r| r.min());
            let service = if value > min { "turn_on" } else { "turn_off" };
            ServiceCall::new(domain, service)
        }
        DeviceKind::Vacuum => return None,
    };
    Some(call)
}

fn discrete_call(kind: DeviceKind, selection: &ModeSelection) -> Option<ServiceCall> {
    let domain = kind.domain();
    let label = selection.label.as_str();
    let call = match kind {
        DeviceKind::Light => ServiceCall::new(domain, "turn_on").with_data("effect", label),
        DeviceKind::Speaker => ServiceCall::new(domain, "select_source").with_data("source", label),
        DeviceKind::Purifier | DeviceKind::Fan => {
            ServiceCall::new(domain, "set_preset_mode").with_data("preset_mode", label)
        }
        DeviceKind::Climate => {
            ServiceCall::new(domain, "set_hvac_mode").with_data("hvac_mode", label)
        }
        DeviceKind::Vacuum => {
            ServiceCall::new(domain, "set_fan_speed").with_data("fan_speed", label)
        }
        DeviceKind::Cover => match label.to_ascii_lowercase().as_str() {
            "open" => ServiceCall::new(domain, "open_cover"),
            "close" | "closed" => ServiceCall::new(domain, "close_cover"),
            "stop" => ServiceCall::new(domain, "stop_cover"),
            _ => return None,
        },
        DeviceKind::Switch => match label.to_ascii_lowercase().as_str() {
            "on" => ServiceCall::new(domain, "turn_on"),
            "off" => ServiceCall::new(domain, "turn_off"),
            _ => return None,
        },
    };
    Some(call)
}
