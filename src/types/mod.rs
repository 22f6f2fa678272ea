// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Value types shared across the card.
//!
//! Each constrained type validates at construction time so the controls and
//! views never see an impossible value.
//!
//! # Types
//!
//! - [`DeviceKind`] / [`ControlMode`] - What a device is and how it is driven
//! - [`ValueRange`] - Continuous range (`min < max`, `step > 0`)
//! - [`ModeSelection`] - A discrete mode as a `{label, index}` pair
//! - [`DeviceValue`] - A value matching its control mode
//! - [`Temperature`] / [`TemperatureBand`] - Readings and comfort bands
//! - [`CssColor`] - Author-supplied colors

mod css_color;
mod device;
mod temperature;

pub use css_color::CssColor;
pub use device::{ControlMode, DeviceKind, DeviceValue, ModeSelection, ValueRange};
pub use temperature::{Temperature, TemperatureBand, TemperatureUnit};
