// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Author-facing card configuration.
//!
//! [`RoomConfig`] and [`DeviceConfig`] mirror the declarative document the
//! card author writes. Validation turns them into [`RoomDescriptor`] and
//! [`DeviceDescriptor`], whose fields are typed and consistent; a card
//! never renders from a configuration that failed validation.

mod device;
mod room;

pub use device::{DeviceConfig, DeviceDescriptor};
pub use room::{BandColors, RoomConfig, RoomDescriptor};
