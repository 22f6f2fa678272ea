// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Notifications produced for the dashboard host.
//!
//! - [`ValueChanged`] - `{ value }` from a circular control
//! - [`DeviceToggled`] - `{ entity, current_state }` from a chip
//! - [`GestureNotification`] - `{ action }` from the gesture engine
//!
//! [`CardEvent`] tags each of them with the entity it concerns.

mod card_event;

pub use card_event::{CardEvent, DeviceToggled, GestureNotification, ValueChanged};
