// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The room card view.
//!
//! [`RoomView`] owns the per-device circular controls and gesture bindings
//! of a validated room, recomputes view models from host state and turns
//! user input into notifications and host commands.

mod commands;
mod derive;
mod room_view;

pub use commands::{toggle_command, value_command};
pub use derive::current_value;
pub use room_view::{ChipEffect, Feedback, RoomClimate, RoomView};
