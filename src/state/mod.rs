// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Host state and derived view models.
//!
//! The host owns device state. The card only observes a [`StateSnapshot`]
//! and derives one [`DeviceViewModel`] per configured device from it.
//!
//! # Examples
//!
//! ```
//! use room_card::state::{EntityState, StateSnapshot};
//!
//! let snapshot = StateSnapshot::new()
//!     .with(EntityState::new("fan.bedroom", "on").with_attribute("percentage", 40));
//!
//! let fan = snapshot.get("fan.bedroom").unwrap();
//! assert!(fan.is_on());
//! assert_eq!(fan.attribute_f64("percentage"), Some(40.0));
//! ```

mod entity_state;
mod view_model;

pub use entity_state::{EntityState, STATE_OFF, STATE_UNAVAILABLE, StateSnapshot};
pub use view_model::{ControlSpec, DeviceViewModel};
