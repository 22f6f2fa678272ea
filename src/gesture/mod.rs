// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Tap, hold and double-tap recognition with ripple feedback.
//!
//! A [`GestureEngine`] is attached to one element and classifies the
//! pointer sessions on it. The engine is a plain state machine driven by
//! explicit instants; the `driver` feature adds [`GestureDriver`], which
//! runs a binding on tokio timers.

mod binding;
#[cfg(feature = "driver")]
mod driver;
mod engine;
mod options;
mod ripple;
mod session;

pub use binding::{BindingId, GestureBinding};
#[cfg(feature = "driver")]
pub use driver::{DEFAULT_CHANNEL_CAPACITY, DriverHandle, GestureDriver};
pub use engine::{GestureEngine, GestureOutput};
pub use options::{
    DEFAULT_DOUBLE_TAP_WINDOW, DEFAULT_HAPTIC_PULSE, DEFAULT_HOLD_THRESHOLD,
    DEFAULT_MOVE_TOLERANCE, DEFAULT_REENTRY_DEBOUNCE, DEFAULT_RIPPLE_REMOVAL_DELAY,
    GestureOptions,
};
pub use ripple::{Ripple, RippleId};
pub use session::{GestureKind, GestureSession, SessionState};
