// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Pointer-driven controls.
//!
//! [`CircularControl`] turns a drag on a ring into a device value. The pure
//! mapping functions are exported too so views can derive fills without a
//! control instance.

mod circular;
mod pointer;

pub use circular::{
    CircularControl, RING_ROTATION_DEGREES, angle_at, fill_percentage, value_for_angle,
    value_for_fill,
};
pub use pointer::{Bounds, Point, PointerEvent, PointerId, PointerSource};
