// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Ripple feedback drawn under a pressed element.

use std::fmt;

use crate::control::{Bounds, Point};

/// Identifies one ripple within a binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RippleId(u64);

impl RippleId {
    pub(crate) fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw value.
    #[must_use]
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for RippleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Ripple({})", self.0)
    }
}

/// A ripple to draw: a circle that grows and fades from the press point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ripple {
    /// Identifier used by later grow/remove outputs.
    pub id: RippleId,
    /// Center, in element-local coordinates.
    pub center: Point,
    /// Diameter: twice the element's larger dimension.
    pub size: f64,
}

impl Ripple {
    /// Sizes a ripple for a press at `press` (page coordinates) on `bounds`.
    ///
    /// Returns `None` for an element with no area.
    #[must_use]
    pub fn for_press(id: RippleId, bounds: &Bounds, press: Point) -> Option<Self> {
        if bounds.is_empty() {
            return None;
        }
        Some(Self {
            id,
            center: bounds.to_local(press),
            size: bounds.larger_dimension() * 2.0,
        })
    }
}
