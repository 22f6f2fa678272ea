// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Gesture kinds and the per-press session record.

use std::fmt;
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::control::{Point, PointerId};

use super::ripple::RippleId;

/// A classified gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GestureKind {
    /// A short press and release.
    Tap,
    /// A press held past the hold threshold.
    Hold,
    /// Two taps in quick succession.
    DoubleTap,
}

impl GestureKind {
    /// Returns the wire name of the gesture.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Tap => "tap",
            Self::Hold => "hold",
            Self::DoubleTap => "double_tap",
        }
    }
}

impl fmt::Display for GestureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a session is in its press-to-release life.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    /// No press in progress.
    Idle,
    /// The pointer is down and no hold has fired.
    Pressed,
    /// The pointer is down and the hold already fired.
    HoldFired,
    /// The pointer went up or was cancelled.
    Released,
}

/// One press-to-release cycle on one element.
///
/// Created on press, dropped on release or cancel.
#[derive(Debug, Clone, PartialEq)]
pub struct GestureSession {
    pub(crate) pointer: PointerId,
    pub(crate) origin: Point,
    pub(crate) pressed_at: Instant,
    pub(crate) state: SessionState,
    pub(crate) held: bool,
    pub(crate) ripple: Option<RippleId>,
}

impl GestureSession {
    pub(crate) fn new(pointer: PointerId, origin: Point, pressed_at: Instant) -> Self {
        Self {
            pointer,
            origin,
            pressed_at,
            state: SessionState::Pressed,
            held: false,
            ripple: None,
        }
    }

    /// Returns the pointer that started the session.
    #[must_use]
    pub fn pointer(&self) -> PointerId {
        self.pointer
    }

    /// Returns the press position.
    #[must_use]
    pub fn origin(&self) -> Point {
        self.origin
    }

    /// Returns when the press happened.
    #[must_use]
    pub fn pressed_at(&self) -> Instant {
        self.pressed_at
    }

    /// Returns the current state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Returns `true` once the hold has fired.
    #[must_use]
    pub fn held(&self) -> bool {
        self.held
    }

    /// Returns `true` if `release` is farther than `tolerance` from the
    /// origin on either axis.
    #[must_use]
    pub fn moved_beyond(&self, release: Point, tolerance: f64) -> bool {
        (release.x - self.origin.x).abs() > tolerance
            || (release.y - self.origin.y).abs() > tolerance
    }

    pub(crate) fn mark_held(&mut self) {
        self.held = true;
        self.state = SessionState::HoldFired;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gesture_kind_names() {
        assert_eq!(GestureKind::DoubleTap.to_string(), "double_tap");
        assert_eq!(
            serde_json::to_string(&GestureKind::Hold).unwrap(),
            "\"hold\""
        );
    }

    #[test]
    fn movement_checked_per_axis() {
        let session = GestureSession::new(PointerId(0), Point::new(100.0, 100.0), Instant::now());
        assert!(!session.moved_beyond(Point::new(150.0, 150.0), 50.0));
        assert!(session.moved_beyond(Point::new(180.0, 100.0), 50.0));
        assert!(session.moved_beyond(Point::new(100.0, 49.0), 50.0));
    }

    #[test]
    fn hold_marks_session() {
        let mut session = GestureSession::new(PointerId(0), Point::default(), Instant::now());
        assert_eq!(session.state(), SessionState::Pressed);
        session.mark_held();
        assert!(session.held());
        assert_eq!(session.state(), SessionState::HoldFired);
    }
}
