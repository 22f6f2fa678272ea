// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Pointer geometry shared by the circular control and the gesture engine.

use serde::{Deserialize, Serialize};

/// A point in element-local or page pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal position.
    pub x: f64,
    /// Vertical position, growing downwards.
    pub y: f64,
}

impl Point {
    /// Creates a point.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// An element's bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Bounds {
    /// Left edge.
    pub left: f64,
    /// Top edge.
    pub top: f64,
    /// Width; zero for an element that is not laid out yet.
    pub width: f64,
    /// Height; zero for an element that is not laid out yet.
    pub height: f64,
}

impl Bounds {
    /// Creates a bounding box.
    #[must_use]
    pub const fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Returns the center point.
    #[must_use]
    pub fn center(&self) -> Point {
        Point::new(self.left + self.width / 2.0, self.top + self.height / 2.0)
    }

    /// Returns the larger of width and height, never negative.
    #[must_use]
    pub fn larger_dimension(&self) -> f64 {
        self.width.max(self.height).max(0.0)
    }

    /// Returns `true` if the box has no area.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }

    /// Converts a page point into box-local coordinates.
    #[must_use]
    pub fn to_local(&self, point: Point) -> Point {
        Point::new(point.x - self.left, point.y - self.top)
    }
}

/// Identifies one pointer (a finger, the mouse, a pen).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct PointerId(pub u32);

/// Where a pointer event came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointerSource {
    /// A mouse.
    #[default]
    Mouse,
    /// A touch screen.
    Touch,
    /// A pen or stylus.
    Pen,
}

/// A raw pointer event in page coordinates.
///
/// For one session events always arrive as down, zero or more moves, then
/// up or cancel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PointerEvent {
    /// A pointer was pressed.
    Down {
        /// Which pointer.
        id: PointerId,
        /// Where.
        position: Point,
        /// Input technology.
        #[serde(default)]
        source: PointerSource,
    },
    /// A pointer moved.
    Move {
        /// Which pointer.
        id: PointerId,
        /// Where.
        position: Point,
    },
    /// A pointer was released.
    Up {
        /// Which pointer.
        id: PointerId,
        /// Where.
        position: Point,
    },
    /// The platform took the pointer away (scroll, leave, touch cancel).
    Cancel {
        /// Which pointer.
        id: PointerId,
    },
}

impl PointerEvent {
    /// Creates a mouse press for the default pointer.
    #[must_use]
    pub const fn down(x: f64, y: f64) -> Self {
        Self::Down {
            id: PointerId(0),
            position: Point::new(x, y),
            source: PointerSource::Mouse,
        }
    }

    /// Creates a move for the default pointer.
    #[must_use]
    pub const fn moved(x: f64, y: f64) -> Self {
        Self::Move {
            id: PointerId(0),
            position: Point::new(x, y),
        }
    }

    /// Creates a release for the default pointer.
    #[must_use]
    pub const fn up(x: f64, y: f64) -> Self {
        Self::Up {
            id: PointerId(0),
            position: Point::new(x, y),
        }
    }

    /// Creates a cancel for the default pointer.
    #[must_use]
    pub const fn cancel() -> Self {
        Self::Cancel { id: PointerId(0) }
    }

    /// Returns the pointer id.
    #[must_use]
    pub const fn id(&self) -> PointerId {
        match self {
            Self::Down { id, .. }
            | Self::Move { id, .. }
            | Self::Up { id, .. }
            | Self::Cancel { id } => *id,
        }
    }

    /// Returns the position, if the event carries one.
    #[must_use]
    pub const fn position(&self) -> Option<Point> {
        match self {
            Self::Down { position, .. }
            | Self::Move { position, .. }
            | Self::Up { position, .. } => Some(*position),
            Self::Cancel { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_center_and_dimension() {
        let bounds = Bounds::new(10.0, 20.0, 100.0, 60.0);
        assert_eq!(bounds.center(), Point::new(60.0, 50.0));
        assert!((bounds.larger_dimension() - 100.0).abs() < f64::EPSILON);
        assert!(!bounds.is_empty());
        assert!(Bounds::default().is_empty());
    }

    #[test]
    fn event_accessors() {
        let down = PointerEvent::down(1.0, 2.0);
        assert_eq!(down.id(), PointerId(0));
        assert_eq!(down.position(), Some(Point::new(1.0, 2.0)));
        assert_eq!(PointerEvent::cancel().position(), None);
    }

    #[test]
    fn event_deserializes_from_tagged_json() {
        let event: PointerEvent = serde_json::from_str(
            r#"{"type":"down","id":3,"position":{"x":5.0,"y":6.0},"source":"touch"}"#,
        )
        .unwrap();
        assert_eq!(
            event,
            PointerEvent::Down {
                id: PointerId(3),
                position: Point::new(5.0, 6.0),
                source: PointerSource::Touch,
            }
        );
    }
}
