// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Circular value control.
//!
//! A ring the user drags around to pick a value. The angle of the pointer
//! around the ring's center is measured from the mathematical origin (3
//! o'clock), counter-clockwise in screen space, and normalized into
//! `[0, 360)`. The −90° rotation applied when drawing the ring is cosmetic
//! and never enters the arithmetic.
//!
//! - Discrete: `index = floor(angle / 360 * modes.len())`
//! - Continuous: `value = round(angle / 360 * (max - min) + min)`
//!
//! Degenerate specs (no modes, zero-width range) produce no value at all.

use crate::event::ValueChanged;
use crate::state::ControlSpec;
use crate::types::{DeviceValue, ModeSelection};

use super::pointer::{Bounds, Point, PointerEvent, PointerId};

/// Cosmetic rotation applied to the ring when drawing it.
pub const RING_ROTATION_DEGREES: f64 = -90.0;

/// Returns the pointer angle around `center` in degrees, within `[0, 360)`.
#[must_use]
pub fn angle_at(center: Point, pointer: Point) -> f64 {
    let dy = pointer.y - center.y;
    let dx = pointer.x - center.x;
    let angle = (dy.atan2(dx).to_degrees() + 360.0) % 360.0;
    // -0.0 and float rounding near a full turn can leave 360.0 behind
    if angle >= 360.0 || angle < 0.0 { 0.0 } else { angle }
}

/// Maps an angle in `[0, 360)` to a value under `spec`.
///
/// Returns `None` for an empty mode list or a zero-width range.
#[must_use]
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub fn value_for_angle(spec: &ControlSpec, angle: f64) -> Option<DeviceValue> {
    if !angle.is_finite() {
        return None;
    }
    let fraction = angle / 360.0;
    match spec {
        ControlSpec::Discrete(modes) => {
            if modes.is_empty() {
                return None;
            }
            let count = modes.len();
            // Safe: fraction is in [0, 1), floor keeps the index below count
            let index = ((fraction * count as f64).floor() as usize).min(count - 1);
            Some(DeviceValue::Mode(ModeSelection::new(
                modes[index].clone(),
                index,
            )))
        }
        ControlSpec::Continuous(range) => {
            let span = range.span();
            if !usable_span(span) {
                return None;
            }
            Some(DeviceValue::Number((fraction * span + range.min()).round()))
        }
    }
}

/// Returns how much of the ring to fill for `value`, in percent.
///
/// This is a rendering derivation only. Returns `None` when the value does
/// not match the spec or the spec is degenerate.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn fill_percentage(spec: &ControlSpec, value: &DeviceValue) -> Option<f64> {
    match (spec, value) {
        (ControlSpec::Discrete(modes), DeviceValue::Mode(selection)) => {
            if modes.is_empty() || selection.index >= modes.len() {
                return None;
            }
            Some(selection.index as f64 / modes.len() as f64 * 100.0)
        }
        (ControlSpec::Continuous(range), DeviceValue::Number(current)) => {
            let span = range.span();
            if !usable_span(span) || !current.is_finite() {
                return None;
            }
            Some((current - range.min()) / span * 100.0)
        }
        _ => None,
    }
}

/// Re-derives a continuous value from a fill percentage.
///
/// The inverse of [`fill_percentage`], rounded the same way as
/// [`value_for_angle`].
#[must_use]
pub fn value_for_fill(spec: &ControlSpec, percent: f64) -> Option<DeviceValue> {
    let range = spec.range()?;
    let span = range.span();
    if !usable_span(span) || !percent.is_finite() {
        return None;
    }
    Some(DeviceValue::Number((percent / 100.0 * span + range.min()).round()))
}

/// Whether a range span can be scaled without producing NaN or infinity.
fn usable_span(span: f64) -> bool {
    span.is_finite() && span > 0.0
}

/// A pointer-driven ring control.
///
/// # Examples
///
/// ```
/// use room_card::control::{Bounds, CircularControl, PointerEvent};
/// use room_card::state::ControlSpec;
/// use room_card::types::{DeviceValue, ValueRange};
///
/// let spec = ControlSpec::Continuous(ValueRange::new(0.0, 100.0, 1.0).unwrap());
/// let mut control = CircularControl::new(spec, Bounds::new(0.0, 0.0, 200.0, 200.0));
///
/// // Straight below the center is a quarter turn.
/// let changed = control.handle(&PointerEvent::down(100.0, 200.0)).unwrap();
/// assert_eq!(changed.value, DeviceValue::Number(25.0));
/// ```
#[derive(Debug, Clone)]
pub struct CircularControl {
    spec: ControlSpec,
    bounds: Bounds,
    captured: Option<PointerId>,
    current: Option<DeviceValue>,
}

impl CircularControl {
    /// Creates a control.
    #[must_use]
    pub fn new(spec: ControlSpec, bounds: Bounds) -> Self {
        Self {
            spec,
            bounds,
            captured: None,
            current: None,
        }
    }

    /// Sets the value the control displays.
    #[must_use]
    pub fn with_value(mut self, value: DeviceValue) -> Self {
        self.current = Some(value);
        self
    }

    /// Returns the value model.
    #[must_use]
    pub fn spec(&self) -> &ControlSpec {
        &self.spec
    }

    /// Replaces the value model, e.g. after a configuration reload.
    pub fn set_spec(&mut self, spec: ControlSpec) {
        self.spec = spec;
    }

    /// Updates the bounding box after layout.
    pub fn set_bounds(&mut self, bounds: Bounds) {
        self.bounds = bounds;
    }

    /// Sets the displayed value from host state.
    ///
    /// Ignored while dragging so the host echo does not fight the pointer.
    pub fn set_value(&mut self, value: DeviceValue) {
        if !self.is_dragging() {
            self.current = Some(value);
        }
    }

    /// Returns the displayed value.
    #[must_use]
    pub fn value(&self) -> Option<&DeviceValue> {
        self.current.as_ref()
    }

    /// Returns `true` while a pointer is captured.
    #[must_use]
    pub fn is_dragging(&self) -> bool {
        self.captured.is_some()
    }

    /// Returns the pointer currently captured, if any.
    #[must_use]
    pub fn captured_pointer(&self) -> Option<PointerId> {
        self.captured
    }

    /// Returns the fill percentage for the displayed value.
    #[must_use]
    pub fn fill(&self) -> Option<f64> {
        self.current
            .as_ref()
            .and_then(|value| fill_percentage(&self.spec, value))
    }

    /// Feeds one pointer event.
    ///
    /// Press captures the pointer and emits immediately; every move of the
    /// captured pointer emits again; release or cancel frees the capture
    /// without emitting. Events from other pointers are ignored.
    pub fn handle(&mut self, event: &PointerEvent) -> Option<ValueChanged> {
        match *event {
            PointerEvent::Down { id, position, .. } => {
                if self.captured.is_some_and(|held| held != id) {
                    return None;
                }
                self.captured = Some(id);
                self.emit(position)
            }
            PointerEvent::Move { id, position } => {
                if self.captured != Some(id) {
                    return None;
                }
                self.emit(position)
            }
            PointerEvent::Up { id, .. } | PointerEvent::Cancel { id } => {
                if self.captured == Some(id) {
                    self.captured = None;
                }
                None
            }
        }
    }

    fn emit(&mut self, position: Point) -> Option<ValueChanged> {
        let angle = angle_at(self.bounds.center(), position);
        let value = value_for_angle(&self.spec, angle)?;
        tracing::trace!(angle, value = %value, "Circular control value");
        self.current = Some(value.clone());
        Some(ValueChanged { value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ValueRange;

    fn percent() -> ControlSpec {
        ControlSpec::Continuous(ValueRange::new(0.0, 100.0, 1.0).unwrap())
    }

    fn fan_modes() -> ControlSpec {
        ControlSpec::Discrete(vec![
            "low".to_string(),
            "medium".to_string(),
            "high".to_string(),
            "auto".to_string(),
        ])
    }

    fn ring() -> Bounds {
        Bounds::new(0.0, 0.0, 100.0, 100.0)
    }

    #[test]
    fn angle_normalized_into_full_turn() {
        let center = Point::new(0.0, 0.0);
        assert!((angle_at(center, Point::new(1.0, 0.0)) - 0.0).abs() < 1e-9);
        assert!((angle_at(center, Point::new(0.0, 1.0)) - 90.0).abs() < 1e-9);
        assert!((angle_at(center, Point::new(-1.0, 0.0)) - 180.0).abs() < 1e-9);
        assert!((angle_at(center, Point::new(0.0, -1.0)) - 270.0).abs() < 1e-9);
        assert!(angle_at(center, Point::new(1.0, -1e-12)) < 360.0);
    }

    #[test]
    fn continuous_values_stay_in_range() {
        let spec = ControlSpec::Continuous(ValueRange::new(16.0, 30.0, 0.5).unwrap());
        let mut angle = 0.0;
        while angle < 360.0 {
            let value = value_for_angle(&spec, angle).unwrap().as_number().unwrap();
            assert!((16.0..=30.0).contains(&value), "angle {angle} gave {value}");
            angle += 0.25;
        }
        let almost_full = value_for_angle(&spec, 359.999_999).unwrap();
        assert_eq!(almost_full, DeviceValue::Number(30.0));
    }

    #[test]
    fn wide_range_never_yields_nan() {
        let spec = ControlSpec::Continuous(ValueRange::new(-1e307, 1e307, 1.0).unwrap());
        for angle in [0.0, 90.0, 180.0, 359.9] {
            let value = value_for_angle(&spec, angle).unwrap().as_number().unwrap();
            assert!(value.is_finite(), "angle {angle} gave {value}");
            let fill = fill_percentage(&spec, &DeviceValue::Number(value)).unwrap();
            assert!(fill.is_finite());
        }
    }

    #[test]
    fn unusable_spans_produce_nothing() {
        assert!(!usable_span(f64::INFINITY));
        assert!(!usable_span(f64::NAN));
        assert!(!usable_span(0.0));
        assert!(usable_span(1e-9));
        assert_eq!(
            fill_percentage(&percent(), &DeviceValue::Number(f64::NAN)),
            None
        );
    }

    #[test]
    fn discrete_index_never_reaches_count() {
        let spec = fan_modes();
        assert_eq!(
            value_for_angle(&spec, 0.0),
            Some(DeviceValue::Mode(ModeSelection::new("low", 0)))
        );
        assert_eq!(
            value_for_angle(&spec, 90.0),
            Some(DeviceValue::Mode(ModeSelection::new("medium", 1)))
        );
        assert_eq!(
            value_for_angle(&spec, 359.999_999),
            Some(DeviceValue::Mode(ModeSelection::new("auto", 3)))
        );
        let mut angle = 0.0;
        while angle < 360.0 {
            let index = value_for_angle(&spec, angle).unwrap().as_mode().unwrap().index;
            assert!(index < 4);
            angle += 1.5;
        }
    }

    #[test]
    fn duplicate_labels_keep_their_index() {
        let spec = ControlSpec::Discrete(vec!["low".into(), "low".into()]);
        let second = value_for_angle(&spec, 200.0).unwrap();
        assert_eq!(second, DeviceValue::Mode(ModeSelection::new("low", 1)));
        assert!((fill_percentage(&spec, &second).unwrap() - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn degenerate_specs_emit_nothing() {
        assert_eq!(value_for_angle(&ControlSpec::Discrete(vec![]), 10.0), None);
        assert_eq!(
            fill_percentage(
                &ControlSpec::Discrete(vec![]),
                &DeviceValue::Mode(ModeSelection::new("x", 0))
            ),
            None
        );
        assert_eq!(value_for_angle(&percent(), f64::NAN), None);

        let mut control = CircularControl::new(ControlSpec::Discrete(vec![]), ring());
        assert!(control.handle(&PointerEvent::down(100.0, 50.0)).is_none());
        assert!(control.is_dragging());
    }

    #[test]
    fn fill_roundtrips_continuous_values() {
        let spec = ControlSpec::Continuous(ValueRange::new(-20.0, 40.0, 1.0).unwrap());
        let mut angle = 0.0;
        while angle < 360.0 {
            let value = value_for_angle(&spec, angle).unwrap();
            let fill = fill_percentage(&spec, &value).unwrap();
            assert_eq!(value_for_fill(&spec, fill), Some(value));
            angle += 7.0;
        }
    }

    #[test]
    fn fill_rejects_mismatched_value() {
        assert_eq!(
            fill_percentage(&percent(), &DeviceValue::Mode(ModeSelection::new("a", 0))),
            None
        );
        assert_eq!(value_for_fill(&fan_modes(), 50.0), None);
    }

    #[test]
    fn press_emits_immediately_and_moves_emit_again() {
        let mut control = CircularControl::new(percent(), ring());

        let first = control.handle(&PointerEvent::down(100.0, 50.0)).unwrap();
        assert_eq!(first.value, DeviceValue::Number(0.0));
        assert!(control.is_dragging());

        let second = control.handle(&PointerEvent::moved(50.0, 100.0)).unwrap();
        assert_eq!(second.value, DeviceValue::Number(25.0));

        let third = control.handle(&PointerEvent::moved(0.0, 50.0)).unwrap();
        assert_eq!(third.value, DeviceValue::Number(50.0));
        assert_eq!(control.fill(), Some(50.0));

        assert!(control.handle(&PointerEvent::up(0.0, 50.0)).is_none());
        assert!(!control.is_dragging());
        assert!(control.handle(&PointerEvent::moved(50.0, 0.0)).is_none());
    }

    #[test]
    fn cancel_releases_capture_without_emitting() {
        let mut control = CircularControl::new(fan_modes(), ring());
        control.handle(&PointerEvent::down(100.0, 50.0));
        assert!(control.handle(&PointerEvent::cancel()).is_none());
        assert!(!control.is_dragging());
    }

    #[test]
    fn other_pointers_are_ignored_while_captured() {
        let mut control = CircularControl::new(percent(), ring());
        control.handle(&PointerEvent::down(100.0, 50.0));

        let intruder = PointerEvent::Move {
            id: PointerId(7),
            position: Point::new(0.0, 50.0),
        };
        assert!(control.handle(&intruder).is_none());
        let stray_up = PointerEvent::Up {
            id: PointerId(7),
            position: Point::new(0.0, 0.0),
        };
        assert!(control.handle(&stray_up).is_none());
        assert!(control.is_dragging());
    }

    #[test]
    fn host_value_ignored_while_dragging() {
        let mut control =
            CircularControl::new(percent(), ring()).with_value(DeviceValue::Number(80.0));
        assert_eq!(control.fill(), Some(80.0));

        control.handle(&PointerEvent::down(50.0, 100.0));
        control.set_value(DeviceValue::Number(10.0));
        assert_eq!(control.value(), Some(&DeviceValue::Number(25.0)));

        control.handle(&PointerEvent::up(50.0, 100.0));
        control.set_value(DeviceValue::Number(10.0));
        assert_eq!(control.value(), Some(&DeviceValue::Number(10.0)));
    }
}
