// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The gesture state machine.
//!
//! [`GestureEngine`] does no I/O and owns no clock. Every call takes the
//! current [`Instant`]; pending timers are exposed through
//! [`GestureEngine::next_deadline`] and fired by [`GestureEngine::poll`].
//! [`GestureEngine::handle`] polls first, so a caller that only forwards
//! events still sees timers fire in order.

use std::time::{Duration, Instant};

use crate::control::{Bounds, Point, PointerEvent, PointerId};

use super::options::GestureOptions;
use super::ripple::{Ripple, RippleId};
use super::session::{GestureKind, GestureSession, SessionState};

/// Something the host should do in response to the gesture engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GestureOutput {
    /// A gesture was classified.
    Gesture(GestureKind),
    /// Pulse the vibration motor, best-effort.
    Haptic(Duration),
    /// Draw a new ripple at its initial, collapsed state.
    RippleStart(Ripple),
    /// Start the ripple's grow/fade transition (next paint).
    RippleGrow(RippleId),
    /// Remove the ripple from display.
    RippleRemove(RippleId),
}

impl GestureOutput {
    /// Returns the gesture, if this output is one.
    #[must_use]
    pub fn gesture(&self) -> Option<GestureKind> {
        match self {
            Self::Gesture(kind) => Some(*kind),
            _ => None,
        }
    }
}

/// A tap waiting to see whether a second release turns it into a double tap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PendingTap {
    deadline: Instant,
}

/// Classifies pointer input on one element into tap, hold and double tap.
///
/// # Examples
///
/// ```
/// use std::time::{Duration, Instant};
/// use room_card::control::{Bounds, PointerEvent};
/// use room_card::gesture::{GestureEngine, GestureKind, GestureOptions};
///
/// let mut engine = GestureEngine::new(
///     GestureOptions::new().with_hold(true),
///     Bounds::new(0.0, 0.0, 100.0, 50.0),
/// );
/// let t0 = Instant::now();
///
/// engine.handle(&PointerEvent::down(10.0, 10.0), t0);
/// let out = engine.handle(&PointerEvent::up(12.0, 11.0), t0 + Duration::from_millis(120));
///
/// let gestures: Vec<_> = out.iter().filter_map(|o| o.gesture()).collect();
/// assert_eq!(gestures, vec![GestureKind::Tap]);
/// ```
#[derive(Debug, Clone)]
pub struct GestureEngine {
    options: GestureOptions,
    bounds: Bounds,
    session: Option<GestureSession>,
    hold_deadline: Option<Instant>,
    pending_tap: Option<PendingTap>,
    pending_grow: Vec<RippleId>,
    ripple_removals: Vec<(RippleId, Instant)>,
    last_end: Option<Instant>,
    next_ripple: u64,
}

impl GestureEngine {
    /// Creates an engine for an element with the given bounds.
    #[must_use]
    pub fn new(options: GestureOptions, bounds: Bounds) -> Self {
        Self {
            options,
            bounds,
            session: None,
            hold_deadline: None,
            pending_tap: None,
            pending_grow: Vec::new(),
            ripple_removals: Vec::new(),
            last_end: None,
            next_ripple: 1,
        }
    }

    /// Returns the options.
    #[must_use]
    pub fn options(&self) -> &GestureOptions {
        &self.options
    }

    /// Updates the element's bounds after layout.
    pub fn set_bounds(&mut self, bounds: Bounds) {
        self.bounds = bounds;
    }

    /// Returns the active session, if a press is in progress.
    #[must_use]
    pub fn session(&self) -> Option<&GestureSession> {
        self.session.as_ref()
    }

    /// Returns the state of the current session, `Idle` if none.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.session
            .as_ref()
            .map_or(SessionState::Idle, GestureSession::state)
    }

    /// Returns `true` while a double-tap window is open.
    #[must_use]
    pub fn is_awaiting_double_tap(&self) -> bool {
        self.pending_tap.is_some()
    }

    /// Returns the earliest pending timer deadline.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        let removals = self.ripple_removals.iter().map(|(_, at)| *at);
        self.hold_deadline
            .into_iter()
            .chain(self.pending_tap.map(|p| p.deadline))
            .chain(removals)
            .min()
    }

    /// Feeds one pointer event.
    ///
    /// Timers due at `now` fire first.
    pub fn handle(&mut self, event: &PointerEvent, now: Instant) -> Vec<GestureOutput> {
        let mut out = self.poll(now);
        match *event {
            PointerEvent::Down { id, position, .. } => self.press(id, position, now, &mut out),
            PointerEvent::Move { .. } => {}
            PointerEvent::Up { id, position } => self.release(id, position, now, &mut out),
            PointerEvent::Cancel { id } => self.cancel(id, now),
        }
        out
    }

    /// Fires every timer due at or before `now`, in deadline order.
    pub fn poll(&mut self, now: Instant) -> Vec<GestureOutput> {
        let mut out = Vec::new();

        loop {
            let Some(deadline) = self.next_deadline().filter(|d| *d <= now) else {
                break;
            };

            if self.hold_deadline == Some(deadline) {
                self.hold_deadline = None;
                self.fire_hold(&mut out);
            } else if self.pending_tap.is_some_and(|p| p.deadline == deadline) {
                self.pending_tap = None;
                tracing::debug!("Double-tap window elapsed, emitting tap");
                out.push(GestureOutput::Gesture(GestureKind::Tap));
            } else if let Some(pos) = self
                .ripple_removals
                .iter()
                .position(|(_, at)| *at == deadline)
            {
                let (id, _) = self.ripple_removals.remove(pos);
                out.push(GestureOutput::RippleRemove(id));
            }
        }

        out
    }

    /// Runs work deferred to the next paint: starting ripple transitions.
    pub fn frame(&mut self) -> Vec<GestureOutput> {
        self.pending_grow
            .drain(..)
            .map(GestureOutput::RippleGrow)
            .collect()
    }

    /// Drops every timer and ripple; used when the element unmounts.
    pub fn reset(&mut self) -> Vec<GestureOutput> {
        let mut out = Vec::new();
        if let Some(id) = self.session.take().and_then(|s| s.ripple) {
            out.push(GestureOutput::RippleRemove(id));
        }
        out.extend(
            self.ripple_removals
                .drain(..)
                .map(|(id, _)| GestureOutput::RippleRemove(id)),
        );
        self.hold_deadline = None;
        self.pending_tap = None;
        self.pending_grow.clear();
        out
    }

    fn press(
        &mut self,
        id: PointerId,
        position: Point,
        now: Instant,
        out: &mut Vec<GestureOutput>,
    ) {
        if self.session.is_some() {
            tracing::trace!(pointer = id.0, "Ignoring press while a session is active");
            return;
        }
        if let Some(end) = self.last_end
            && now.saturating_duration_since(end) < self.options.reentry_debounce
        {
            tracing::trace!(pointer = id.0, "Ignoring press inside re-entry debounce");
            return;
        }

        let mut session = GestureSession::new(id, position, now);

        out.push(GestureOutput::Haptic(self.options.haptic_pulse));
        let ripple_id = RippleId::new(self.next_ripple);
        if let Some(ripple) = Ripple::for_press(ripple_id, &self.bounds, position) {
            self.next_ripple += 1;
            session.ripple = Some(ripple.id);
            self.pending_grow.push(ripple.id);
            out.push(GestureOutput::RippleStart(ripple));
        }

        if self.options.hold_enabled {
            self.hold_deadline = Some(now + self.options.hold_threshold);
        }

        self.session = Some(session);
    }

    fn fire_hold(&mut self, out: &mut Vec<GestureOutput>) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if session.state != SessionState::Pressed {
            return;
        }
        session.mark_held();
        tracing::debug!("Hold threshold reached");
        out.push(GestureOutput::Gesture(GestureKind::Hold));
    }

    fn end_session(&mut self, id: PointerId, now: Instant) -> Option<GestureSession> {
        if self.session.as_ref().is_none_or(|s| s.pointer != id) {
            return None;
        }
        let mut session = self.session.take()?;
        session.state = SessionState::Released;
        self.hold_deadline = None;
        self.last_end = Some(now);
        if let Some(ripple) = session.ripple {
            self.pending_grow.retain(|pending| *pending != ripple);
            self.ripple_removals
                .push((ripple, now + self.options.ripple_removal_delay));
        }
        Some(session)
    }

    fn release(
        &mut self,
        id: PointerId,
        position: Point,
        now: Instant,
        out: &mut Vec<GestureOutput>,
    ) {
        let Some(session) = self.end_session(id, now) else {
            return;
        };

        if session.moved_beyond(position, self.options.move_tolerance) {
            tracing::debug!("Release moved beyond tolerance, treating as drag");
            return;
        }
        if session.held {
            return;
        }

        if !self.options.double_tap_enabled {
            out.push(GestureOutput::Gesture(GestureKind::Tap));
            return;
        }

        match self.pending_tap.take() {
            Some(pending) if now < pending.deadline => {
                tracing::debug!("Second release inside window, emitting double tap");
                out.push(GestureOutput::Gesture(GestureKind::DoubleTap));
            }
            stale => {
                if stale.is_some() {
                    out.push(GestureOutput::Gesture(GestureKind::Tap));
                }
                self.pending_tap = Some(PendingTap {
                    deadline: now + self.options.double_tap_window,
                });
            }
        }
    }

    fn cancel(&mut self, id: PointerId, now: Instant) {
        if self.end_session(id, now).is_some() {
            tracing::debug!("Press cancelled");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn element() -> Bounds {
        Bounds::new(0.0, 0.0, 120.0, 60.0)
    }

    fn gestures(outputs: &[GestureOutput]) -> Vec<GestureKind> {
        outputs.iter().filter_map(GestureOutput::gesture).collect()
    }

    #[test]
    fn press_starts_haptic_and_ripple() {
        let mut engine = GestureEngine::new(GestureOptions::default(), element());
        let out = engine.handle(&PointerEvent::down(30.0, 20.0), Instant::now());

        assert_eq!(out[0], GestureOutput::Haptic(ms(50)));
        let GestureOutput::RippleStart(ripple) = out[1] else {
            panic!("expected ripple start, got {:?}", out[1]);
        };
        assert!((ripple.size - 240.0).abs() < f64::EPSILON);
        assert_eq!(engine.state(), SessionState::Pressed);

        assert_eq!(engine.frame(), vec![GestureOutput::RippleGrow(ripple.id)]);
        assert!(engine.frame().is_empty());
    }

    #[test]
    fn hold_timer_is_one_shot() {
        let mut engine = GestureEngine::new(GestureOptions::new().with_hold(true), element());
        let t0 = Instant::now();
        engine.handle(&PointerEvent::down(10.0, 10.0), t0);

        assert!(gestures(&engine.poll(t0 + ms(499))).is_empty());
        assert_eq!(gestures(&engine.poll(t0 + ms(500))), vec![GestureKind::Hold]);
        assert!(gestures(&engine.poll(t0 + ms(2000))).is_empty());
        assert_eq!(engine.state(), SessionState::HoldFired);
        assert!(engine.session().unwrap().held());
    }

    #[test]
    fn no_hold_when_disabled() {
        let mut engine = GestureEngine::new(GestureOptions::default(), element());
        let t0 = Instant::now();
        engine.handle(&PointerEvent::down(10.0, 10.0), t0);
        assert!(gestures(&engine.poll(t0 + ms(900))).is_empty());

        let out = engine.handle(&PointerEvent::up(10.0, 10.0), t0 + ms(1000));
        assert_eq!(gestures(&out), vec![GestureKind::Tap]);
    }

    #[test]
    fn release_cancels_pending_hold() {
        let mut engine = GestureEngine::new(GestureOptions::new().with_hold(true), element());
        let t0 = Instant::now();
        engine.handle(&PointerEvent::down(10.0, 10.0), t0);
        engine.handle(&PointerEvent::up(10.0, 10.0), t0 + ms(100));

        assert!(gestures(&engine.poll(t0 + ms(600))).is_empty());
    }

    #[test]
    fn double_tap_window_elapses_into_tap() {
        let mut engine = GestureEngine::new(GestureOptions::new().with_double_tap(true), element());
        let t0 = Instant::now();
        engine.handle(&PointerEvent::down(10.0, 10.0), t0);
        let out = engine.handle(&PointerEvent::up(10.0, 10.0), t0 + ms(80));
        assert!(gestures(&out).is_empty());
        assert!(engine.is_awaiting_double_tap());
        assert_eq!(engine.next_deadline(), Some(t0 + ms(330)));

        assert!(gestures(&engine.poll(t0 + ms(329))).is_empty());
        assert_eq!(gestures(&engine.poll(t0 + ms(330))), vec![GestureKind::Tap]);
        assert!(!engine.is_awaiting_double_tap());
    }

    #[test]
    fn late_second_press_flushes_expired_tap() {
        let mut engine = GestureEngine::new(GestureOptions::new().with_double_tap(true), element());
        let t0 = Instant::now();
        engine.handle(&PointerEvent::down(10.0, 10.0), t0);
        engine.handle(&PointerEvent::up(10.0, 10.0), t0 + ms(50));

        // Nobody polled; the second press arrives after the window closed.
        let out = engine.handle(&PointerEvent::down(10.0, 10.0), t0 + ms(400));
        assert_eq!(gestures(&out), vec![GestureKind::Tap]);
        let out = engine.handle(&PointerEvent::up(10.0, 10.0), t0 + ms(450));
        assert!(gestures(&out).is_empty());
        assert!(engine.is_awaiting_double_tap());
    }

    #[test]
    fn held_release_emits_nothing_with_double_tap_enabled() {
        let options = GestureOptions::new().with_hold(true).with_double_tap(true);
        let mut engine = GestureEngine::new(options, element());
        let t0 = Instant::now();
        engine.handle(&PointerEvent::down(10.0, 10.0), t0);
        let out = engine.handle(&PointerEvent::up(10.0, 10.0), t0 + ms(700));
        assert_eq!(gestures(&out), vec![GestureKind::Hold]);
        assert!(!engine.is_awaiting_double_tap());
        assert!(gestures(&engine.poll(t0 + ms(2000))).is_empty());
    }

    #[test]
    fn cancel_suppresses_and_schedules_ripple_removal() {
        let mut engine = GestureEngine::new(GestureOptions::new().with_hold(true), element());
        let t0 = Instant::now();
        let out = engine.handle(&PointerEvent::down(10.0, 10.0), t0);
        let ripple = out
            .iter()
            .find_map(|o| match o {
                GestureOutput::RippleStart(r) => Some(r.id),
                _ => None,
            })
            .unwrap();

        let out = engine.handle(&PointerEvent::cancel(), t0 + ms(100));
        assert!(out.is_empty());
        assert_eq!(engine.state(), SessionState::Idle);
        // The grow never ran; it must not run after cancel either.
        assert!(engine.frame().is_empty());

        let out = engine.poll(t0 + ms(1000));
        assert_eq!(out, vec![GestureOutput::RippleRemove(ripple)]);
    }

    #[test]
    fn reentry_debounce_ignores_quick_press_and_its_release() {
        let mut engine = GestureEngine::new(GestureOptions::default(), element());
        let t0 = Instant::now();
        engine.handle(&PointerEvent::down(10.0, 10.0), t0);
        let out = engine.handle(&PointerEvent::up(10.0, 10.0), t0 + ms(40));
        assert_eq!(gestures(&out), vec![GestureKind::Tap]);

        // Emulated mouse events following the touch pair.
        let out = engine.handle(&PointerEvent::down(10.0, 10.0), t0 + ms(60));
        assert!(out.is_empty());
        assert_eq!(engine.state(), SessionState::Idle);
        let out = engine.handle(&PointerEvent::up(10.0, 10.0), t0 + ms(70));
        assert!(gestures(&out).is_empty());

        let out = engine.handle(&PointerEvent::down(10.0, 10.0), t0 + ms(200));
        assert!(!out.is_empty());
    }

    #[test]
    fn zero_size_element_still_taps() {
        let mut engine = GestureEngine::new(GestureOptions::default(), Bounds::default());
        let t0 = Instant::now();
        let out = engine.handle(&PointerEvent::down(0.0, 0.0), t0);
        assert_eq!(out, vec![GestureOutput::Haptic(ms(50))]);
        let out = engine.handle(&PointerEvent::up(0.0, 0.0), t0 + ms(10));
        assert_eq!(out, vec![GestureOutput::Gesture(GestureKind::Tap)]);
        assert_eq!(engine.next_deadline(), None);
    }

    #[test]
    fn second_pointer_ignored_during_session() {
        let mut engine = GestureEngine::new(GestureOptions::default(), element());
        let t0 = Instant::now();
        engine.handle(&PointerEvent::down(10.0, 10.0), t0);
        let intruder = PointerEvent::Down {
            id: PointerId(9),
            position: Point::new(50.0, 50.0),
            source: crate::control::PointerSource::Touch,
        };
        assert!(engine.handle(&intruder, t0 + ms(5)).is_empty());
        let stray_up = PointerEvent::Up {
            id: PointerId(9),
            position: Point::new(50.0, 50.0),
        };
        assert!(engine.handle(&stray_up, t0 + ms(6)).is_empty());
        assert_eq!(engine.session().unwrap().pointer(), PointerId(0));
    }

    #[test]
    fn reset_clears_timers_and_ripples() {
        let options = GestureOptions::new().with_hold(true).with_double_tap(true);
        let mut engine = GestureEngine::new(options, element());
        let t0 = Instant::now();
        engine.handle(&PointerEvent::down(10.0, 10.0), t0);
        engine.handle(&PointerEvent::up(10.0, 10.0), t0 + ms(20));
        engine.handle(&PointerEvent::down(10.0, 10.0), t0 + ms(150));

        let out = engine.reset();
        assert_eq!(out.len(), 2);
        assert!(out.iter().all(|o| matches!(o, GestureOutput::RippleRemove(_))));
        assert_eq!(engine.next_deadline(), None);
        assert_eq!(engine.state(), SessionState::Idle);
        assert!(engine.poll(t0 + ms(5000)).is_empty());
    }
}
