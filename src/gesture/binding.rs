// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Attach/detach handles tying a gesture engine to one element.

use std::fmt;
use std::time::Instant;

use uuid::Uuid;

use crate::control::{Bounds, PointerEvent};

use super::engine::{GestureEngine, GestureOutput};
use super::options::GestureOptions;

/// Unique identifier for a gesture binding.
///
/// # Examples
///
/// ```
/// use room_card::gesture::BindingId;
///
/// let a = BindingId::new();
/// let b = BindingId::new();
/// assert_ne!(a, b);
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct BindingId(Uuid);

impl BindingId {
    /// Creates a new unique identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for BindingId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for BindingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let short = &self.0.simple().to_string()[..8];
        write!(f, "BindingId({short}...)")
    }
}

impl fmt::Display for BindingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A gesture engine attached to one element.
///
/// Created with [`GestureEngine::attach`] on mount. Call
/// [`detach`](Self::detach) on unmount; after that every input is ignored
/// and no timer fires.
#[derive(Debug)]
pub struct GestureBinding {
    id: BindingId,
    engine: GestureEngine,
    attached: bool,
}

impl GestureEngine {
    /// Attaches a new engine to an element and returns its handle.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::time::Instant;
    /// use room_card::control::{Bounds, PointerEvent};
    /// use room_card::gesture::{GestureEngine, GestureOptions};
    ///
    /// let mut binding = GestureEngine::attach(
    ///     GestureOptions::default(),
    ///     Bounds::new(0.0, 0.0, 40.0, 40.0),
    /// );
    /// binding.handle(&PointerEvent::down(5.0, 5.0), Instant::now());
    /// binding.detach();
    /// assert!(!binding.is_attached());
    /// ```
    #[must_use]
    pub fn attach(options: GestureOptions, bounds: Bounds) -> GestureBinding {
        let binding = GestureBinding {
            id: BindingId::new(),
            engine: Self::new(options, bounds),
            attached: true,
        };
        tracing::debug!(binding = %binding.id, "Gesture binding attached");
        binding
    }
}

impl GestureBinding {
    /// Returns the binding id.
    #[must_use]
    pub fn id(&self) -> BindingId {
        self.id
    }

    /// Returns `true` until [`detach`](Self::detach) is called.
    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.attached
    }

    /// Returns the underlying engine.
    #[must_use]
    pub fn engine(&self) -> &GestureEngine {
        &self.engine
    }

    /// Updates the element bounds.
    pub fn set_bounds(&mut self, bounds: Bounds) {
        self.engine.set_bounds(bounds);
    }

    /// Feeds a pointer event. Returns nothing once detached.
    pub fn handle(&mut self, event: &PointerEvent, now: Instant) -> Vec<GestureOutput> {
        if !self.attached {
            return Vec::new();
        }
        self.engine.handle(event, now)
    }

    /// Fires due timers. Returns nothing once detached.
    pub fn poll(&mut self, now: Instant) -> Vec<GestureOutput> {
        if !self.attached {
            return Vec::new();
        }
        self.engine.poll(now)
    }

    /// Runs next-paint work. Returns nothing once detached.
    pub fn frame(&mut self) -> Vec<GestureOutput> {
        if !self.attached {
            return Vec::new();
        }
        self.engine.frame()
    }

    /// Returns the next timer deadline, `None` once detached.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        if self.attached {
            self.engine.next_deadline()
        } else {
            None
        }
    }

    /// Detaches from the element.
    ///
    /// Invalidates pending timers and returns removals for every ripple
    /// still on screen. Calling it twice returns nothing the second time.
    pub fn detach(&mut self) -> Vec<GestureOutput> {
        if !self.attached {
            return Vec::new();
        }
        self.attached = false;
        tracing::debug!(binding = %self.id, "Gesture binding detached");
        self.engine.reset()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::gesture::GestureKind;

    #[test]
    fn binding_ids_are_unique() {
        let a = GestureEngine::attach(GestureOptions::default(), Bounds::default());
        let b = GestureEngine::attach(GestureOptions::default(), Bounds::default());
        assert_ne!(a.id(), b.id());
        assert!(format!("{:?}", a.id()).starts_with("BindingId("));
    }

    #[test]
    fn detach_invalidates_hold_timer() {
        let mut binding = GestureEngine::attach(
            GestureOptions::new().with_hold(true),
            Bounds::new(0.0, 0.0, 50.0, 50.0),
        );
        let t0 = Instant::now();
        binding.handle(&PointerEvent::down(10.0, 10.0), t0);
        assert!(binding.next_deadline().is_some());

        let out = binding.detach();
        assert!(matches!(out.as_slice(), [GestureOutput::RippleRemove(_)]));
        assert!(binding.detach().is_empty());

        let later = t0 + Duration::from_secs(1);
        assert!(binding.poll(later).is_empty());
        assert!(binding.next_deadline().is_none());
        assert!(binding.handle(&PointerEvent::up(10.0, 10.0), later).is_empty());
    }

    #[test]
    fn attached_binding_classifies() {
        let mut binding = GestureEngine::attach(GestureOptions::default(), Bounds::default());
        let t0 = Instant::now();
        binding.handle(&PointerEvent::down(1.0, 1.0), t0);
        let out = binding.handle(&PointerEvent::up(1.0, 1.0), t0 + Duration::from_millis(30));
        assert_eq!(out, vec![GestureOutput::Gesture(GestureKind::Tap)]);
    }
}
