// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Gesture timing and tolerance settings.

use std::time::Duration;

/// Default press duration before a hold fires.
pub const DEFAULT_HOLD_THRESHOLD: Duration = Duration::from_millis(500);

/// Default window for the second release of a double tap.
pub const DEFAULT_DOUBLE_TAP_WINDOW: Duration = Duration::from_millis(250);

/// Default per-axis movement allowed between press and release.
pub const DEFAULT_MOVE_TOLERANCE: f64 = 50.0;

/// Default time after a release during which new presses are ignored.
pub const DEFAULT_REENTRY_DEBOUNCE: Duration = Duration::from_millis(100);

/// Default delay before a released ripple is removed.
pub const DEFAULT_RIPPLE_REMOVAL_DELAY: Duration = Duration::from_millis(300);

/// Default haptic pulse length on press.
pub const DEFAULT_HAPTIC_PULSE: Duration = Duration::from_millis(50);

/// Configuration for one gesture binding.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use room_card::gesture::GestureOptions;
///
/// // Tap only
/// let options = GestureOptions::default();
///
/// // Tap, hold and double tap with a longer hold
/// let options = GestureOptions::new()
///     .with_hold(true)
///     .with_double_tap(true)
///     .with_hold_threshold(Duration::from_millis(800));
/// assert!(options.hold_enabled);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct GestureOptions {
    /// Whether a long press fires `hold`.
    pub hold_enabled: bool,
    /// Whether two quick releases fire `double_tap`.
    pub double_tap_enabled: bool,
    /// Press duration before `hold` fires.
    pub hold_threshold: Duration,
    /// Window in which a second release makes a double tap.
    pub double_tap_window: Duration,
    /// Maximum movement per axis, in pixels, for a release to count as a tap.
    pub move_tolerance: f64,
    /// Presses this soon after the previous release or cancel are ignored.
    pub reentry_debounce: Duration,
    /// Delay between release and ripple removal.
    pub ripple_removal_delay: Duration,
    /// Haptic pulse length on press.
    pub haptic_pulse: Duration,
}

impl GestureOptions {
    /// Creates options with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables or disables hold detection.
    #[must_use]
    pub fn with_hold(mut self, enabled: bool) -> Self {
        self.hold_enabled = enabled;
        self
    }

    /// Enables or disables double-tap detection.
    #[must_use]
    pub fn with_double_tap(mut self, enabled: bool) -> Self {
        self.double_tap_enabled = enabled;
        self
    }

    /// Sets the hold threshold.
    #[must_use]
    pub fn with_hold_threshold(mut self, threshold: Duration) -> Self {
        self.hold_threshold = threshold;
        self
    }

    /// Sets the double-tap window.
    #[must_use]
    pub fn with_double_tap_window(mut self, window: Duration) -> Self {
        self.double_tap_window = window;
        self
    }

    /// Sets the movement tolerance in pixels.
    #[must_use]
    pub fn with_move_tolerance(mut self, pixels: f64) -> Self {
        self.move_tolerance = pixels;
        self
    }

    /// Sets the re-entry debounce.
    #[must_use]
    pub fn with_reentry_debounce(mut self, debounce: Duration) -> Self {
        self.reentry_debounce = debounce;
        self
    }

    /// Sets the ripple removal delay.
    #[must_use]
    pub fn with_ripple_removal_delay(mut self, delay: Duration) -> Self {
        self.ripple_removal_delay = delay;
        self
    }
}

impl Default for GestureOptions {
    fn default() -> Self {
        Self {
            hold_enabled: false,
            double_tap_enabled: false,
            hold_threshold: DEFAULT_HOLD_THRESHOLD,
            double_tap_window: DEFAULT_DOUBLE_TAP_WINDOW,
            move_tolerance: DEFAULT_MOVE_TOLERANCE,
            reentry_debounce: DEFAULT_REENTRY_DEBOUNCE,
            ripple_removal_delay: DEFAULT_RIPPLE_REMOVAL_DELAY,
            haptic_pulse: DEFAULT_HAPTIC_PULSE,
        }
    }
}
