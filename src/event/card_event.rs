// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Notifications the card produces for its host.

use serde::Serialize;

use crate::gesture::GestureKind;
use crate::types::DeviceValue;

/// Emitted by a circular control for every drag sample.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValueChanged {
    /// The value under the pointer.
    pub value: DeviceValue,
}

/// Emitted when a device chip is tapped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceToggled {
    /// The toggled entity.
    pub entity: String,
    /// Whether the device was on before the toggle.
    pub current_state: bool,
}

/// Emitted when a gesture is classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GestureNotification {
    /// The classified gesture.
    pub action: GestureKind,
}

/// Every notification a room view can produce, tagged with its entity.
///
/// # Examples
///
/// ```
/// use room_card::event::{CardEvent, DeviceToggled};
///
/// let event = CardEvent::DeviceToggled(DeviceToggled {
///     entity: "switch.heater".to_string(),
///     current_state: false,
/// });
/// assert_eq!(event.entity(), "switch.heater");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CardEvent {
    /// A slider produced a value for an entity.
    ValueChanged {
        /// The entity the slider controls.
        entity: String,
        /// The notification payload.
        #[serde(flatten)]
        change: ValueChanged,
    },
    /// A chip toggled an entity.
    DeviceToggled(DeviceToggled),
    /// A gesture was recognized on an entity's element.
    Gesture {
        /// The entity whose element was touched.
        entity: String,
        /// The notification payload.
        #[serde(flatten)]
        gesture: GestureNotification,
    },
}

impl CardEvent {
    /// Returns the entity this event concerns.
    #[must_use]
    pub fn entity(&self) -> &str {
        match self {
            Self::ValueChanged { entity, .. } | Self::Gesture { entity, .. } => entity,
            Self::DeviceToggled(toggled) => &toggled.entity,
        }
    }

    /// Creates a value-changed event.
    #[must_use]
    pub fn value_changed(entity: impl Into<String>, value: DeviceValue) -> Self {
        Self::ValueChanged {
            entity: entity.into(),
            change: ValueChanged { value },
        }
    }

    /// Creates a gesture event.
    #[must_use]
    pub fn gesture(entity: impl Into<String>, action: GestureKind) -> Self {
        Self::Gesture {
            entity: entity.into(),
            gesture: GestureNotification { action },
        }
    }
}
