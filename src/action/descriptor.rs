// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Declarative action descriptors and the per-device action set.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::gesture::{GestureKind, GestureOptions};

/// What to do when a gesture fires.
///
/// Deserialized from the author's configuration, tagged by `action`:
///
/// ```
/// use room_card::action::ActionDescriptor;
///
/// let action: ActionDescriptor = serde_json::from_str(
///     r#"{"action": "call-service", "domain": "scene", "service": "turn_on",
///         "data": {"entity_id": "scene.movie"}}"#,
/// ).unwrap();
/// assert_eq!(action.name(), "call-service");
///
/// let url: ActionDescriptor =
///     serde_json::from_str(r#"{"action": "url", "url": "https://example.org"}"#).unwrap();
/// assert_eq!(
///     url,
///     ActionDescriptor::OpenUrl {
///         url: "https://example.org".into(),
///         new_tab: false,
///     }
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum ActionDescriptor {
    /// Toggle the device the gesture happened on.
    Toggle,
    /// Run a domain service.
    CallService {
        /// Service domain.
        domain: String,
        /// Service name.
        service: String,
        /// Service data.
        #[serde(default, alias = "service_data")]
        data: Map<String, Value>,
    },
    /// Navigate the dashboard to a path.
    Navigate {
        /// Dashboard path.
        #[serde(alias = "navigation_path")]
        path: String,
    },
    /// Open a URL.
    #[serde(rename = "url")]
    OpenUrl {
        /// Target URL.
        #[serde(alias = "url_path")]
        url: String,
        /// Open in a new tab.
        #[serde(default)]
        new_tab: bool,
    },
    /// Show the host's details dialog for an entity.
    MoreInfo {
        /// Entity to show; the gesture's device when absent.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        entity: Option<String>,
    },
    /// Do nothing.
    None,
}

impl ActionDescriptor {
    /// Creates a navigation action.
    #[must_use]
    pub fn navigate(path: impl Into<String>) -> Self {
        Self::Navigate { path: path.into() }
    }

    /// Creates a service-call action with no data.
    #[must_use]
    pub fn call_service(domain: impl Into<String>, service: impl Into<String>) -> Self {
        Self::CallService {
            domain: domain.into(),
            service: service.into(),
            data: Map::new(),
        }
    }

    /// Returns the wire tag.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Toggle => "toggle",
            Self::CallService { .. } => "call-service",
            Self::Navigate { .. } => "navigate",
            Self::OpenUrl { .. } => "url",
            Self::MoreInfo { .. } => "more-info",
            Self::None => "none",
        }
    }

    /// Returns `true` for [`ActionDescriptor::None`].
    #[must_use]
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}

/// The tap, hold and double-tap actions of one device.
///
/// Keys follow the usual dashboard naming (`tap_action`, `hold_action`,
/// `double_tap_action`). A missing tap action toggles the device.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionSet {
    /// Action on tap.
    #[serde(default, rename = "tap_action", skip_serializing_if = "Option::is_none")]
    pub tap: Option<ActionDescriptor>,
    /// Action on hold.
    #[serde(default, rename = "hold_action", skip_serializing_if = "Option::is_none")]
    pub hold: Option<ActionDescriptor>,
    /// Action on double tap.
    #[serde(
        default,
        rename = "double_tap_action",
        skip_serializing_if = "Option::is_none"
    )]
    pub double_tap: Option<ActionDescriptor>,
}

impl ActionSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the tap action.
    #[must_use]
    pub fn with_tap(mut self, action: ActionDescriptor) -> Self {
        self.tap = Some(action);
        self
    }

    /// Sets the hold action.
    #[must_use]
    pub fn with_hold(mut self, action: ActionDescriptor) -> Self {
        self.hold = Some(action);
        self
    }

    /// Sets the double-tap action.
    #[must_use]
    pub fn with_double_tap(mut self, action: ActionDescriptor) -> Self {
        self.double_tap = Some(action);
        self
    }

    /// Returns the action for a gesture.
    #[must_use]
    pub fn for_gesture(&self, kind: GestureKind) -> ActionDescriptor {
        match kind {
            GestureKind::Tap => self.tap.clone().unwrap_or(ActionDescriptor::Toggle),
            GestureKind::Hold => self.hold.clone().unwrap_or(ActionDescriptor::None),
            GestureKind::DoubleTap => self.double_tap.clone().unwrap_or(ActionDescriptor::None),
        }
    }

    /// Returns `true` if a hold does something.
    #[must_use]
    pub fn hold_enabled(&self) -> bool {
        self.hold.as_ref().is_some_and(|a| !a.is_none())
    }

    /// Returns `true` if a double tap does something.
    #[must_use]
    pub fn double_tap_enabled(&self) -> bool {
        self.double_tap.as_ref().is_some_and(|a| !a.is_none())
    }

    /// Returns gesture options enabling exactly the gestures that act.
    #[must_use]
    pub fn gesture_options(&self) -> GestureOptions {
        GestureOptions::new()
            .with_hold(self.hold_enabled())
            .with_double_tap(self.double_tap_enabled())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_are_kebab_case() {
        let json = serde_json::to_value(ActionDescriptor::MoreInfo { entity: None }).unwrap();
        assert_eq!(json, serde_json::json!({"action": "more-info"}));
        let json = serde_json::to_value(ActionDescriptor::None).unwrap();
        assert_eq!(json, serde_json::json!({"action": "none"}));
    }

    #[test]
    fn navigation_path_alias() {
        let action: ActionDescriptor =
            serde_json::from_str(r#"{"action":"navigate","navigation_path":"/home/kitchen"}"#)
                .unwrap();
        assert_eq!(action, ActionDescriptor::navigate("/home/kitchen"));
    }

    #[test]
    fn unknown_tag_is_rejected() {
        let result = serde_json::from_str::<ActionDescriptor>(r#"{"action":"fire-missiles"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn explicit_none_disables_detection() {
        let set: ActionSet = serde_json::from_str(
            r#"{"hold_action":{"action":"none"},"double_tap_action":{"action":"toggle"}}"#,
        )
        .unwrap();
        assert!(!set.hold_enabled());
        assert!(set.double_tap_enabled());

        let options = set.gesture_options();
        assert!(!options.hold_enabled);
        assert!(options.double_tap_enabled);
    }

    #[test]
    fn missing_tap_defaults_to_toggle() {
        let set = ActionSet::new();
        assert_eq!(set.for_gesture(GestureKind::Tap), ActionDescriptor::Toggle);
        assert_eq!(set.for_gesture(GestureKind::Hold), ActionDescriptor::None);
    }
}
