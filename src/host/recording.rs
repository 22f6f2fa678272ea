// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! A host that records every request instead of performing it.

use std::time::Duration;

use parking_lot::Mutex;

use crate::action::ActionDescriptor;
use crate::error::HostError;

use super::{ActionDispatcher, Haptics, ServiceCall, ServiceCaller};

/// Records service calls, dispatched actions and vibrations.
///
/// Useful for previews and tests. Requests always succeed unless
/// [`with_unsupported_actions`](Self::with_unsupported_actions) is set.
///
/// # Examples
///
/// ```
/// use room_card::host::{RecordingHost, ServiceCall, ServiceCaller};
///
/// let host = RecordingHost::new();
/// host.call_service(ServiceCall::new("light", "turn_off").with_entity("light.desk"))
///     .unwrap();
/// assert_eq!(host.calls().len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct RecordingHost {
    calls: Mutex<Vec<ServiceCall>>,
    actions: Mutex<Vec<(ActionDescriptor, Option<String>)>>,
    vibrations: Mutex<Vec<Duration>>,
    reject_actions: bool,
}

impl RecordingHost {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes [`ActionDispatcher::dispatch`] fail with `Unsupported`.
    #[must_use]
    pub fn with_unsupported_actions(mut self) -> Self {
        self.reject_actions = true;
        self
    }

    /// Returns the recorded service calls, oldest first.
    #[must_use]
    pub fn calls(&self) -> Vec<ServiceCall> {
        self.calls.lock().clone()
    }

    /// Returns the most recent service call.
    #[must_use]
    pub fn last_call(&self) -> Option<ServiceCall> {
        self.calls.lock().last().cloned()
    }

    /// Returns the dispatched actions with their entity.
    #[must_use]
    pub fn actions(&self) -> Vec<(ActionDescriptor, Option<String>)> {
        self.actions.lock().clone()
    }

    /// Returns the requested vibration pulses.
    #[must_use]
    pub fn vibrations(&self) -> Vec<Duration> {
        self.vibrations.lock().clone()
    }

    /// Forgets everything recorded so far.
    pub fn clear(&self) {
        self.calls.lock().clear();
        self.actions.lock().clear();
        self.vibrations.lock().clear();
    }
}

impl ServiceCaller for RecordingHost {
    fn call_service(&self, call: ServiceCall) -> Result<(), HostError> {
        self.calls.lock().push(call);
        Ok(())
    }
}

impl ActionDispatcher for RecordingHost {
    fn dispatch(&self, action: &ActionDescriptor, entity: Option<&str>) -> Result<(), HostError> {
        if self.reject_actions {
            return Err(HostError::Unsupported(action.name().to_string()));
        }
        self.actions
            .lock()
            .push((action.clone(), entity.map(str::to_string)));
        Ok(())
    }
}

impl Haptics for RecordingHost {
    fn vibrate(&self, pulse: Duration) {
        self.vibrations.lock().push(pulse);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_and_clears() {
        let host = RecordingHost::new();
        host.call_service(ServiceCall::new("switch", "turn_on")).unwrap();
        host.vibrate(Duration::from_millis(50));
        host.dispatch(&ActionDescriptor::navigate("/lovelace/0"), None)
            .unwrap();

        assert_eq!(host.last_call().unwrap().to_string(), "switch.turn_on");
        assert_eq!(host.vibrations(), vec![Duration::from_millis(50)]);
        assert_eq!(host.actions().len(), 1);

        host.clear();
        assert!(host.calls().is_empty());
        assert!(host.actions().is_empty());
    }

    #[test]
    fn unsupported_actions_are_refused() {
        let host = RecordingHost::new().with_unsupported_actions();
        let err = host
            .dispatch(&ActionDescriptor::navigate("/x"), None)
            .unwrap_err();
        assert_eq!(err, HostError::Unsupported("navigate".to_string()));
        assert!(host.actions().is_empty());
    }
}
