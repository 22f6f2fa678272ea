// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Declarative actions and their interpretation.

mod descriptor;

pub use descriptor::{ActionDescriptor, ActionSet};

use crate::error::HostError;
use crate::host::{Host, ServiceCall};

/// What [`interpret`] did with an action.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionOutcome {
    /// A service call was sent to the host.
    Called(ServiceCall),
    /// The action was handed to the host's dispatcher.
    Dispatched,
    /// Nothing was done.
    Skipped,
}

/// Carries out an action for the device `entity`.
///
/// `Toggle` and `CallService` become service calls; navigation, URLs and
/// more-info dialogs go to the host dispatcher. A toggle without an entity
/// is skipped.
///
/// # Errors
///
/// Returns the [`HostError`] reported by the host.
///
/// # Examples
///
/// ```
/// use room_card::action::{ActionDescriptor, ActionOutcome, interpret};
/// use room_card::host::RecordingHost;
///
/// let host = RecordingHost::new();
/// let outcome = interpret(&ActionDescriptor::Toggle, Some("light.desk"), &host).unwrap();
/// assert!(matches!(outcome, ActionOutcome::Called(_)));
/// assert_eq!(host.calls()[0].to_string(), "homeassistant.toggle");
/// ```
pub fn interpret(
    action: &ActionDescriptor,
    entity: Option<&str>,
    host: &dyn Host,
) -> Result<ActionOutcome, HostError> {
    match action {
        ActionDescriptor::Toggle => {
            let Some(entity) = entity else {
                tracing::warn!("Toggle action without an entity, ignoring");
                return Ok(ActionOutcome::Skipped);
            };
            let call = ServiceCall::new("homeassistant", "toggle").with_entity(entity);
            send(host, call)
        }
        ActionDescriptor::CallService {
            domain,
            service,
            data,
        } => {
            let call = ServiceCall {
                domain: domain.clone(),
                service: service.clone(),
                data: data.clone(),
            };
            send(host, call)
        }
        ActionDescriptor::Navigate { .. }
        | ActionDescriptor::OpenUrl { .. }
        | ActionDescriptor::MoreInfo { .. } => {
            tracing::debug!(action = action.name(), entity = ?entity, "Dispatching action");
            host.dispatch(action, entity)?;
            Ok(ActionOutcome::Dispatched)
        }
        ActionDescriptor::None => Ok(ActionOutcome::Skipped),
    }
}

fn send(host: &dyn Host, call: ServiceCall) -> Result<ActionOutcome, HostError> {
    tracing::debug!(service = %call, entity = ?call.entity_id(), "Calling service");
    host.call_service(call.clone())?;
    Ok(ActionOutcome::Called(call))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::RecordingHost;

    #[test]
    fn toggle_without_entity_is_skipped() {
        let host = RecordingHost::new();
        let outcome = interpret(&ActionDescriptor::Toggle, None, &host).unwrap();
        assert_eq!(outcome, ActionOutcome::Skipped);
        assert!(host.calls().is_empty());
    }

    #[test]
    fn call_service_forwards_data() {
        let host = RecordingHost::new();
        let action: ActionDescriptor = serde_json::from_value(serde_json::json!({
            "action": "call-service",
            "domain": "script",
            "service": "good_night",
            "service_data": {"delay": 5}
        }))
        .unwrap();

        interpret(&action, Some("light.desk"), &host).unwrap();
        let call = host.last_call().unwrap();
        assert_eq!(call.to_string(), "script.good_night");
        assert_eq!(call.data["delay"], 5);
        assert_eq!(call.entity_id(), None);
    }

    #[test]
    fn more_info_goes_to_dispatcher() {
        let host = RecordingHost::new();
        let action = ActionDescriptor::MoreInfo { entity: None };
        let outcome = interpret(&action, Some("fan.ceiling"), &host).unwrap();
        assert_eq!(outcome, ActionOutcome::Dispatched);
        assert_eq!(
            host.actions(),
            vec![(action, Some("fan.ceiling".to_string()))]
        );
    }

    #[test]
    fn dispatcher_errors_propagate() {
        let host = RecordingHost::new().with_unsupported_actions();
        let result = interpret(&ActionDescriptor::navigate("/"), None, &host);
        assert!(matches!(result, Err(HostError::Unsupported(_))));
    }

    #[test]
    fn none_does_nothing() {
        let host = RecordingHost::new();
        let outcome = interpret(&ActionDescriptor::None, Some("light.desk"), &host).unwrap();
        assert_eq!(outcome, ActionOutcome::Skipped);
        assert!(host.calls().is_empty() && host.actions().is_empty());
    }
}
