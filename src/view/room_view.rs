// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The room card: configuration, live state and user input in one place.

use std::time::Instant;

use serde_json::Value;

use crate::action::interpret;
use crate::config::{DeviceDescriptor, RoomConfig, RoomDescriptor};
use crate::control::{Bounds, CircularControl, PointerEvent};
use crate::error::{ConfigError, HostError, TemplateError};
use crate::event::{CardEvent, DeviceToggled};
use crate::gesture::{GestureBinding, GestureEngine, GestureKind, GestureOutput};
use crate::host::{Host, StateProvider};
use crate::state::{ControlSpec, DeviceViewModel, EntityState};
use crate::template::value::to_text;
use crate::template::{TemplateContext, TemplateEngine, TemplateResult};
use crate::types::{CssColor, DeviceValue, Temperature, TemperatureBand, TemperatureUnit};

use super::commands::{toggle_command, value_command};
use super::derive::current_value;

/// Temperature and humidity readout of the room.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoomClimate {
    /// Reading of the temperature sensor.
    pub temperature: Option<Temperature>,
    /// Band of `temperature`.
    pub band: Option<TemperatureBand>,
    /// Background color for `band`.
    pub background: Option<CssColor>,
    /// Reading of the humidity sensor, in percent.
    pub humidity: Option<f64>,
}

/// A gesture output of one device's chip, for rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct ChipEffect {
    /// The device whose chip produced the output.
    pub entity: String,
    /// A ripple output; gestures and haptics are handled by the view.
    pub output: GestureOutput,
}

/// What the view produced from pointer input or timers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Feedback {
    /// Notifications for the host.
    pub events: Vec<CardEvent>,
    /// Ripple outputs to draw.
    pub effects: Vec<ChipEffect>,
}

impl Feedback {
    /// Returns `true` if nothing was produced.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty() && self.effects.is_empty()
    }

    fn extend(&mut self, other: Self) {
        self.events.extend(other.events);
        self.effects.extend(other.effects);
    }
}

#[derive(Debug)]
struct DeviceSlot {
    descriptor: DeviceDescriptor,
    control: CircularControl,
    gestures: GestureBinding,
    model: DeviceViewModel,
    last_sent: Option<DeviceValue>,
}

impl DeviceSlot {
    fn new(descriptor: DeviceDescriptor) -> Self {
        let value = current_value(&descriptor, None);
        let control = CircularControl::new(descriptor.control.clone(), Bounds::default())
            .with_value(value.clone());
        let gestures =
            GestureEngine::attach(descriptor.actions.gesture_options(), Bounds::default());
        let model = DeviceViewModel {
            entity: descriptor.entity.clone(),
            name: descriptor.name.clone().unwrap_or_else(|| descriptor.entity.clone()),
            kind: descriptor.kind,
            control: descriptor.control.clone(),
            current_value: value,
            is_on: false,
            available: false,
        };
        Self {
            descriptor,
            control,
            gestures,
            model,
            last_sent: None,
        }
    }

    fn entity(&self) -> &str {
        &self.descriptor.entity
    }
}

/// A validated room with one circular control and one gesture binding per
/// device.
///
/// The view is driven from outside: [`update`](Self::update) on every host
/// state change, the `handle_*` methods on user input and
/// [`poll`](Self::poll) when [`next_deadline`](Self::next_deadline) passes.
/// Every host effect goes through the [`Host`] passed to the call.
///
/// # Examples
///
/// ```
/// use room_card::config::{DeviceConfig, RoomConfig};
/// use room_card::host::RecordingHost;
/// use room_card::state::{EntityState, StateSnapshot};
/// use room_card::template::TemplateEngine;
/// use room_card::view::RoomView;
///
/// let config = RoomConfig::new("Office")
///     .with_device(DeviceConfig::new("light.desk", "light"));
/// let mut view = RoomView::new(&config, TemplateEngine::new()).unwrap();
///
/// let states = StateSnapshot::new()
///     .with(EntityState::new("light.desk", "on").with_attribute("brightness", 255));
/// view.update(&states);
/// assert!(view.device("light.desk").unwrap().is_on);
///
/// let host = RecordingHost::new();
/// view.handle_chip("light.desk", &host).unwrap();
/// assert_eq!(host.calls()[0].to_string(), "light.turn_off");
/// ```
#[derive(Debug)]
pub struct RoomView {
    room: RoomDescriptor,
    config: Value,
    engine: TemplateEngine,
    devices: Vec<DeviceSlot>,
    name: String,
    climate: RoomClimate,
    template_errors: Vec<TemplateError>,
}

impl RoomView {
    /// Validates `config` and builds the view.
    ///
    /// Names are shown unresolved until the first [`update`](Self::update).
    ///
    /// # Errors
    ///
    /// Returns the [`ConfigError`] of [`RoomConfig::validate`].
    pub fn new(config: &RoomConfig, engine: TemplateEngine) -> Result<Self, ConfigError> {
        let room = config.validate()?;
        let raw = serde_json::to_value(config)?;
        let devices = room.devices.iter().cloned().map(DeviceSlot::new).collect();

        tracing::debug!(room = %room.name, devices = room.devices.len(), "Room view created");

        Ok(Self {
            name: room.name.clone(),
            room,
            config: raw,
            engine,
            devices,
            climate: RoomClimate::default(),
            template_errors: Vec::new(),
        })
    }

    /// Returns the validated configuration.
    #[must_use]
    pub fn room(&self) -> &RoomDescriptor {
        &self.room
    }

    /// Returns the room name with templates resolved.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the temperature and humidity readout.
    #[must_use]
    pub fn climate(&self) -> &RoomClimate {
        &self.climate
    }

    /// Iterates over the device view models in display order.
    pub fn devices(&self) -> impl Iterator<Item = &DeviceViewModel> {
        self.devices.iter().map(|slot| &slot.model)
    }

    /// Returns one device's view model.
    #[must_use]
    pub fn device(&self, entity: &str) -> Option<&DeviceViewModel> {
        self.slot(entity).ok().map(|slot| &slot.model)
    }

    /// Returns one device's circular control.
    #[must_use]
    pub fn control(&self, entity: &str) -> Option<&CircularControl> {
        self.slot(entity).ok().map(|slot| &slot.control)
    }

    /// Returns one device's gesture binding.
    #[must_use]
    pub fn gestures(&self, entity: &str) -> Option<&GestureBinding> {
        self.slot(entity).ok().map(|slot| &slot.gestures)
    }

    /// Returns the template errors of the last update.
    ///
    /// Failing templates render as their literal text; this is the record.
    #[must_use]
    pub fn template_errors(&self) -> &[TemplateError] {
        &self.template_errors
    }

    /// Records where a device's slider ring was laid out.
    ///
    /// # Errors
    ///
    /// Returns [`HostError::UnknownEntity`] if the room has no such device.
    pub fn set_slider_bounds(&mut self, entity: &str, bounds: Bounds) -> Result<(), HostError> {
        self.slot_mut(entity)?.control.set_bounds(bounds);
        Ok(())
    }

    /// Records where a device's chip was laid out.
    ///
    /// # Errors
    ///
    /// Returns [`HostError::UnknownEntity`] if the room has no such device.
    pub fn set_chip_bounds(&mut self, entity: &str, bounds: Bounds) -> Result<(), HostError> {
        self.slot_mut(entity)?.gestures.set_bounds(bounds);
        Ok(())
    }

    /// Recomputes everything derived from host state.
    ///
    /// Missing entities and unusable values never fail: devices show their
    /// default value and read as unavailable. A slider being dragged keeps
    /// the value under the pointer.
    pub fn update(&mut self, states: &dyn StateProvider) {
        let ctx = TemplateContext::new(states.to_snapshot()).with_config(self.config.clone());
        let engine = &self.engine;
        let errors = &mut self.template_errors;
        errors.clear();

        self.name = resolve(engine, &self.room.name, &ctx, errors);

        for slot in &mut self.devices {
            let state = states.state(slot.entity());
            let name = match &slot.descriptor.name {
                Some(name) => {
                    let ctx = ctx.clone().with_entity(slot.entity());
                    resolve(engine, name, &ctx, errors)
                }
                None => fallback_name(slot.entity(), state),
            };
            let value = current_value(&slot.descriptor, state);
            slot.control.set_value(value.clone());

            slot.model = DeviceViewModel {
                entity: slot.descriptor.entity.clone(),
                name,
                kind: slot.descriptor.kind,
                control: slot.descriptor.control.clone(),
                current_value: value,
                is_on: state.is_some_and(EntityState::is_on),
                available: state.is_some_and(EntityState::is_available),
            };
        }

        self.climate = read_climate(&self.room, states);

        tracing::debug!(
            room = %self.name,
            band = ?self.climate.band,
            template_errors = self.template_errors.len(),
            "Room view updated"
        );
    }

    /// Feeds a pointer event to a device's slider.
    ///
    /// A value that differs from the last one sent during this drag is
    /// snapped to the step, reported as [`CardEvent::ValueChanged`] and
    /// sent to the host as the kind's service call.
    ///
    /// # Errors
    ///
    /// Returns [`HostError::UnknownEntity`] if the room has no such device.
    /// Service call failures are logged, not returned.
    pub fn handle_slider(
        &mut self,
        entity: &str,
        event: &PointerEvent,
        host: &dyn Host,
    ) -> Result<Vec<CardEvent>, HostError> {
        let slot = self.slot_mut(entity)?;
        if matches!(event, PointerEvent::Down { .. }) && !slot.control.is_dragging() {
            slot.last_sent = None;
        }

        let Some(changed) = slot.control.handle(event) else {
            return Ok(Vec::new());
        };
        let value = snap(&slot.descriptor.control, changed.value);
        if slot.last_sent.as_ref() == Some(&value) {
            return Ok(Vec::new());
        }
        slot.last_sent = Some(value.clone());
        slot.model.current_value = value.clone();

        match value_command(slot.descriptor.kind, entity, &slot.descriptor.control, &value) {
            Some(call) => {
                tracing::debug!(entity, service = %call, value = %value, "Slider value");
                if let Err(e) = host.call_service(call) {
                    tracing::warn!(entity, error = %e, "Service call failed");
                }
            }
            None => tracing::debug!(entity, value = %value, "No command for slider value"),
        }

        Ok(vec![CardEvent::value_changed(entity, value)])
    }

    /// Toggles a device from its chip.
    ///
    /// # Errors
    ///
    /// Returns [`HostError::UnknownEntity`] if the room has no such device.
    /// Service call failures are logged, not returned.
    pub fn handle_chip(&self, entity: &str, host: &dyn Host) -> Result<Vec<CardEvent>, HostError> {
        let slot = self.slot(entity)?;
        let is_on = slot.model.is_on;
        let call = toggle_command(slot.descriptor.kind, entity, is_on);

        tracing::debug!(entity, service = %call, "Chip toggle");
        if let Err(e) = host.call_service(call) {
            tracing::warn!(entity, error = %e, "Service call failed");
        }

        Ok(vec![CardEvent::DeviceToggled(DeviceToggled {
            entity: entity.to_string(),
            current_state: is_on,
        })])
    }

    /// Runs the action configured for a classified gesture.
    ///
    /// # Errors
    ///
    /// Returns [`HostError::UnknownEntity`] if the room has no such device.
    /// Host failures while running the action are logged, not returned.
    pub fn handle_gesture(
        &self,
        entity: &str,
        kind: GestureKind,
        host: &dyn Host,
    ) -> Result<Vec<CardEvent>, HostError> {
        let slot = self.slot(entity)?;
        let action = slot.descriptor.actions.for_gesture(kind);

        tracing::debug!(entity, gesture = kind.as_str(), action = action.name(), "Gesture");
        if let Err(e) = interpret(&action, Some(entity), host) {
            tracing::warn!(entity, action = action.name(), error = %e, "Action failed");
        }

        Ok(vec![CardEvent::gesture(entity, kind)])
    }

    /// Feeds a pointer event to a device chip's gesture binding.
    ///
    /// Classified gestures run through [`handle_gesture`](Self::handle_gesture)
    /// and haptic pulses go to the host; ripple outputs are returned.
    ///
    /// # Errors
    ///
    /// Returns [`HostError::UnknownEntity`] if the room has no such device.
    pub fn handle_chip_pointer(
        &mut self,
        entity: &str,
        event: &PointerEvent,
        now: Instant,
        host: &dyn Host,
    ) -> Result<Feedback, HostError> {
        let outputs = self.slot_mut(entity)?.gestures.handle(event, now);
        self.apply(entity, outputs, host)
    }

    /// Fires every gesture timer due at `now`.
    pub fn poll(&mut self, now: Instant, host: &dyn Host) -> Feedback {
        self.collect(host, |gestures| gestures.poll(now))
    }

    /// Returns ripple transitions to start on the next paint.
    pub fn frame(&mut self, host: &dyn Host) -> Feedback {
        self.collect(host, GestureBinding::frame)
    }

    /// Returns the earliest pending gesture timer.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        self.devices
            .iter()
            .filter_map(|slot| slot.gestures.next_deadline())
            .min()
    }

    /// Detaches every gesture binding, e.g. when the card is removed.
    ///
    /// Returns the removals of ripples still on display.
    pub fn detach(&mut self) -> Vec<ChipEffect> {
        let mut effects = Vec::new();
        for slot in &mut self.devices {
            let entity = slot.descriptor.entity.clone();
            effects.extend(slot.gestures.detach().into_iter().map(|output| ChipEffect {
                entity: entity.clone(),
                output,
            }));
        }
        tracing::debug!(room = %self.name, "Room view detached");
        effects
    }

    fn collect(
        &mut self,
        host: &dyn Host,
        mut step: impl FnMut(&mut GestureBinding) -> Vec<GestureOutput>,
    ) -> Feedback {
        let due: Vec<(String, Vec<GestureOutput>)> = self
            .devices
            .iter_mut()
            .map(|slot| (slot.descriptor.entity.clone(), step(&mut slot.gestures)))
            .filter(|(_, outputs)| !outputs.is_empty())
            .collect();

        let mut feedback = Feedback::default();
        for (entity, outputs) in due {
            // Entities come from our own slots.
            if let Ok(part) = self.apply(&entity, outputs, host) {
                feedback.extend(part);
            }
        }
        feedback
    }

    fn apply(
        &self,
        entity: &str,
        outputs: Vec<GestureOutput>,
        host: &dyn Host,
    ) -> Result<Feedback, HostError> {
        let mut feedback = Feedback::default();
        for output in outputs {
            match output {
                GestureOutput::Gesture(kind) => {
                    feedback.events.extend(self.handle_gesture(entity, kind, host)?);
                }
                GestureOutput::Haptic(pulse) => host.vibrate(pulse),
                GestureOutput::RippleStart(_)
                | GestureOutput::RippleGrow(_)
                | GestureOutput::RippleRemove(_) => feedback.effects.push(ChipEffect {
                    entity: entity.to_string(),
                    output,
                }),
            }
        }
        Ok(feedback)
    }

    fn slot(&self, entity: &str) -> Result<&DeviceSlot, HostError> {
        self.devices
            .iter()
            .find(|slot| slot.entity() == entity)
            .ok_or_else(|| HostError::UnknownEntity(entity.to_string()))
    }

    fn slot_mut(&mut self, entity: &str) -> Result<&mut DeviceSlot, HostError> {
        self.devices
            .iter_mut()
            .find(|slot| slot.entity() == entity)
            .ok_or_else(|| HostError::UnknownEntity(entity.to_string()))
    }
}

/// Resolves a possibly templated display string.
fn resolve(
    engine: &TemplateEngine,
    text: &str,
    ctx: &TemplateContext,
    errors: &mut Vec<TemplateError>,
) -> String {
    let TemplateResult { value, error, .. } = engine.process_str(text, ctx);
    if let Some(error) = error {
        errors.push(error);
    }
    match value {
        Value::String(text) => text,
        other => to_text(&other),
    }
}

fn fallback_name(entity: &str, state: Option<&EntityState>) -> String {
    state
        .and_then(|s| s.attribute_str("friendly_name"))
        .unwrap_or(entity)
        .to_string()
}

fn snap(control: &ControlSpec, value: DeviceValue) -> DeviceValue {
    match (control, value) {
        (ControlSpec::Continuous(range), DeviceValue::Number(v)) => {
            DeviceValue::Number(range.snap(v))
        }
        (_, value) => value,
    }
}

fn read_climate(room: &RoomDescriptor, states: &dyn StateProvider) -> RoomClimate {
    let temperature = room
        .temperature_sensor
        .as_deref()
        .and_then(|entity| states.state(entity))
        .and_then(|sensor| {
            let unit = TemperatureUnit::from_unit_of_measurement(
                sensor.attribute_str("unit_of_measurement"),
            );
            Temperature::new(sensor.state_f64()?, unit).ok()
        });
    let band = temperature.map(|t| t.band());
    let humidity = room
        .humidity_sensor
        .as_deref()
        .and_then(|entity| states.state(entity))
        .and_then(EntityState::state_f64)
        .filter(|h| h.is_finite());

    RoomClimate {
        temperature,
        band,
        background: band.map(|band| room.background_colors.get(band).clone()),
        humidity,
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::json;

    use super::*;
    use crate::action::ActionDescriptor;
    use crate::config::DeviceConfig;
    use crate::host::RecordingHost;
    use crate::state::StateSnapshot;
    use crate::types::ModeSelection;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn config() -> RoomConfig {
        RoomConfig::new("Living room")
            .with_temperature_sensor("sensor.temperature")
            .with_humidity_sensor("sensor.humidity")
            .with_device(DeviceConfig::new("light.ceiling", "light"))
            .with_device(
                DeviceConfig::new("fan.tower", "fan")
                    .with_name("Fan [[[ return states['fan.tower'].state ]]]")
                    .with_modes(["low", "medium", "high"])
                    .with_hold_action(ActionDescriptor::MoreInfo { entity: None }),
            )
    }

    fn states() -> StateSnapshot {
        StateSnapshot::new()
            .with(
                EntityState::new("light.ceiling", "on")
                    .with_attribute("brightness", 51)
                    .with_attribute("friendly_name", "Ceiling"),
            )
            .with(EntityState::new("fan.tower", "on").with_attribute("preset_mode", "high"))
            .with(
                EntityState::new("sensor.temperature", "21.4")
                    .with_attribute("unit_of_measurement", "°C"),
            )
            .with(EntityState::new("sensor.humidity", "44"))
    }

    fn view() -> RoomView {
        let mut view = RoomView::new(&config(), TemplateEngine::new()).unwrap();
        view.set_slider_bounds("light.ceiling", Bounds::new(0.0, 0.0, 100.0, 100.0))
            .unwrap();
        view.set_chip_bounds("fan.tower", Bounds::new(0.0, 0.0, 80.0, 40.0))
            .unwrap();
        view.update(&states());
        view
    }

    #[test]
    fn update_derives_models() {
        let view = view();
        let light = view.device("light.ceiling").unwrap();
        assert_eq!(light.name, "Ceiling");
        assert_eq!(light.current_value, DeviceValue::Number(20.0));
        assert!(light.is_on && light.available);

        let fan = view.device("fan.tower").unwrap();
        assert_eq!(fan.name, "Fan on");
        assert_eq!(fan.current_value, DeviceValue::Mode(ModeSelection::new("high", 2)));
        assert!(view.template_errors().is_empty());
    }

    #[test]
    fn update_reads_climate() {
        let view = view();
        let climate = view.climate();
        assert_eq!(climate.band, Some(TemperatureBand::Comfortable));
        assert_eq!(
            climate.background.as_ref(),
            Some(&TemperatureBand::Comfortable.default_color())
        );
        assert_eq!(climate.humidity, Some(44.0));
    }

    #[test]
    fn missing_entities_are_unavailable() {
        let mut view = view();
        view.update(&StateSnapshot::new());
        let light = view.device("light.ceiling").unwrap();
        assert!(!light.available && !light.is_on);
        assert_eq!(light.name, "light.ceiling");
        assert_eq!(view.climate(), &RoomClimate::default());
    }

    #[test]
    fn broken_name_template_keeps_text() {
        let config = RoomConfig::new("Room [[[ return ( ]]]");
        let mut view = RoomView::new(&config, TemplateEngine::new()).unwrap();
        view.update(&StateSnapshot::new());
        assert_eq!(view.name(), "Room [[[ return ( ]]]");
        assert_eq!(view.template_errors().len(), 1);
    }

    #[test]
    fn slider_sends_snapped_value_once() {
        let mut view = view();
        let host = RecordingHost::new();

        // Straight below the center is a quarter turn.
        let events = view
            .handle_slider("light.ceiling", &PointerEvent::down(50.0, 100.0), &host)
            .unwrap();
        assert_eq!(
            events,
            vec![CardEvent::value_changed(
                "light.ceiling",
                DeviceValue::Number(25.0)
            )]
        );

        let again = view
            .handle_slider("light.ceiling", &PointerEvent::moved(50.0, 100.0), &host)
            .unwrap();
        assert!(again.is_empty());

        let call = host.last_call().unwrap();
        assert_eq!(call.to_string(), "light.turn_on");
        assert_eq!(call.data["brightness_pct"], json!(25));
        assert_eq!(host.calls().len(), 1);
    }

    #[test]
    fn chip_toggles_off_when_on() {
        let view = view();
        let host = RecordingHost::new();
        let events = view.handle_chip("fan.tower", &host).unwrap();
        assert_eq!(
            events,
            vec![CardEvent::DeviceToggled(DeviceToggled {
                entity: "fan.tower".to_string(),
                current_state: true,
            })]
        );
        assert_eq!(host.last_call().unwrap().to_string(), "fan.turn_off");
    }

    #[test]
    fn unknown_entity_is_an_error() {
        let view = view();
        let host = RecordingHost::new();
        assert_eq!(
            view.handle_chip("light.attic", &host),
            Err(HostError::UnknownEntity("light.attic".to_string()))
        );
    }

    #[test]
    fn chip_hold_runs_hold_action() {
        let mut view = view();
        let host = RecordingHost::new();
        let t0 = Instant::now();

        let pressed = view
            .handle_chip_pointer("fan.tower", &PointerEvent::down(10.0, 10.0), t0, &host)
            .unwrap();
        assert!(pressed.events.is_empty());
        assert!(matches!(
            pressed.effects[0].output,
            GestureOutput::RippleStart(_)
        ));
        assert_eq!(view.next_deadline(), Some(t0 + ms(500)));

        let held = view.poll(t0 + ms(500), &host);
        assert_eq!(held.events, vec![CardEvent::gesture("fan.tower", GestureKind::Hold)]);
        assert_eq!(host.actions().len(), 1);
        assert_eq!(host.vibrations(), vec![ms(50)]);
    }

    #[test]
    fn chip_tap_toggles_through_default_action() {
        let mut view = view();
        let host = RecordingHost::new();
        let t0 = Instant::now();

        view.handle_chip_pointer("light.ceiling", &PointerEvent::down(5.0, 5.0), t0, &host)
            .unwrap();
        let released = view
            .handle_chip_pointer("light.ceiling", &PointerEvent::up(5.0, 5.0), t0 + ms(80), &host)
            .unwrap();
        assert_eq!(
            released.events,
            vec![CardEvent::gesture("light.ceiling", GestureKind::Tap)]
        );
        assert_eq!(host.last_call().unwrap().to_string(), "homeassistant.toggle");
    }

    #[test]
    fn detach_drops_bindings() {
        let mut view = view();
        let host = RecordingHost::new();
        let press = PointerEvent::down(10.0, 10.0);
        view.handle_chip_pointer("fan.tower", &press, Instant::now(), &host)
            .unwrap();
        let removed = view.detach();
        assert_eq!(removed.len(), 1);
        assert!(matches!(removed[0].output, GestureOutput::RippleRemove(_)));
        assert!(!view.gestures("fan.tower").unwrap().is_attached());
        assert!(view.next_deadline().is_none());
    }
}
