// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Room Card - the interaction core of a smart-home dashboard room card.
//!
//! The card shows a room's temperature and humidity and one control per
//! device. The dashboard host supplies entity state and executes commands;
//! this library supplies everything in between.
//!
//! # Components
//!
//! - **Circular control** ([`control`]): maps a pointer position on a ring
//!   to a value, either a number in a range or one of a list of modes
//! - **Gesture engine** ([`gesture`]): tells tap, hold and double tap apart
//!   and drives the ripple feedback of a pressed element
//! - **Template engine** ([`template`]): resolves `[[[ ... ]]]` blocks and
//!   `${...}` interpolation in configuration strings against live state
//! - **Room view** ([`view`]): validated configuration, derived view models
//!   and the wiring from user input to host commands
//!
//! # Quick Start
//!
//! ```
//! use room_card::config::RoomConfig;
//! use room_card::control::{Bounds, PointerEvent};
//! use room_card::host::RecordingHost;
//! use room_card::state::{EntityState, StateSnapshot};
//! use room_card::template::TemplateEngine;
//! use room_card::view::RoomView;
//!
//! fn main() -> room_card::Result<()> {
//!     let config = RoomConfig::from_json(
//!         r#"{
//!             "name": "Kitchen",
//!             "temperature_sensor": "sensor.kitchen_temperature",
//!             "devices": [{"entity": "light.counter", "type": "light"}]
//!         }"#,
//!     )?;
//!
//!     let mut view = RoomView::new(&config, TemplateEngine::new())?;
//!     view.set_slider_bounds("light.counter", Bounds::new(0.0, 0.0, 200.0, 200.0))?;
//!
//!     let states = StateSnapshot::new().with(EntityState::new("light.counter", "off"));
//!     view.update(&states);
//!
//!     // Drag to the bottom of the ring: a quarter of the range.
//!     let host = RecordingHost::new();
//!     view.handle_slider("light.counter", &PointerEvent::down(100.0, 200.0), &host)?;
//!     assert_eq!(host.calls()[0].to_string(), "light.turn_on");
//!     Ok(())
//! }
//! ```
//!
//! # Errors
//!
//! Only configuration errors reach the host. Template failures keep the
//! literal text and are recorded, missing entities read as unavailable and
//! degenerate geometry turns input into a no-op.
//!
//! # Features
//!
//! - `driver` (default): a tokio task running a gesture binding on real
//!   timers, see [`gesture::GestureDriver`]

pub mod action;
pub mod config;
pub mod control;
pub mod error;
pub mod event;
pub mod gesture;
pub mod host;
pub mod state;
pub mod template;
pub mod types;
pub mod view;

pub use action::{ActionDescriptor, ActionOutcome, ActionSet, interpret};
pub use config::{DeviceConfig, RoomConfig};
pub use control::CircularControl;
pub use error::{ConfigError, Error, HostError, Result, TemplateError, ValueError};
pub use event::CardEvent;
pub use gesture::{GestureBinding, GestureEngine, GestureKind, GestureOptions, GestureOutput};
pub use host::{Host, StateProvider};
pub use template::{TemplateCache, TemplateContext, TemplateEngine};
pub use view::RoomView;
