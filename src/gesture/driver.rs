// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! A tokio task that runs a gesture binding against the real clock.
//!
//! The driver owns the binding. Pointer events go in through
//! [`DriverHandle::send`]; every [`GestureOutput`] comes back out through
//! [`DriverHandle::recv`]. Haptic pulses are also forwarded to the host's
//! [`Haptics`]. Ripple growth is emitted one scheduler turn after the press,
//! standing in for the next paint.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::control::PointerEvent;
use crate::host::Haptics;

use super::binding::GestureBinding;
use super::engine::GestureOutput;

/// Capacity of the event and output channels.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 64;

/// Sleep used when no timer is pending; the select branch is disabled then.
const IDLE_SLEEP: Duration = Duration::from_secs(3600);

/// Spawns and runs gesture bindings on the tokio runtime.
pub struct GestureDriver {
    binding: GestureBinding,
    haptics: Arc<dyn Haptics>,
    events: mpsc::Receiver<PointerEvent>,
    outputs: mpsc::Sender<GestureOutput>,
}

impl GestureDriver {
    /// Spawns a driver task for `binding`.
    ///
    /// The task ends, detaching the binding, once the handle is shut down
    /// or dropped.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::sync::Arc;
    /// use room_card::control::{Bounds, PointerEvent};
    /// use room_card::gesture::{GestureDriver, GestureEngine, GestureKind, GestureOptions};
    /// use room_card::host::NoHaptics;
    ///
    /// # #[tokio::main(flavor = "current_thread")]
    /// # async fn main() {
    /// let binding = GestureEngine::attach(GestureOptions::default(), Bounds::default());
    /// let mut handle = GestureDriver::spawn(binding, Arc::new(NoHaptics));
    ///
    /// handle.send(PointerEvent::down(0.0, 0.0)).await;
    /// handle.send(PointerEvent::up(0.0, 0.0)).await;
    ///
    /// let kind = handle.next_gesture().await;
    /// assert_eq!(kind, Some(GestureKind::Tap));
    /// # }
    /// ```
    #[must_use]
    pub fn spawn(binding: GestureBinding, haptics: Arc<dyn Haptics>) -> DriverHandle {
        let (event_tx, event_rx) = mpsc::channel(DEFAULT_CHANNEL_CAPACITY);
        let (output_tx, output_rx) = mpsc::channel(DEFAULT_CHANNEL_CAPACITY);

        let driver = Self {
            binding,
            haptics,
            events: event_rx,
            outputs: output_tx,
        };
        let task = tokio::spawn(driver.run());

        DriverHandle {
            events: Some(event_tx),
            outputs: output_rx,
            task,
        }
    }

    async fn run(mut self) {
        tracing::debug!(binding = %self.binding.id(), "Gesture driver started");

        loop {
            let deadline = self.binding.next_deadline().map(Instant::from_std);
            let sleep_at = deadline.unwrap_or_else(|| Instant::now() + IDLE_SLEEP);

            let outputs = tokio::select! {
                event = self.events.recv() => {
                    let Some(event) = event else {
                        break;
                    };
                    let mut outputs = self.binding.handle(&event, Instant::now().into_std());
                    let started_ripple = outputs
                        .iter()
                        .any(|o| matches!(o, GestureOutput::RippleStart(_)));
                    if started_ripple {
                        self.publish(std::mem::take(&mut outputs)).await;
                        tokio::task::yield_now().await;
                        outputs = self.binding.frame();
                    }
                    outputs
                }
                () = tokio::time::sleep_until(sleep_at), if deadline.is_some() => {
                    self.binding.poll(Instant::now().into_std())
                }
            };

            self.publish(outputs).await;
        }

        let removals = self.binding.detach();
        self.publish(removals).await;
        tracing::debug!(binding = %self.binding.id(), "Gesture driver stopped");
    }

    async fn publish(&self, outputs: Vec<GestureOutput>) {
        for output in outputs {
            if let GestureOutput::Haptic(pulse) = output {
                self.haptics.vibrate(pulse);
            }
            if self.outputs.send(output).await.is_err() {
                tracing::trace!("Gesture output receiver dropped");
            }
        }
    }
}

/// The caller's side of a running [`GestureDriver`].
#[derive(Debug)]
pub struct DriverHandle {
    events: Option<mpsc::Sender<PointerEvent>>,
    outputs: mpsc::Receiver<GestureOutput>,
    task: JoinHandle<()>,
}

impl DriverHandle {
    /// Sends a pointer event. Returns `false` if the driver has stopped.
    pub async fn send(&self, event: PointerEvent) -> bool {
        match &self.events {
            Some(events) => events.send(event).await.is_ok(),
            None => false,
        }
    }

    /// Receives the next output, `None` once the driver has stopped.
    pub async fn recv(&mut self) -> Option<GestureOutput> {
        self.outputs.recv().await
    }

    /// Skips non-gesture outputs until a gesture arrives.
    pub async fn next_gesture(&mut self) -> Option<super::GestureKind> {
        while let Some(output) = self.recv().await {
            if let Some(kind) = output.gesture() {
                return Some(kind);
            }
        }
        None
    }

    /// Stops the driver and returns every output it had not delivered yet,
    /// including the ripple removals produced by detaching.
    pub async fn shutdown(mut self) -> Vec<GestureOutput> {
        self.events = None;
        let mut remaining = Vec::new();
        while let Some(output) = self.outputs.recv().await {
            remaining.push(output);
        }
        if let Err(e) = (&mut self.task).await {
            tracing::warn!(error = %e, "Gesture driver task failed");
        }
        remaining
    }
}
