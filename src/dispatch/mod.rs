// Copyright 2025 Eric Jingryd (tidynest@proton.me)
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Event dispatch loop
//!
//! One dedicated thread owns the [`EventSource`]. For every key press it:
//!
//! 1. records the event time
//! 2. drops presses of pure modifier keys (a chord still being composed)
//! 3. canonicalises (state, keycode) into a `KeyCombination`
//! 4. copies the matching `Binding` out of the registry (short lock)
//! 5. hands it to the [`InvocationGate`], which re-confirms the binding
//!    under the gate and calls the handler outside the registry lock
//!
//! # States
//!
//! ```text
//! Idle --event--> Dispatching --done/discarded--> Idle
//!   \                                             /
//!    +------------- shutdown -----> Stopped <----+
//! ```
//!
//! `Stopped` is terminal.

pub mod gate;

pub use gate::{GateGuard, Invocation, InvocationGate};

use std::io;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU8, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, error, info};

use crate::backend::{EventSource, KeyPress, NativeEvent};
use crate::core::{BindingRegistry, KeyCombination, Keymap};

/// Name of the dispatch thread
pub const THREAD_NAME: &str = "hotkey-dispatch";

/// Dispatch loop state
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[repr(u8)]
pub enum LoopState {
    /// Blocked waiting for the next native event
    Idle = 0,

    /// Normalising and routing one event
    Dispatching = 1,

    /// Terminal; never left
    Stopped = 2,
}

impl LoopState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => LoopState::Idle,
            1 => LoopState::Dispatching,
            _ => LoopState::Stopped,
        }
    }
}

/// State shared between the dispatch thread and the service
#[derive(Debug)]
pub struct LoopStatus {
    state: AtomicU8,
    stopping: AtomicBool,
    last_event_time: AtomicU32,
}

impl Default for LoopStatus {
    fn default() -> Self {
        Self {
            state: AtomicU8::new(LoopState::Idle as u8),
            stopping: AtomicBool::new(false),
            last_event_time: AtomicU32::new(0),
        }
    }
}

impl LoopStatus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> LoopState {
        LoopState::from_u8(self.state.load(Ordering::SeqCst))
    }

    /// Moves to `state` unless already `Stopped`.
    fn transition(&self, state: LoopState) {
        let _ = self
            .state
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |current| {
                (current != LoopState::Stopped as u8).then_some(state as u8)
            });
    }

    pub fn mark_stopped(&self) {
        self.state.store(LoopState::Stopped as u8, Ordering::SeqCst);
    }

    /// Asks the loop to exit before it dispatches anything else.
    pub fn request_stop(&self) {
        self.stopping.store(true, Ordering::SeqCst);
    }

    pub fn is_stopping(&self) -> bool {
        self.stopping.load(Ordering::SeqCst)
    }

    /// Server time of the most recent key event, 0 before the first.
    pub fn last_event_time(&self) -> u32 {
        self.last_event_time.load(Ordering::SeqCst)
    }
}

/// What happened to one key press
#[derive(Clone, Debug, PartialEq)]
pub enum Outcome {
    /// Handler ran to completion
    Invoked(KeyCombination),

    /// Handler ran and failed; the failure was logged
    HandlerFailed(KeyCombination),

    /// Nothing is bound to this combination
    NoMatch(KeyCombination),

    /// The keycode is a modifier key
    ModifierOnly,

    /// The keycode has no nameable keysym
    UnknownKeycode,

    /// The binding was removed between lookup and invocation
    Stale(KeyCombination),
}

/// Routes key presses to bound handlers
#[derive(Clone)]
pub struct Dispatcher {
    keymap: Arc<Keymap>,
    registry: Arc<BindingRegistry>,
    gate: Arc<InvocationGate>,
    status: Arc<LoopStatus>,
}

impl Dispatcher {
    pub fn new(
        keymap: Arc<Keymap>,
        registry: Arc<BindingRegistry>,
        gate: Arc<InvocationGate>,
        status: Arc<LoopStatus>,
    ) -> Self {
        Self {
            keymap,
            registry,
            gate,
            status,
        }
    }

    /// Normalises and routes a single key press.
    pub fn handle(&self, press: KeyPress) -> Outcome {
        self.status
            .last_event_time
            .store(press.time, Ordering::SeqCst);

        if self.keymap.is_modifier(press.keycode) {
            return Outcome::ModifierOnly;
        }

        let Some(combination) = self.keymap.canonical(press.state, press.keycode) else {
            return Outcome::UnknownKeycode;
        };

        // Copy out under the registry lock, invoke without it.
        let Some(binding) = self.registry.find(&combination) else {
            return Outcome::NoMatch(combination);
        };

        let args = binding.call_args();
        let invocation = self.gate.invoke(&combination, &binding.handler, &args, || {
            self.registry.is_current(&combination, binding.id)
        });

        match invocation {
            Invocation::Completed => Outcome::Invoked(combination),
            Invocation::Failed(_) => Outcome::HandlerFailed(combination),
            Invocation::Dropped => Outcome::Stale(combination),
        }
    }

    /// Runs until the event source closes or a stop is requested.
    pub fn run(&self, mut events: Box<dyn EventSource>) {
        info!("Dispatch loop started");

        while !self.status.is_stopping() {
            self.status.transition(LoopState::Idle);

            let press = match events.next_event() {
                Ok(Some(NativeEvent::KeyPress(press))) => press,
                Ok(Some(NativeEvent::Wakeup)) => continue,
                Ok(None) => {
                    info!("Event source closed");
                    break;
                }
                Err(err) => {
                    error!(error = %err, "Event source failed; stopping dispatch");
                    break;
                }
            };

            if self.status.is_stopping() {
                debug!(keycode = press.keycode, "Dropping key press received during shutdown");
                break;
            }

            self.status.transition(LoopState::Dispatching);
            match self.handle(press) {
                Outcome::Invoked(combination) => {
                    debug!(combination = %combination, time = press.time, "Dispatched hotkey")
                }
                Outcome::Stale(combination) => {
                    debug!(combination = %combination, "Dropped event for unbound hotkey")
                }
                outcome => debug!(?outcome, keycode = press.keycode, "Key press not dispatched"),
            }
        }

        self.status.mark_stopped();
        info!("Dispatch loop stopped");
    }
}

/// Starts the dispatch loop on its own thread.
pub fn spawn(dispatcher: Dispatcher, events: Box<dyn EventSource>) -> io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name(THREAD_NAME.to_string())
        .spawn(move || dispatcher.run(events))
}

#[cfg(test)]
mod tests;
