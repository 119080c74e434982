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

//! Global hotkey service
//!
//! [`HotkeyService`] is the owned object that ties the pieces together:
//! one backend, one keymap snapshot, one registry, one invocation gate and
//! (after [`HotkeyService::start`]) one dispatch thread.
//!
//! # Guarantees
//!
//! - A combination is in the registry if and only if it is grabbed: the
//!   grab is issued under the registry lock and a refused grab leaves no
//!   entry behind.
//! - bind/unbind take effect for the next event the loop observes.
//! - A handler is never called for a binding that was removed before the
//!   handler could be entered.
//!
//! # Example
//!
//! ```
//! use hotkey_binder::backend::simulated::SimulatedDisplay;
//! use hotkey_binder::core::{Handler, Value};
//! use hotkey_binder::service::HotkeyService;
//!
//! let (display, events) = SimulatedDisplay::new();
//! let service = HotkeyService::new(display.clone(), events)?;
//!
//! let handler = Handler::new(|args| {
//!     println!("pressed {}", args[0]);
//!     Ok(())
//! });
//! service.bind("<Ctrl><Alt>T", handler, vec![Value::from("x")])?;
//! service.start()?;
//!
//! display.press("<Control><Alt>t");
//! service.unbind("<Control><Alt>t")?;
//! service.shutdown();
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod error;
pub mod keybinder;

pub use error::BindError;
pub use keybinder::Keybinder;

use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, info, warn};

use crate::backend::{BackendError, EventSource, GrabBackend};
use crate::core::{
    Accelerator, Binding, BindingId, BindingRegistry, Handler, KeyCombination, Keymap, NativeCombo,
    ResolveError, Value,
};
use crate::dispatch::{self, Dispatcher, InvocationGate, LoopState, LoopStatus};

/// Where the service is in its one-way lifecycle
enum Phase {
    /// Constructed; the event source waits to be handed to the loop
    Ready(Box<dyn EventSource>),

    /// Dispatch thread running
    Running(JoinHandle<()>),

    /// Shut down (or failed to start); terminal
    Stopped,
}

impl Phase {
    fn describe(&self) -> &'static str {
        match self {
            Phase::Ready(_) => "not started",
            Phase::Running(_) => "already running",
            Phase::Stopped => "shut down",
        }
    }
}

/// Global hotkey registration service
pub struct HotkeyService {
    backend: Arc<dyn GrabBackend>,
    keymap: Arc<Keymap>,
    registry: Arc<BindingRegistry>,
    gate: Arc<InvocationGate>,
    status: Arc<LoopStatus>,
    phase: Mutex<Phase>,
    next_id: AtomicU64,
}

impl HotkeyService {
    /// Creates a service over a backend and its event source.
    ///
    /// Takes the keymap snapshot immediately; the loop is not running until
    /// [`start`](Self::start).
    pub fn new<B, E>(backend: B, events: E) -> Result<Self, BackendError>
    where
        B: GrabBackend + 'static,
        E: EventSource + 'static,
    {
        let keymap = backend.keymap()?;
        debug!(
            backend = backend.name(),
            modifiers = keymap.modifier_keycodes().len(),
            "Keymap loaded"
        );

        Ok(Self {
            backend: Arc::new(backend),
            keymap: Arc::new(keymap),
            registry: Arc::new(BindingRegistry::new()),
            gate: Arc::new(InvocationGate::new()),
            status: Arc::new(LoopStatus::new()),
            phase: Mutex::new(Phase::Ready(Box::new(events))),
            next_id: AtomicU64::new(1),
        })
    }

    /// Binds `accelerator` to `handler`
    ///
    /// On every trigger the handler receives the canonical combination
    /// string followed by `extra`, unchanged and in order.
    ///
    /// # Errors
    ///
    /// - `InvalidArgument` for an unparsable accelerator or a modifier key
    /// - `DuplicateKey` if the canonical combination is already bound
    /// - `GrabFailed` if the windowing system refuses the grab
    /// - `Lifecycle` after shutdown
    ///
    /// Returns the canonical combination actually bound.
    pub fn bind(
        &self,
        accelerator: &str,
        handler: Handler,
        extra: Vec<Value>,
    ) -> Result<KeyCombination, BindError> {
        let (native, combination) = self.canonicalise(accelerator).map_err(|err| match err {
            Lookup::Invalid(reason) => BindError::InvalidArgument(reason),
            Lookup::NotOnKeyboard(reason) => BindError::GrabFailed {
                combination: accelerator.to_string(),
                reason,
            },
        })?;

        // Presses on modifier keycodes never reach lookup, so such a grab
        // could never fire.
        if self.keymap.is_modifier(native.keycode) {
            return Err(BindError::InvalidArgument(format!(
                "'{}' is a modifier key and cannot be a hotkey",
                accelerator
            )));
        }

        let ignored = self.keymap.ignored_mask();
        self.registry.insert_with(combination.clone(), || {
            // Checked under the registry lock, which shutdown drains under.
            if self.status.is_stopping() {
                return Err(BindError::Lifecycle("service is shut down".to_string()));
            }

            self.backend.grab(&native, ignored).map_err(|err| {
                warn!(combination = %combination, error = %err, "Grab refused");
                BindError::GrabFailed {
                    combination: combination.to_string(),
                    reason: err.to_string(),
                }
            })?;

            let id = BindingId(self.next_id.fetch_add(1, Ordering::SeqCst));
            Ok(Binding::new(id, combination.clone(), native, handler, extra))
        })?;

        info!(combination = %combination, "Bound hotkey");
        Ok(combination)
    }

    /// Dynamic call shape: `[combination, handler, extra...]`.
    pub fn bind_values(&self, args: Vec<Value>) -> Result<KeyCombination, BindError> {
        if args.len() < 2 {
            return Err(BindError::InvalidArgument(format!(
                "expected a key combination and a handler, got {} argument(s)",
                args.len()
            )));
        }

        let mut args = args.into_iter();
        let (Some(first), Some(second)) = (args.next(), args.next()) else {
            return Err(BindError::InvalidArgument("missing arguments".to_string()));
        };

        let Value::Str(accelerator) = first else {
            return Err(BindError::InvalidArgument(format!(
                "key combination must be a string, got {}",
                first.type_name()
            )));
        };
        let Value::Callable(handler) = second else {
            return Err(BindError::TypeMismatch(format!(
                "handler must be callable, got {}",
                second.type_name()
            )));
        };

        self.bind(&accelerator, handler, args.collect())
    }

    /// Unbinds `accelerator`, releasing its grab.
    ///
    /// # Errors
    ///
    /// `NotFound` if it is not bound (registry unchanged), `InvalidArgument`
    /// if it cannot be parsed.
    pub fn unbind(&self, accelerator: &str) -> Result<(), BindError> {
        let (_, combination) = self.canonicalise(accelerator).map_err(|err| match err {
            Lookup::Invalid(reason) => BindError::InvalidArgument(reason),
            Lookup::NotOnKeyboard(_) => BindError::NotFound(accelerator.to_string()),
        })?;

        let ignored = self.keymap.ignored_mask();
        self.registry
            .remove_with(&combination, |binding| self.backend.ungrab(&binding.grab, ignored))?;

        info!(combination = %combination, "Unbound hotkey");
        Ok(())
    }

    /// True if `keycode` belongs to a pure modifier key.
    pub fn is_modifier(&self, keycode: u32) -> bool {
        u8::try_from(keycode).is_ok_and(|keycode| self.keymap.is_modifier(keycode))
    }

    /// Server timestamp of the most recent processed key event (0 before any).
    pub fn current_event_time(&self) -> u32 {
        self.status.last_event_time()
    }

    /// Spawns the dispatch thread. Allowed exactly once.
    pub fn start(&self) -> Result<(), BindError> {
        let mut phase = self.phase.lock();
        let events = match std::mem::replace(&mut *phase, Phase::Stopped) {
            Phase::Ready(events) => events,
            other => {
                let reason = format!("cannot start: service {}", other.describe());
                *phase = other;
                return Err(BindError::Lifecycle(reason));
            }
        };

        let dispatcher = Dispatcher::new(
            Arc::clone(&self.keymap),
            Arc::clone(&self.registry),
            Arc::clone(&self.gate),
            Arc::clone(&self.status),
        );

        match dispatch::spawn(dispatcher, events) {
            Ok(handle) => {
                *phase = Phase::Running(handle);
                info!(backend = self.backend.name(), "Hotkey service started");
                Ok(())
            }
            Err(err) => {
                self.status.mark_stopped();
                Err(BindError::Lifecycle(format!("failed to spawn dispatch thread: {}", err)))
            }
        }
    }

    /// Stops the service for good
    ///
    /// Ungrabs everything, empties the registry, wakes and joins the
    /// dispatch thread. Ungrab problems are ignored. Calling it again is a
    /// no-op.
    ///
    /// The join is skipped when called from a handler or while this thread
    /// holds the [`runtime`](Self::runtime) gate. The loop then exits on its
    /// own once the gate is released, dropping any event it was holding.
    pub fn shutdown(&self) {
        let worker = {
            let mut phase = self.phase.lock();
            if matches!(*phase, Phase::Stopped) && self.status.is_stopping() {
                return;
            }

            self.status.request_stop();
            let ignored = self.keymap.ignored_mask();
            let released = self
                .registry
                .drain_with(|binding| self.backend.ungrab(&binding.grab, ignored));
            info!(released = released.len(), "Shutting down hotkey service");

            match std::mem::replace(&mut *phase, Phase::Stopped) {
                Phase::Running(handle) => Some(handle),
                _ => None,
            }
        };

        self.backend.wake();

        if let Some(handle) = worker {
            if handle.thread().id() == thread::current().id() {
                // Called from a handler; the loop exits once it returns.
                debug!("Shutdown requested from the dispatch thread");
            } else if self.gate.is_held_by_current_thread() {
                // The loop may be waiting on the gate we hold.
                debug!("Shutdown requested under the runtime gate; not joining");
            } else if handle.join().is_err() {
                warn!("Dispatch thread panicked");
            }
        }

        self.status.mark_stopped();
    }

    /// Bound combinations, sorted.
    pub fn bindings(&self) -> Vec<KeyCombination> {
        self.registry.combinations()
    }

    pub fn state(&self) -> LoopState {
        self.status.state()
    }

    /// The single-admission gate handlers run under.
    pub fn runtime(&self) -> &InvocationGate {
        &self.gate
    }

    pub fn keymap(&self) -> &Keymap {
        &self.keymap
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Canonical combination an accelerator binds as, without binding it.
    pub fn canonical_form(&self, accelerator: &str) -> Result<KeyCombination, BindError> {
        self.canonicalise(accelerator)
            .map(|(_, combination)| combination)
            .map_err(|err| match err {
                Lookup::Invalid(reason) | Lookup::NotOnKeyboard(reason) => {
                    BindError::InvalidArgument(reason)
                }
            })
    }

    fn canonicalise(&self, accelerator: &str) -> Result<(NativeCombo, KeyCombination), Lookup> {
        let parsed = Accelerator::parse(accelerator)
            .map_err(|err| Lookup::Invalid(format!("'{}': {}", accelerator, err)))?;

        let native = self.keymap.resolve(&parsed).map_err(|err| match err {
            ResolveError::NoKeycode(_) => Lookup::NotOnKeyboard(err.to_string()),
            ResolveError::UnmappedModifier(_) => Lookup::Invalid(err.to_string()),
        })?;

        let combination = self
            .keymap
            .canonical(native.mask, native.keycode)
            .ok_or_else(|| Lookup::Invalid(format!("'{}' has no nameable key", accelerator)))?;

        Ok((native, combination))
    }
}

impl Drop for HotkeyService {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Why an accelerator could not be turned into a combination
enum Lookup {
    Invalid(String),
    NotOnKeyboard(String),
}

#[cfg(test)]
mod tests;
