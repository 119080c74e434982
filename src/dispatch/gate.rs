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

//! Handler invocation boundary
//!
//! The embedding runtime (an interpreter, an application main loop) is
//! assumed to be single-threaded. [`InvocationGate`] is the one lock that
//! stands for "this thread is running runtime code": the dispatch thread
//! takes it around every handler call, and the application takes it
//! (through [`InvocationGate::enter`] or [`InvocationGate::run`]) around
//! its own runtime work.
//!
//! The gate is reentrant for its owning thread, so a handler that calls
//! back into code which itself enters the gate does not deadlock.
//!
//! Handler failures stop here. Both an `Err` return and a panic are logged
//! at `error` level and reported as [`Invocation::Failed`]; the dispatch
//! loop keeps running either way.

use parking_lot::{ReentrantMutex, ReentrantMutexGuard};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use tracing::error;

use crate::core::{HandlerError, Handler, KeyCombination, Value};

/// Result of passing one event through the gate
#[derive(Clone, Debug, PartialEq)]
pub enum Invocation {
    /// The handler ran and returned `Ok`
    Completed,

    /// The handler returned an error or panicked (already logged)
    Failed(HandlerError),

    /// The binding went away while we waited for the gate; nothing ran
    Dropped,
}

/// Held while runtime code executes; releases the gate on drop
pub struct GateGuard<'a> {
    _guard: ReentrantMutexGuard<'a, ()>,
}

/// Single-admission lock around the embedding runtime
#[derive(Debug, Default)]
pub struct InvocationGate {
    lock: ReentrantMutex<()>,
}

impl InvocationGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Blocks until this thread owns the gate.
    pub fn enter(&self) -> GateGuard<'_> {
        GateGuard {
            _guard: self.lock.lock(),
        }
    }

    /// Runs `f` while owning the gate.
    pub fn run<R>(&self, f: impl FnOnce() -> R) -> R {
        let _guard = self.enter();
        f()
    }

    /// True if some thread currently owns the gate.
    pub fn is_held(&self) -> bool {
        self.lock.is_locked()
    }

    /// True if the calling thread owns the gate.
    pub fn is_held_by_current_thread(&self) -> bool {
        self.lock.is_owned_by_current_thread()
    }

    /// Calls `handler` with `args` under the gate
    ///
    /// `still_bound` is evaluated after the gate is acquired and right before
    /// the call. If it returns false the binding was removed while this
    /// event waited, and the handler is not entered.
    pub fn invoke<F>(
        &self,
        combination: &KeyCombination,
        handler: &Handler,
        args: &[Value],
        still_bound: F,
    ) -> Invocation
    where
        F: FnOnce() -> bool,
    {
        let _guard = self.enter();

        if !still_bound() {
            return Invocation::Dropped;
        }

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| handler.call(args)));
        let failure = match outcome {
            Ok(Ok(())) => return Invocation::Completed,
            Ok(Err(err)) => err,
            Err(payload) => HandlerError::Panicked(panic_message(payload.as_ref())),
        };

        error!(combination = %combination, error = %failure, "Hotkey handler failed");
        Invocation::Failed(failure)
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
