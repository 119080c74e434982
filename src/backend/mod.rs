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

//! Input grab adapter
//!
//! Thin seam between the service and the windowing system. A backend is
//! split in two halves because they live on different threads:
//!
//! - [`GrabBackend`]: grab / ungrab / wake, called from the caller thread
//!   (bind, unbind, shutdown)
//! - [`EventSource`]: blocking "next input event", owned exclusively by
//!   the dispatch thread
//!
//! # Backends
//!
//! - **X11** (`x11`): `XGrabKey` on the root window via x11rb
//! - **Simulated** (`simulated`): in-memory display for tests and dry runs
//!
//! # Example
//! ```
//! use hotkey_binder::backend::{simulated::SimulatedDisplay, GrabBackend};
//!
//! let (display, _events) = SimulatedDisplay::new();
//! let keymap = display.keymap().unwrap();
//! assert!(keymap.is_modifier(50)); // Shift_L
//! ```

pub mod simulated;
pub mod x11;

use thiserror::Error;
use x11rb::errors::{ConnectError, ConnectionError, ReplyError, ReplyOrIdError};

use crate::core::{Keycode, Keymap, ModMask, NativeCombo};

/// Errors raised by a windowing backend
#[derive(Debug, Error)]
pub enum BackendError {
    /// Could not open the display
    #[error("Failed to connect to X display: {0}")]
    Connect(#[from] ConnectError),

    /// The connection broke
    #[error("X connection error: {0}")]
    Connection(#[from] ConnectionError),

    /// A request was answered with an error
    #[error("X request failed: {0}")]
    Reply(#[from] ReplyError),

    /// A request needing a fresh resource id failed
    #[error("X request failed: {0}")]
    ReplyOrId(#[from] ReplyOrIdError),

    /// The display reported fewer screens than the one requested
    #[error("X display has no screen {0}")]
    NoScreen(usize),

    /// Another client already holds a grab on this combination
    #[error("key combination is already grabbed by another client")]
    AlreadyGrabbed,

    /// The backend refused the grab for another reason
    #[error("grab refused: {0}")]
    Refused(String),
}

/// A key press delivered by the windowing system
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct KeyPress {
    pub keycode: Keycode,

    /// Raw modifier state at press time (lock bits included)
    pub state: ModMask,

    /// Server timestamp in milliseconds
    pub time: u32,
}

/// Events surfaced by an [`EventSource`]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum NativeEvent {
    KeyPress(KeyPress),

    /// Posted by [`GrabBackend::wake`] to unblock the dispatch thread
    Wakeup,
}

/// Grab side of a backend
///
/// Implementations must be atomic per call: `grab` either grabs every lock
/// variant of the combination or leaves nothing grabbed. `ungrab` is
/// idempotent and never fails, because teardown ungrabs unconditionally.
pub trait GrabBackend: Send + Sync {
    /// Snapshot of the keyboard mapping, taken once at service construction.
    fn keymap(&self) -> Result<Keymap, BackendError>;

    /// Grabs `combo` plus every combination of the `ignored` lock bits.
    fn grab(&self, combo: &NativeCombo, ignored: ModMask) -> Result<(), BackendError>;

    /// Releases `combo` and its lock variants. Releasing a combination that
    /// is not grabbed is a no-op.
    fn ungrab(&self, combo: &NativeCombo, ignored: ModMask);

    /// Makes a blocked [`EventSource::next_event`] return promptly.
    fn wake(&self);

    /// Human-readable backend name
    fn name(&self) -> &'static str;
}

/// Event side of a backend
pub trait EventSource: Send {
    /// Blocks until the next event.
    ///
    /// `Ok(None)` means the source is closed for good.
    fn next_event(&mut self) -> Result<Option<NativeEvent>, BackendError>;
}

/// Every mask `base | subset` for each subset of `ignored`
///
/// A grab only matches the exact modifier state, so NumLock or CapsLock
/// being on would otherwise hide the hotkey.
pub fn lock_variants(base: ModMask, ignored: ModMask) -> Vec<ModMask> {
    let bits: Vec<ModMask> = ignored.iter().collect();
    let mut variants = Vec::with_capacity(1 << bits.len());

    for selection in 0u32..(1 << bits.len()) {
        let mut mask = base;
        for (i, bit) in bits.iter().enumerate() {
            if selection & (1 << i) != 0 {
                mask |= *bit;
            }
        }
        variants.push(mask);
    }

    variants
}

#[cfg(test)]
mod tests;
