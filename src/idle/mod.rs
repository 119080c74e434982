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

//! Idle-time probe
//!
//! Answers one question: how many whole seconds since the user last
//! touched keyboard or mouse. Stateless apart from the open connection.
//! Anything that goes wrong (no display, no MIT-SCREEN-SAVER extension, a
//! failed query) reads as 0 seconds idle.

pub mod x11;

pub use x11::ScreenSaverIdle;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Something that knows the time since last user input
pub trait IdleSource: Send {
    /// Milliseconds since last input, `None` if it cannot be determined.
    fn idle_millis(&self) -> Option<u64>;
}

/// Idle probe over an [`IdleSource`]
pub struct IdleProbe<S: IdleSource = ScreenSaverIdle> {
    source: Option<S>,
}

impl IdleProbe<ScreenSaverIdle> {
    /// Opens the display (`None` → `$DISPLAY`).
    ///
    /// Never fails: an unreachable display gives a probe that reports 0.
    pub fn init(display: Option<&str>) -> Self {
        match ScreenSaverIdle::connect(display) {
            Ok(source) => Self::with_source(source),
            Err(err) => {
                warn!(error = %err, "Idle probe unavailable");
                Self::unavailable()
            }
        }
    }
}

impl<S: IdleSource> IdleProbe<S> {
    pub fn with_source(source: S) -> Self {
        Self {
            source: Some(source),
        }
    }

    /// A probe that always reports 0.
    pub fn unavailable() -> Self {
        Self { source: None }
    }

    /// Whole seconds since last input, 0 if unknown.
    pub fn idle_seconds(&self) -> u64 {
        self.source
            .as_ref()
            .and_then(|source| source.idle_millis())
            .map(|ms| ms / 1000)
            .unwrap_or(0)
    }

    pub fn is_available(&self) -> bool {
        self.source.is_some()
    }

    /// Releases the connection; later queries report 0.
    pub fn close(&mut self) {
        if self.source.take().is_some() {
            debug!("Idle probe closed");
        }
    }
}

/// Hand-driven idle clock
///
/// Clones share the same clock, so a test can keep one handle and give
/// the other to an [`IdleProbe`].
#[derive(Clone, Debug, Default)]
pub struct ManualIdleClock {
    idle_ms: Arc<AtomicU64>,
}

impl ManualIdleClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// User input happened: idle time drops to zero.
    pub fn input(&self) {
        self.idle_ms.store(0, Ordering::SeqCst);
    }

    /// Time passes with no input.
    pub fn advance(&self, by: Duration) {
        let ms = u64::try_from(by.as_millis()).unwrap_or(u64::MAX);
        let _ = self
            .idle_ms
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |idle| {
                Some(idle.saturating_add(ms))
            });
    }
}

impl IdleSource for ManualIdleClock {
    fn idle_millis(&self) -> Option<u64> {
        Some(self.idle_ms.load(Ordering::SeqCst))
    }
}

#[cfg(test)]
mod tests;
