// Copyright 2025 bakri (tidynest@proton.me)
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

//! Global hotkeys for X11
//!
//! Registers system-wide key combinations with the X server, dispatches
//! matching key presses to handlers on a dedicated thread, and answers
//! "how long has the user been idle" through MIT-SCREEN-SAVER.
//!
//! # Features
//!
//! - **Canonical combinations:** `<ctrl><alt>T` and `<Control><Alt>t` are one binding
//! - **Lock-key agnostic:** CapsLock, NumLock and ScrollLock never break a hotkey
//! - **Safe rebind:** a handler never runs for a binding removed before it was entered
//! - **Single admission:** handlers run behind a reentrant runtime gate
//! - **Live reload:** bindings files are re-applied as a diff when they change
//!
//! # Architecture
//!
//! - **`core`:** Data model (modifiers, accelerators, keymap, registry, values)
//! - **`backend`:** Grab adapters (X11 via x11rb, in-memory simulation)
//! - **`dispatch`:** Event loop thread and the invocation gate
//! - **`service`:** `HotkeyService` and the single-hotkey `Keybinder`
//! - **`idle`:** Idle-time probe
//! - **`config`:** Bindings file parsing, validation and reload
//!
//! # Examples
//!
//! ## Binding a hotkey
//!
//! ```no_run
//! use hotkey_binder::backend::x11;
//! use hotkey_binder::{Handler, HotkeyService};
//!
//! let (backend, events) = x11::connect(None)?;
//! let service = HotkeyService::new(backend, events)?;
//!
//! service.bind("<Super>Return", Handler::new(|_| Ok(())), Vec::new())?;
//! service.start()?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Checking a bindings file
//!
//! ```
//! use hotkey_binder::config::check_config;
//!
//! let report = check_config("bind = <Ctrl><Alt>t, exec, xterm\n");
//! assert!(report.is_clean());
//! ```
//!
//! ## Querying idle time
//!
//! ```no_run
//! use hotkey_binder::IdleProbe;
//!
//! let probe = IdleProbe::init(None);
//! println!("idle for {}s", probe.idle_seconds());
//! ```

pub mod backend;
pub mod config;
pub mod core;
pub mod dispatch;
pub mod idle;
pub mod service;

// Re-export commonly used types for convenience
pub use core::{Handler, HandlerError, KeyCombination, Modifier, Value};
pub use dispatch::LoopState;
pub use idle::IdleProbe;
pub use service::{BindError, HotkeyService, Keybinder};
