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

//! src/core/mod.rs
//!
//! Core data model
//!
//! This module contains the fundamental data structures for hotkey
//! registration, including:
//! - Type definitions for modifiers, accelerators and key combinations
//! - Accelerator parsing and the keysym name table
//! - The keymap snapshot used to canonicalise combinations
//! - The binding registry using HashMap-based O(1) lookup
//! - Loosely-typed handler values
//!
//! Nothing here talks to a display server, so all of it is unit-testable.

pub mod keymap;
pub mod keysym;
pub mod parser;
pub mod registry;
pub mod types;
pub mod value;

pub use keymap::{Keymap, ModifierResolution, ResolveError};
pub use parser::AcceleratorError;
pub use registry::{Binding, BindingId, BindingRegistry, RegistryError};
pub use types::*;
pub use value::{Handler, HandlerError, Value};

#[cfg(test)]
mod tests;
