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

//! src/core/types.rs
//!
//! Core type definitions for hotkey registration
//!
//! This module defines the fundamental types used throughout the crate:
//! - `Modifier`: Virtual modifier keys as written in accelerators (`<Control>`)
//! - `ModMask`: Real X modifier bits as carried by grabs and key events
//! - `Accelerator`: A parsed, not yet keymap-resolved key combination
//! - `NativeCombo`: The (mask, keycode) pair handed to the grab adapter
//! - `KeyCombination`: The canonical string used as registry key

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::fmt;

/// X11 keycode (8..=255 on every real server).
pub type Keycode = u8;

/// X11 keysym value.
pub type Keysym = u32;

/// Virtual modifier keys
///
/// These are the names users write between angle brackets. Several
/// spellings map to the same variant (`<Ctrl>`, `<Primary>` → Control,
/// `<Mod1>` → Alt, `<Mod4>` → Super).
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum Modifier {
    Shift,
    Control,
    Alt,
    Super,
    Hyper,
    Meta,
}

impl Modifier {
    /// Canonical emission order for key combination strings.
    pub const CANONICAL_ORDER: [Modifier; 6] = [
        Modifier::Shift,
        Modifier::Control,
        Modifier::Alt,
        Modifier::Super,
        Modifier::Hyper,
        Modifier::Meta,
    ];

    /// Maps an accelerator token (text between `<` and `>`) to a modifier.
    ///
    /// Matching is case-insensitive.
    pub fn from_token(token: &str) -> Option<Self> {
        match token.to_ascii_lowercase().as_str() {
            "shift" | "shft" => Some(Modifier::Shift),
            "control" | "ctrl" | "ctl" | "primary" => Some(Modifier::Control),
            "alt" | "mod1" => Some(Modifier::Alt),
            "super" | "mod4" => Some(Modifier::Super),
            "hyper" => Some(Modifier::Hyper),
            "meta" => Some(Modifier::Meta),
            _ => None,
        }
    }
}

impl fmt::Display for Modifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Modifier::Shift => write!(f, "<Shift>"),
            Modifier::Control => write!(f, "<Control>"),
            Modifier::Alt => write!(f, "<Alt>"),
            Modifier::Super => write!(f, "<Super>"),
            Modifier::Hyper => write!(f, "<Hyper>"),
            Modifier::Meta => write!(f, "<Meta>"),
        }
    }
}

bitflags! {
    /// Real X modifier bits (core protocol `SETofKEYMASK`, low byte).
    #[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
    pub struct ModMask: u16 {
        const SHIFT = 1 << 0;
        const LOCK = 1 << 1;
        const CONTROL = 1 << 2;
        const MOD1 = 1 << 3;
        const MOD2 = 1 << 4;
        const MOD3 = 1 << 5;
        const MOD4 = 1 << 6;
        const MOD5 = 1 << 7;
    }
}

impl ModMask {
    /// Real modifier rows in modifier-mapping order.
    pub const ROWS: [ModMask; 8] = [
        ModMask::SHIFT,
        ModMask::LOCK,
        ModMask::CONTROL,
        ModMask::MOD1,
        ModMask::MOD2,
        ModMask::MOD3,
        ModMask::MOD4,
        ModMask::MOD5,
    ];

    /// Builds a mask from an event `state` field, dropping pointer button bits.
    pub fn from_state(state: u16) -> Self {
        ModMask::from_bits_truncate(state & 0x00ff)
    }
}

/// A parsed accelerator such as `<Control><Alt>t`
///
/// Modifiers are sorted and deduplicated on construction so that
/// `<Alt><Control>t` and `<Control><Alt>t` compare equal before any
/// keymap resolution happens.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Accelerator {
    /// Virtual modifiers, sorted in canonical order
    pub modifiers: Vec<Modifier>,

    /// Keysym of the key name as written
    pub keysym: Keysym,

    /// Key name as written by the caller
    pub key_name: String,
}

impl Accelerator {
    /// Creates a new Accelerator with normalised modifiers
    pub fn new(mut modifiers: Vec<Modifier>, keysym: Keysym, key_name: &str) -> Self {
        modifiers.sort();
        modifiers.dedup();

        Self {
            modifiers,
            keysym,
            key_name: key_name.to_string(),
        }
    }

    /// Parses accelerator syntax, see [`crate::core::parser::parse_accelerator`].
    pub fn parse(input: &str) -> Result<Self, crate::core::parser::AcceleratorError> {
        crate::core::parser::parse_accelerator(input)
    }
}

impl fmt::Display for Accelerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for modifier in &self.modifiers {
            write!(f, "{}", modifier)?;
        }
        write!(f, "{}", self.key_name)
    }
}

/// A keymap-resolved combination ready for the grab adapter
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct NativeCombo {
    /// Real modifier bits, lock modifiers excluded
    pub mask: ModMask,

    /// Physical key
    pub keycode: Keycode,
}

/// Canonical modifier+key identity string (e.g. `<Control><Alt>t`)
///
/// Only produced by [`KeyCombination::from_parts`], which fixes modifier
/// order, so equality is plain string equality.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct KeyCombination(String);

impl KeyCombination {
    /// Formats virtual modifiers (in canonical order) and a keysym name.
    pub fn from_parts(modifiers: &[Modifier], key_name: &str) -> Self {
        let mut out = String::new();
        for modifier in Modifier::CANONICAL_ORDER {
            if modifiers.contains(&modifier) {
                out.push_str(&modifier.to_string());
            }
        }
        out.push_str(key_name);
        Self(out)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for KeyCombination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for KeyCombination {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_modifier_display() {
        assert_eq!(format!("{}", Modifier::Control), "<Control>");
        assert_eq!(format!("{}", Modifier::Super), "<Super>");
    }

    #[test]
    fn test_modifier_aliases() {
        assert_eq!(Modifier::from_token("Ctrl"), Some(Modifier::Control));
        assert_eq!(Modifier::from_token("PRIMARY"), Some(Modifier::Control));
        assert_eq!(Modifier::from_token("mod1"), Some(Modifier::Alt));
        assert_eq!(Modifier::from_token("Mod4"), Some(Modifier::Super));
        assert_eq!(Modifier::from_token("Release"), None);
    }

    #[test]
    fn test_mask_from_state_drops_buttons() {
        // Button1 (0x100) is not a modifier
        let mask = ModMask::from_state(0x0100 | 0x0004);
        assert_eq!(mask, ModMask::CONTROL);
    }

    #[test]
    fn test_combination_order_is_fixed() {
        let a = KeyCombination::from_parts(&[Modifier::Alt, Modifier::Control], "t");
        let b = KeyCombination::from_parts(&[Modifier::Control, Modifier::Alt], "t");

        assert_eq!(a, b);
        assert_eq!(a.as_str(), "<Control><Alt>t");
    }
}
