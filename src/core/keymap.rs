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

//! Keyboard mapping snapshot and key combination canonicalisation
//!
//! A `Keymap` is captured once from the backend when the service starts
//! and is read-only afterwards. It is the single place where accelerators
//! become physical (mask, keycode) pairs and where physical events become
//! `KeyCombination` strings, so binding and dispatch always agree.
//!
//! # Canonicalisation
//!
//! Both directions go through [`Keymap::canonical`]:
//!
//! ```text
//! "<Ctrl><Alt>T" --parse--> Accelerator --resolve--> (CONTROL|MOD1, 28) --canonical--> "<Control><Alt>t"
//! KeyPress{state: CONTROL|MOD1|MOD2, detail: 28} ---------------------------canonical--> "<Control><Alt>t"
//! ```
//!
//! Lock modifiers (CapsLock, NumLock, ScrollLock) are stripped, and real
//! bits are claimed by the first virtual modifier in canonical order, so
//! left/right variants and aliases (`<Meta>` on an Alt key) collapse.

use std::collections::{HashMap, HashSet};
use thiserror::Error;

use crate::core::keysym::{self, is_modifier_keysym};
use crate::core::types::{Accelerator, KeyCombination, Keycode, Keysym, ModMask, Modifier, NativeCombo};

/// Accelerator resolution failures
#[derive(Debug, Error, PartialEq)]
pub enum ResolveError {
    /// The keysym exists but no key on this keyboard produces it
    #[error("no keycode produces keysym '{0}' on this keyboard")]
    NoKeycode(String),

    /// The virtual modifier has no real modifier bit on this keyboard
    #[error("modifier {0} is not mapped on this keyboard")]
    UnmappedModifier(Modifier),
}

/// Virtual → real modifier assignment
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ModifierResolution {
    pub alt: ModMask,
    pub super_: ModMask,
    pub hyper: ModMask,
    pub meta: ModMask,
    pub num_lock: ModMask,
    pub scroll_lock: ModMask,
}

impl Default for ModifierResolution {
    /// Assignment used by stock Xorg keymaps.
    fn default() -> Self {
        Self {
            alt: ModMask::MOD1,
            super_: ModMask::MOD4,
            hyper: ModMask::MOD4,
            meta: ModMask::MOD1,
            num_lock: ModMask::MOD2,
            scroll_lock: ModMask::MOD5,
        }
    }
}

impl ModifierResolution {
    /// Real bits for one virtual modifier.
    pub fn mask_of(&self, modifier: Modifier) -> ModMask {
        match modifier {
            Modifier::Shift => ModMask::SHIFT,
            Modifier::Control => ModMask::CONTROL,
            Modifier::Alt => self.alt,
            Modifier::Super => self.super_,
            Modifier::Hyper => self.hyper,
            Modifier::Meta => self.meta,
        }
    }

    /// Bits that never take part in a combination.
    pub fn ignored(&self) -> ModMask {
        ModMask::LOCK | self.num_lock | self.scroll_lock
    }
}

/// Read-only keyboard mapping
#[derive(Clone, Debug)]
pub struct Keymap {
    /// keycode → keysyms per shift level
    levels: HashMap<Keycode, Vec<Keysym>>,

    /// keysym → lowest keycode producing it at any level
    keycodes: HashMap<Keysym, Keycode>,

    /// Keycodes that act as modifiers
    modifier_keycodes: HashSet<Keycode>,

    resolution: ModifierResolution,
}

impl Keymap {
    /// Builds a keymap from raw server tables
    ///
    /// # Arguments
    ///
    /// * `levels` - keysyms per keycode, level 0 first; `0` entries are `NoSymbol`
    /// * `modifier_map` - keycodes per modifier row (Shift, Lock, Control, Mod1..Mod5)
    pub fn new(levels: HashMap<Keycode, Vec<Keysym>>, modifier_map: [Vec<Keycode>; 8]) -> Self {
        let mut keycodes = HashMap::new();
        let mut sorted: Vec<_> = levels.iter().collect();
        sorted.sort_by_key(|(keycode, _)| **keycode);
        for (keycode, syms) in sorted {
            for keysym in syms.iter().filter(|k| **k != 0) {
                keycodes.entry(*keysym).or_insert(*keycode);
            }
        }

        let mut modifier_keycodes: HashSet<Keycode> = modifier_map
            .iter()
            .flatten()
            .copied()
            .filter(|keycode| *keycode != 0)
            .collect();
        for (keycode, syms) in &levels {
            if syms.first().copied().is_some_and(is_modifier_keysym) {
                modifier_keycodes.insert(*keycode);
            }
        }

        let resolution = resolve_virtual_modifiers(&levels, &modifier_map);

        Self {
            levels,
            keycodes,
            modifier_keycodes,
            resolution,
        }
    }

    /// True if `keycode` is a pure modifier key (Shift, Control, ...).
    pub fn is_modifier(&self, keycode: Keycode) -> bool {
        self.modifier_keycodes.contains(&keycode)
    }

    /// Modifier keycodes, sorted.
    pub fn modifier_keycodes(&self) -> Vec<Keycode> {
        let mut codes: Vec<_> = self.modifier_keycodes.iter().copied().collect();
        codes.sort_unstable();
        codes
    }

    /// Base (unshifted) keysym of a keycode.
    pub fn base_keysym(&self, keycode: Keycode) -> Option<Keysym> {
        self.levels
            .get(&keycode)
            .and_then(|syms| syms.first().copied())
            .filter(|k| *k != 0)
    }

    pub fn keycode_for(&self, keysym: Keysym) -> Option<Keycode> {
        self.keycodes.get(&keysym).copied()
    }

    pub fn resolution(&self) -> &ModifierResolution {
        &self.resolution
    }

    /// Lock bits to mask out of events and to cover with grab variants.
    pub fn ignored_mask(&self) -> ModMask {
        self.resolution.ignored()
    }

    /// Turns a parsed accelerator into the physical combination to grab.
    pub fn resolve(&self, accelerator: &Accelerator) -> Result<NativeCombo, ResolveError> {
        let keycode = self
            .keycode_for(accelerator.keysym)
            .ok_or_else(|| ResolveError::NoKeycode(accelerator.key_name.clone()))?;

        let mut mask = ModMask::empty();
        for modifier in &accelerator.modifiers {
            let bits = self.resolution.mask_of(*modifier);
            if bits.is_empty() {
                return Err(ResolveError::UnmappedModifier(*modifier));
            }
            mask |= bits;
        }

        Ok(NativeCombo {
            mask: mask - self.ignored_mask(),
            keycode,
        })
    }

    /// Canonical key combination for a physical (state, keycode) pair.
    ///
    /// Returns `None` when the keycode has no base keysym we can name.
    pub fn canonical(&self, state: ModMask, keycode: Keycode) -> Option<KeyCombination> {
        let key_name = self.base_keysym(keycode).and_then(keysym::keysym_name)?;

        let mut remaining = state - self.ignored_mask();
        let mut modifiers = Vec::new();
        for modifier in Modifier::CANONICAL_ORDER {
            let bits = self.resolution.mask_of(modifier);
            if !bits.is_empty() && remaining.contains(bits) {
                modifiers.push(modifier);
                remaining.remove(bits);
            }
        }

        Some(KeyCombination::from_parts(&modifiers, &key_name))
    }
}

/// Finds which real rows carry Alt, Super, Hyper, Meta, NumLock and
/// ScrollLock, falling back to the stock assignment for anything absent.
fn resolve_virtual_modifiers(
    levels: &HashMap<Keycode, Vec<Keysym>>,
    modifier_map: &[Vec<Keycode>; 8],
) -> ModifierResolution {
    let mut found = ModifierResolution {
        alt: ModMask::empty(),
        super_: ModMask::empty(),
        hyper: ModMask::empty(),
        meta: ModMask::empty(),
        num_lock: ModMask::empty(),
        scroll_lock: ModMask::empty(),
    };

    // Rows 0..3 are Shift, Lock and Control; only Mod1..Mod5 are virtual.
    for (row, keycodes) in modifier_map.iter().enumerate().skip(3) {
        let bit = ModMask::ROWS[row];
        for keycode in keycodes {
            let Some(syms) = levels.get(keycode) else {
                continue;
            };
            for keysym in syms {
                match *keysym {
                    keysym::XK_ALT_L | keysym::XK_ALT_R => found.alt |= bit,
                    keysym::XK_SUPER_L | keysym::XK_SUPER_R => found.super_ |= bit,
                    keysym::XK_HYPER_L | keysym::XK_HYPER_R => found.hyper |= bit,
                    keysym::XK_META_L | keysym::XK_META_R => found.meta |= bit,
                    keysym::XK_NUM_LOCK => found.num_lock |= bit,
                    keysym::XK_SCROLL_LOCK => found.scroll_lock |= bit,
                    _ => {}
                }
            }
        }
    }

    let stock = ModifierResolution::default();
    let or_stock = |bits: ModMask, fallback: ModMask| if bits.is_empty() { fallback } else { bits };

    ModifierResolution {
        alt: or_stock(found.alt, stock.alt),
        super_: or_stock(found.super_, stock.super_),
        hyper: or_stock(found.hyper, stock.hyper),
        meta: or_stock(found.meta, stock.meta),
        num_lock: or_stock(found.num_lock, stock.num_lock),
        scroll_lock: or_stock(found.scroll_lock, stock.scroll_lock),
    }
}
