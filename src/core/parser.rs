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

//! src/core/parser.rs
//!
//! Accelerator string parser
//!
//! Parses GTK-style accelerators: zero or more `<Modifier>` tokens followed
//! by a keysym name, e.g. `<Control><Alt>t`, `<Super>Return`, `F12`.
//!
//! # Architecture
//! The modifier prefix is parsed with nom combinators; the remaining text
//! is the key name and is resolved through the keysym table. Resolution
//! to physical keycodes happens later in `Keymap::resolve`, because only
//! the keymap knows which keycode carries a keysym.

use nom::{
    bytes::complete::take_while1,
    character::complete::{char, space0},
    multi::many0,
    sequence::delimited,
    IResult, Parser,
};
use thiserror::Error;

use crate::core::keysym::keysym_from_name;
use crate::core::types::{Accelerator, Modifier};

/// Accelerator parse errors
#[derive(Debug, Error, PartialEq)]
pub enum AcceleratorError {
    #[error("empty key combination")]
    Empty,

    #[error("unknown modifier '<{0}>'")]
    UnknownModifier(String),

    #[error("unterminated modifier in '{0}'")]
    Unterminated(String),

    #[error("key combination '{0}' has modifiers but no key")]
    MissingKey(String),

    #[error("unknown key name '{0}'")]
    UnknownKey(String),
}

/// Parse a complete accelerator string
///
/// # Example
/// ```
/// use hotkey_binder::core::parser::parse_accelerator;
/// use hotkey_binder::core::Modifier;
///
/// let accel = parse_accelerator("<Ctrl><Alt>t").unwrap();
/// assert_eq!(accel.modifiers, vec![Modifier::Control, Modifier::Alt]);
/// assert_eq!(accel.key_name, "t");
/// ```
pub fn parse_accelerator(input: &str) -> Result<Accelerator, AcceleratorError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(AcceleratorError::Empty);
    }

    let (rest, tokens) = match modifier_tokens(input) {
        Ok(parsed) => parsed,
        Err(_) => return Err(AcceleratorError::Unterminated(input.to_string())),
    };

    let mut modifiers = Vec::with_capacity(tokens.len());
    for token in tokens {
        let modifier = Modifier::from_token(token)
            .ok_or_else(|| AcceleratorError::UnknownModifier(token.to_string()))?;
        modifiers.push(modifier);
    }

    let key_name = rest.trim();
    if key_name.starts_with('<') {
        return Err(AcceleratorError::Unterminated(input.to_string()));
    }
    if key_name.is_empty() {
        return Err(AcceleratorError::MissingKey(input.to_string()));
    }

    let keysym = keysym_from_name(key_name)
        .ok_or_else(|| AcceleratorError::UnknownKey(key_name.to_string()))?;

    Ok(Accelerator::new(modifiers, keysym, key_name))
}

/// Parse the `<Modifier>` prefix
///
/// Whitespace between tokens is tolerated (`<Control> <Alt> t`).
pub fn modifier_tokens(input: &str) -> IResult<&str, Vec<&str>> {
    many0(delimited(space0, modifier_token, space0)).parse(input)
}

/// Parse one `<Name>` token, returning the name
pub fn modifier_token(input: &str) -> IResult<&str, &str> {
    delimited(
        char('<'),
        take_while1(|c: char| c.is_ascii_alphanumeric() || c == '_'),
        char('>'),
    )
    .parse(input)
}
