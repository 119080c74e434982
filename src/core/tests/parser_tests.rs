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

//! Parser module tests
//!
//! Tests for parsing accelerator strings:
//! - Modifier token parsing and aliases
//! - Key name resolution
//! - Malformed input

use crate::core::{
    parser::*,
    types::Modifier,
};

#[test]
fn test_parse_modifier_token() {
    assert_eq!(modifier_token("<Control>t").unwrap(), ("t", "Control"));
    assert!(modifier_token("Control").is_err());
    assert!(modifier_token("<>t").is_err());
}

#[test]
fn test_parse_modifier_tokens() {
    let (rest, tokens) = modifier_tokens("<Control> <Alt>t").unwrap();
    assert_eq!(tokens, vec!["Control", "Alt"]);
    assert_eq!(rest, "t");

    let (rest, tokens) = modifier_tokens("F1").unwrap();
    assert!(tokens.is_empty());
    assert_eq!(rest, "F1");
}

#[test]
fn test_parse_accelerator() {
    let accel = parse_accelerator("<Control><Alt>t").unwrap();
    assert_eq!(accel.modifiers, vec![Modifier::Control, Modifier::Alt]);
    assert_eq!(accel.keysym, 0x74);
    assert_eq!(accel.key_name, "t");
}

#[test]
fn test_parse_accelerator_aliases() {
    let a = parse_accelerator("<ctrl><mod1>t").unwrap();
    let b = parse_accelerator("<Alt><Primary>t").unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_parse_accelerator_without_modifiers() {
    let accel = parse_accelerator("  F12 ").unwrap();
    assert!(accel.modifiers.is_empty());
    assert_eq!(accel.keysym, 0xffc9);
}

#[test]
fn test_parse_accelerator_named_key() {
    let accel = parse_accelerator("<Super>return").unwrap();
    assert_eq!(accel.modifiers, vec![Modifier::Super]);
    assert_eq!(accel.keysym, 0xff0d);
}

#[test]
fn test_empty_accelerator() {
    assert_eq!(parse_accelerator("   "), Err(AcceleratorError::Empty));
}

#[test]
fn test_unknown_modifier() {
    assert_eq!(
        parse_accelerator("<Release>t"),
        Err(AcceleratorError::UnknownModifier("Release".to_string()))
    );
}

#[test]
fn test_missing_key() {
    assert!(matches!(
        parse_accelerator("<Control><Alt>"),
        Err(AcceleratorError::MissingKey(_))
    ));
}

#[test]
fn test_unterminated_modifier() {
    assert!(matches!(
        parse_accelerator("<Control t"),
        Err(AcceleratorError::Unterminated(_))
    ));
}

#[test]
fn test_unknown_key() {
    assert_eq!(
        parse_accelerator("<Control>NoSuchKey"),
        Err(AcceleratorError::UnknownKey("NoSuchKey".to_string()))
    );
}
