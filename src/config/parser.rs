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

//! src/config/parser.rs
//!
//! Bindings file parser
//!
//! ```text
//! # comment
//! $term = xterm -e htop
//! keybinding = <Control><Alt>h
//! bind = <Super>Return, exec, $term
//! bind = <Control><Alt>l, log, lock requested
//! ```
//!
//! It handles:
//! - `bind` lines (`bind = ACCELERATOR, ACTION[, ARGS]`)
//! - one optional `keybinding` line (the status hotkey)
//! - `$name = value` variables, substituted everywhere after definition
//! - Comments and blank lines
//! - Line numbers for error reporting
//!
//! # Security
//! The parser only structures data; it never runs anything. All
//! validation happens in `validator.rs` after parsing.

use nom::{
    bytes::complete::{tag, take_till1, take_while1},
    character::complete::{char, space0},
    combinator::{opt, rest},
    sequence::preceded,
    IResult, Parser,
};
use regex::{Captures, Regex};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::LazyLock;
use thiserror::Error;

static VARIABLE_DEFINITION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\$([A-Za-z_][A-Za-z0-9_]*)\s*=\s*(.*)$")
        .expect("variable definition pattern should be valid regex")
});

static VARIABLE_REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$([A-Za-z_][A-Za-z0-9_]*)").expect("variable reference pattern should be valid regex")
});

/// Parse errors with line number context
#[derive(Debug, Error, PartialEq)]
pub enum ParseError {
    #[error("Parse error on line {line}: {message}")]
    InvalidSyntax { line: usize, message: String },

    #[error("Undefined variable '${variable}' on line {line}")]
    UndefinedVariable { variable: String, line: usize },

    #[error("Duplicate 'keybinding' on line {line} (first on line {first})")]
    DuplicateKeybinding { line: usize, first: usize },
}

impl ParseError {
    /// Line the error was found on.
    pub fn line(&self) -> usize {
        match self {
            ParseError::InvalidSyntax { line, .. }
            | ParseError::UndefinedVariable { line, .. }
            | ParseError::DuplicateKeybinding { line, .. } => *line,
        }
    }
}

/// One `bind` line
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BindingSpec {
    /// 1-based line in the source file
    pub line: usize,

    /// Accelerator as written, e.g. `<Super>Return`
    pub accelerator: String,

    /// Action name, e.g. `exec`
    pub action: String,

    /// Everything after the action's comma, trimmed
    pub args: Option<String>,
}

impl BindingSpec {
    /// True if both lines describe the same binding, wherever they sit in the file.
    pub fn same_binding(&self, other: &BindingSpec) -> bool {
        self.accelerator == other.accelerator
            && self.action.eq_ignore_ascii_case(&other.action)
            && self.args == other.args
    }
}

/// Parsed bindings file
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ConfigFile {
    /// Status hotkey (`keybinding = ...`), with its line
    pub keybinding: Option<(usize, String)>,

    pub bindings: Vec<BindingSpec>,
}

/// Parse a complete bindings file
///
/// Variables are substituted in order: a `$name` must be defined on an
/// earlier line than its first use.
pub fn parse_config(content: &str) -> Result<ConfigFile, ParseError> {
    let mut variables: HashMap<String, String> = HashMap::new();
    let mut config = ConfigFile::default();

    for (index, raw) in content.lines().enumerate() {
        let line = index + 1;
        let trimmed = raw.trim();

        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        if let Some(caps) = VARIABLE_DEFINITION.captures(trimmed) {
            let name = caps[1].to_string();
            let value = substitute_variables(caps[2].trim(), &variables, line)?;
            variables.insert(name, value);
            continue;
        }

        let substituted = substitute_variables(trimmed, &variables, line)?;

        if let Ok((_, accelerator)) = parse_keybinding_line(&substituted) {
            if let Some((first, _)) = config.keybinding {
                return Err(ParseError::DuplicateKeybinding { line, first });
            }
            config.keybinding = Some((line, accelerator.to_string()));
            continue;
        }

        match parse_bind_line(&substituted) {
            Ok((_, (accelerator, action, args))) => config.bindings.push(BindingSpec {
                line,
                accelerator: accelerator.to_string(),
                action: action.to_string(),
                args,
            }),
            Err(_) => {
                return Err(ParseError::InvalidSyntax {
                    line,
                    message: format!("expected 'bind = ACCELERATOR, ACTION[, ARGS]', found '{}'", trimmed),
                });
            }
        }
    }

    Ok(config)
}

/// Replace every `$name` with its value
pub fn substitute_variables(
    input: &str,
    variables: &HashMap<String, String>,
    line: usize,
) -> Result<String, ParseError> {
    if let Some(missing) = VARIABLE_REFERENCE
        .captures_iter(input)
        .map(|caps| caps[1].to_string())
        .find(|name| !variables.contains_key(name))
    {
        return Err(ParseError::UndefinedVariable {
            variable: missing,
            line,
        });
    }

    Ok(VARIABLE_REFERENCE
        .replace_all(input, |caps: &Captures| {
            variables.get(&caps[1]).cloned().unwrap_or_default()
        })
        .into_owned())
}

/// Parse a single bind line
///
/// Format: `bind = ACCELERATOR, ACTION[, ARGS]`
/// Example: `bind = <Super>Return, exec, xterm`
pub fn parse_bind_line(input: &str) -> IResult<&str, (&str, &str, Option<String>)> {
    let (input, _) = (tag("bind"), space0, char('='), space0).parse(input)?;
    let (input, accelerator) = take_till1(|c: char| c == ',')(input)?;
    let (input, _) = (char(','), space0).parse(input)?;
    let (input, action) = take_while1(|c: char| c.is_alphanumeric() || c == '_')(input)?;
    let (input, _) = space0(input)?;
    let (input, args) = opt(preceded((char(','), space0), rest)).parse(input)?;

    if !input.trim().is_empty() {
        return Err(nom::Err::Error(nom::error::Error::new(
            input,
            nom::error::ErrorKind::Eof,
        )));
    }

    let args = args
        .map(|s: &str| s.trim().to_string())
        .filter(|s| !s.is_empty());

    Ok((input, (accelerator.trim(), action, args)))
}

/// Parse `keybinding = ACCELERATOR`
pub fn parse_keybinding_line(input: &str) -> IResult<&str, &str> {
    let (input, _) = (tag("keybinding"), space0, char('='), space0).parse(input)?;
    let (input, accelerator) = rest(input)?;
    let accelerator = accelerator.trim();

    if accelerator.is_empty() {
        return Err(nom::Err::Error(nom::error::Error::new(
            input,
            nom::error::ErrorKind::TakeWhile1,
        )));
    }

    Ok((input, accelerator))
}
