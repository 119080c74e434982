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

//! Bindings file validation
//!
//! Whitelist-based checks run on every parsed `bind` line before anything
//! is bound:
//! - the action must be one we know (`exec`, `echo`, `log`)
//! - `exec` needs a command and may not contain shell metacharacters,
//!   because its arguments are split on whitespace and spawned directly
//! - arguments are capped at 1000 characters
//! - the accelerator must parse
//!
//! [`check_config`] runs all of it over a whole file and also reports
//! accelerators bound more than once.

use serde::Serialize;
use std::collections::HashMap;
use thiserror::Error;

use crate::config::parser::{parse_config, BindingSpec, ConfigFile};
use crate::core::keysym::{keysym_from_name, keysym_name};
use crate::core::{Accelerator, KeyCombination};

/// Longest accepted argument string
pub const MAX_ARGS_LEN: usize = 1000;

/// Actions a binding may run
pub const ALLOWED_ACTIONS: &[&str] = &["exec", "echo", "log"];

/// Validation errors
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ValidationError {
    /// Action name not in whitelist
    #[error("Invalid action '{0}': expected one of exec, echo, log")]
    InvalidAction(String),

    /// Accelerator does not parse
    #[error("Invalid key combination '{accelerator}': {reason}")]
    InvalidAccelerator { accelerator: String, reason: String },

    /// Dangerous shell metacharacters detected in arguments
    #[error("Dangerous shell metacharacters detected in arguments: '{0}'")]
    ShellMetacharacters(String),

    /// Argument exceeds maximum length
    #[error("Argument too long: {0} characters (max 1000)")]
    ArgumentTooLong(usize),

    /// `exec` without a command
    #[error("Action 'exec' needs a command")]
    MissingCommand,
}

/// Validates action name against whitelist
pub fn validate_action(name: &str) -> Result<(), ValidationError> {
    if ALLOWED_ACTIONS.contains(&name.to_lowercase().as_str()) {
        Ok(())
    } else {
        Err(ValidationError::InvalidAction(name.to_string()))
    }
}

/// Checks for shell metacharacters that enable command injection
///
/// Detects: ; | & $ ` ( ) { } [ ] < > \ " ' and newlines
pub fn check_shell_metacharacters(input: &str) -> Result<(), ValidationError> {
    const DANGEROUS_CHARS: &[char] = &[
        ';', '|', '&', '$', '`', '(', ')', '{', '}', '[', ']', '<', '>', '\\', '"', '\'', '\n',
        '\r',
    ];

    if input.contains(DANGEROUS_CHARS) {
        return Err(ValidationError::ShellMetacharacters(input.to_string()));
    }

    Ok(())
}

/// Validates one binding line
pub fn validate_binding(spec: &BindingSpec) -> Result<(), ValidationError> {
    validate_action(&spec.action)?;

    Accelerator::parse(&spec.accelerator).map_err(|err| ValidationError::InvalidAccelerator {
        accelerator: spec.accelerator.clone(),
        reason: err.to_string(),
    })?;

    if let Some(args) = &spec.args {
        if args.len() > MAX_ARGS_LEN {
            return Err(ValidationError::ArgumentTooLong(args.len()));
        }
    }

    if spec.action.eq_ignore_ascii_case("exec") {
        let command = spec.args.as_deref().ok_or(ValidationError::MissingCommand)?;
        check_shell_metacharacters(command)?;
    }

    Ok(())
}

/// Keyboard-independent identity of an accelerator
///
/// Orders modifiers canonically and folds letter case, so `<Alt><Ctrl>T`
/// and `<Control><Alt>t` agree. Aliases that only a live keymap can
/// resolve (`<Meta>` on the Alt key) are left apart.
pub fn offline_combination(accelerator: &Accelerator) -> KeyCombination {
    let folded = accelerator.key_name.to_lowercase();
    let key_name = match keysym_from_name(&folded) {
        Some(keysym) if folded.chars().count() == 1 => keysym_name(keysym).unwrap_or(folded),
        _ => keysym_name(accelerator.keysym).unwrap_or_else(|| accelerator.key_name.clone()),
    };

    KeyCombination::from_parts(&accelerator.modifiers, &key_name)
}

/// A problem with one line
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ValidationIssue {
    pub line: usize,
    pub message: String,
}

/// Lines that bind the same combination
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Conflict {
    pub combination: KeyCombination,

    /// Source lines, ascending (always 2 or more)
    pub lines: Vec<usize>,
}

/// Outcome of checking a whole file
#[derive(Clone, Debug, Default, Serialize)]
pub struct ValidationReport {
    pub config: ConfigFile,
    pub issues: Vec<ValidationIssue>,
    pub conflicts: Vec<Conflict>,
}

impl ValidationReport {
    pub fn has_errors(&self) -> bool {
        !self.issues.is_empty()
    }

    pub fn has_conflicts(&self) -> bool {
        !self.conflicts.is_empty()
    }

    pub fn is_clean(&self) -> bool {
        !self.has_errors() && !self.has_conflicts()
    }

    /// Bindings that passed validation, in file order.
    pub fn valid_bindings(&self) -> Vec<&BindingSpec> {
        self.config
            .bindings
            .iter()
            .filter(|spec| !self.issues.iter().any(|issue| issue.line == spec.line))
            .collect()
    }
}

/// Parses and validates `content`
///
/// A parse error becomes a single issue with an empty config. Otherwise
/// every line is validated independently and valid lines are indexed by
/// combination to find conflicts.
pub fn check_config(content: &str) -> ValidationReport {
    let config = match parse_config(content) {
        Ok(config) => config,
        Err(err) => {
            return ValidationReport {
                issues: vec![ValidationIssue {
                    line: err.line(),
                    message: err.to_string(),
                }],
                ..ValidationReport::default()
            };
        }
    };

    let mut report = ValidationReport::default();
    let mut by_combination: HashMap<KeyCombination, Vec<usize>> = HashMap::new();

    if let Some((line, accelerator)) = &config.keybinding {
        match Accelerator::parse(accelerator) {
            Ok(parsed) => by_combination
                .entry(offline_combination(&parsed))
                .or_default()
                .push(*line),
            Err(err) => report.issues.push(ValidationIssue {
                line: *line,
                message: format!("Invalid key combination '{}': {}", accelerator, err),
            }),
        }
    }

    for spec in &config.bindings {
        if let Err(err) = validate_binding(spec) {
            report.issues.push(ValidationIssue {
                line: spec.line,
                message: err.to_string(),
            });
            continue;
        }

        if let Ok(parsed) = Accelerator::parse(&spec.accelerator) {
            by_combination
                .entry(offline_combination(&parsed))
                .or_default()
                .push(spec.line);
        }
    }

    report.conflicts = by_combination
        .into_iter()
        .filter(|(_, lines)| lines.len() > 1)
        .map(|(combination, mut lines)| {
            lines.sort_unstable();
            Conflict { combination, lines }
        })
        .collect();
    report.conflicts.sort_by_key(|conflict| conflict.lines[0]);

    report.config = config;
    report
}
