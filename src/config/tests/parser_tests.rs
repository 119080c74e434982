//! Bindings file parser tests

use std::collections::HashMap;

use crate::config::parser::{
    parse_bind_line, parse_config, substitute_variables, BindingSpec, ParseError,
};

#[test]
fn test_parse_simple_bind() {
    let (_, (accel, action, args)) = parse_bind_line("bind = <Super>Return, exec, xterm").unwrap();

    assert_eq!(accel, "<Super>Return");
    assert_eq!(action, "exec");
    assert_eq!(args.as_deref(), Some("xterm"));
}

#[test]
fn test_parse_bind_without_args() {
    let (_, (accel, action, args)) = parse_bind_line("bind=<Control>F1,log").unwrap();

    assert_eq!(accel, "<Control>F1");
    assert_eq!(action, "log");
    assert_eq!(args, None);
}

#[test]
fn test_args_keep_inner_commas() {
    let (_, (_, _, args)) = parse_bind_line("bind = <Alt>e, echo, one, two, three").unwrap();
    assert_eq!(args.as_deref(), Some("one, two, three"));
}

#[test]
fn test_parse_config_skips_comments_and_blanks() {
    let content = "# hotkeys\n\nbind = <Super>Return, exec, xterm\n   # indented comment\nbind = <Control><Alt>l, log, locked\n";
    let config = parse_config(content).unwrap();

    assert_eq!(config.keybinding, None);
    assert_eq!(
        config.bindings,
        vec![
            BindingSpec {
                line: 3,
                accelerator: "<Super>Return".to_string(),
                action: "exec".to_string(),
                args: Some("xterm".to_string()),
            },
            BindingSpec {
                line: 5,
                accelerator: "<Control><Alt>l".to_string(),
                action: "log".to_string(),
                args: Some("locked".to_string()),
            },
        ]
    );
}

#[test]
fn test_variables_are_substituted() {
    let content = "\
$mod = <Super>
$term = xterm -e htop
bind = $mod<Shift>Return, exec, $term
";
    let config = parse_config(content).unwrap();

    assert_eq!(config.bindings[0].accelerator, "<Super><Shift>Return");
    assert_eq!(config.bindings[0].args.as_deref(), Some("xterm -e htop"));
}

#[test]
fn test_undefined_variable_reports_line() {
    let content = "bind = <Super>t, exec, xterm\nbind = $nope t, log\n";

    assert_eq!(
        parse_config(content),
        Err(ParseError::UndefinedVariable {
            variable: "nope".to_string(),
            line: 2
        })
    );
}

#[test]
fn test_variable_must_be_defined_before_use() {
    let content = "bind = $mod t, log\n$mod = <Super>\n";
    assert!(matches!(
        parse_config(content),
        Err(ParseError::UndefinedVariable { line: 1, .. })
    ));
}

#[test]
fn test_keybinding_line() {
    let content = "keybinding = <Control><Alt>h\nbind = <Super>t, log\n";
    let config = parse_config(content).unwrap();

    assert_eq!(config.keybinding, Some((1, "<Control><Alt>h".to_string())));
    assert_eq!(config.bindings.len(), 1);
}

#[test]
fn test_second_keybinding_rejected() {
    let content = "keybinding = <Super>h\nkeybinding = <Super>j\n";
    assert_eq!(
        parse_config(content),
        Err(ParseError::DuplicateKeybinding { line: 2, first: 1 })
    );
}

#[test]
fn test_garbage_line_is_syntax_error() {
    let content = "bind = <Super>t, log\nthis is not a binding\n";

    let err = parse_config(content).unwrap_err();
    assert_eq!(err.line(), 2);
    assert!(matches!(err, ParseError::InvalidSyntax { .. }));
}

#[test]
fn test_bind_missing_action_is_syntax_error() {
    assert!(parse_config("bind = <Super>t\n").is_err());
    assert!(parse_config("bind = , exec, xterm\n").is_err());
}

#[test]
fn test_substitute_variables_direct() {
    let mut vars = HashMap::new();
    vars.insert("a".to_string(), "1".to_string());
    vars.insert("ab".to_string(), "2".to_string());

    // Longest identifier wins: `$ab` is not `$a` followed by `b`
    assert_eq!(substitute_variables("$a $ab", &vars, 1).unwrap(), "1 2");
}
