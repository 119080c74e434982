//! Handlers behind the `exec`, `echo` and `log` actions

use std::process::{Command, Stdio};
use std::thread;
use tracing::{debug, info, warn};

use crate::config::parser::BindingSpec;
use crate::config::validator::{validate_binding, ValidationError};
use crate::core::{Handler, HandlerError, Value};

/// What a binding does when triggered
#[derive(Clone, Debug, PartialEq)]
pub enum Action {
    /// Spawn `argv[0]` with the rest as arguments, no shell
    Exec(Vec<String>),

    /// Print the text to stdout
    Echo(String),

    /// Emit an `info` event with the text
    Log(String),
}

impl Action {
    /// Builds the action for a binding line, validating it first.
    pub fn from_spec(spec: &BindingSpec) -> Result<Self, ValidationError> {
        validate_binding(spec)?;
        let args = spec.args.clone().unwrap_or_default();

        match spec.action.to_lowercase().as_str() {
            "exec" => Ok(Action::Exec(
                args.split_whitespace().map(str::to_string).collect(),
            )),
            "echo" => Ok(Action::Echo(args)),
            "log" => Ok(Action::Log(args)),
            other => Err(ValidationError::InvalidAction(other.to_string())),
        }
    }

    /// Wraps the action in a hotkey handler.
    pub fn into_handler(self) -> Handler {
        Handler::new(move |args| self.run(args))
    }

    fn run(&self, args: &[Value]) -> Result<(), HandlerError> {
        let combination = args.first().and_then(Value::as_str).unwrap_or_default();

        match self {
            Action::Exec(argv) => spawn_detached(argv),
            Action::Echo(text) => {
                println!("{}", text);
                Ok(())
            }
            Action::Log(text) => {
                info!(combination, message = %text, "Hotkey triggered");
                Ok(())
            }
        }
    }
}

fn spawn_detached(argv: &[String]) -> Result<(), HandlerError> {
    let Some((program, rest)) = argv.split_first() else {
        return Err(HandlerError::failed("empty command"));
    };

    let mut child = Command::new(program)
        .args(rest)
        .stdin(Stdio::null())
        .spawn()
        .map_err(|err| HandlerError::failed(format!("failed to spawn '{}': {}", program, err)))?;

    debug!(program = %program, pid = child.id(), "Spawned command");

    // Reap off the dispatch thread so a long-running child never blocks it.
    let program = program.clone();
    thread::spawn(move || match child.wait() {
        Ok(status) if !status.success() => warn!(program = %program, %status, "Command exited with failure"),
        Ok(_) => {}
        Err(err) => warn!(program = %program, error = %err, "Failed to wait for command"),
    });

    Ok(())
}
