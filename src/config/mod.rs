//! Bindings file loading and live reload
//!
//! This module turns a bindings file into active hotkeys. Key features:
//!
//! - **Validation first**: only lines that pass `validator` are bound
//! - **Diff on reload**: unchanged bindings are never touched; removed
//!   ones are unbound before added ones are bound
//! - **Status hotkey**: the `keybinding = ...` line drives a [`Keybinder`]
//!
//! # Example
//!
//! ```no_run
//! use hotkey_binder::config::{load_config, ActiveConfig};
//! # fn demo(service: std::sync::Arc<hotkey_binder::service::HotkeyService>) -> Result<(), Box<dyn std::error::Error>> {
//! let path = hotkey_binder::config::default_config_path();
//! let report = load_config(&path)?;
//!
//! let mut active = ActiveConfig::new(service, None);
//! let outcome = active.apply(&report);
//! println!("{} bound, {} failed", outcome.bound.len(), outcome.failures.len());
//! # Ok(())
//! # }
//! ```

pub mod actions;
mod error;
pub mod parser;
pub mod validator;
pub mod watcher;

pub use actions::Action;
pub use error::ConfigError;
pub use parser::{parse_config, BindingSpec, ConfigFile, ParseError};
pub use validator::{check_config, ValidationError, ValidationReport};
pub use watcher::FileWatcher;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

use crate::core::Handler;
use crate::service::{HotkeyService, Keybinder};

/// Where the bindings file lives unless told otherwise
pub const DEFAULT_CONFIG_PATH: &str = "~/.config/hotkey-binder/bindings.conf";

/// Expands `~` and `$VARS` in a user-supplied path.
pub fn expand_path(path: &str) -> PathBuf {
    match shellexpand::full(path) {
        Ok(expanded) => PathBuf::from(expanded.as_ref()),
        Err(_) => PathBuf::from(shellexpand::tilde(path).as_ref()),
    }
}

pub fn default_config_path() -> PathBuf {
    expand_path(DEFAULT_CONFIG_PATH)
}

/// Reads and checks a bindings file.
pub fn load_config(path: &Path) -> Result<ValidationReport, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound(path.to_path_buf()));
    }

    let content = fs::read_to_string(path)?;
    Ok(check_config(&content))
}

/// Result of applying a configuration
#[derive(Debug, Default)]
pub struct ApplyOutcome {
    /// Accelerators newly bound
    pub bound: Vec<String>,

    /// Accelerators released because their line went away or changed
    pub unbound: Vec<String>,

    /// (line, accelerator, reason) for lines that could not be bound
    pub failures: Vec<(usize, String, String)>,
}

/// The bindings currently live on a service
pub struct ActiveConfig {
    service: Arc<HotkeyService>,
    bound: Vec<BindingSpec>,
    keybinder: Option<Keybinder>,
}

impl ActiveConfig {
    /// `status` is the handler for the `keybinding = ...` hotkey, if any.
    pub fn new(service: Arc<HotkeyService>, status: Option<Handler>) -> Self {
        let keybinder = status.map(|handler| Keybinder::new(Arc::clone(&service), handler));
        Self {
            service,
            bound: Vec::new(),
            keybinder,
        }
    }

    /// Lines currently bound, in file order of their last apply.
    pub fn bound(&self) -> &[BindingSpec] {
        &self.bound
    }

    pub fn keybinder(&self) -> Option<&Keybinder> {
        self.keybinder.as_ref()
    }

    /// Brings the service in line with `report`
    ///
    /// Lines that failed validation are skipped (and reported). Lines whose
    /// binding is unchanged since the last apply keep their grab.
    pub fn apply(&mut self, report: &ValidationReport) -> ApplyOutcome {
        let mut outcome = ApplyOutcome::default();
        for issue in &report.issues {
            outcome
                .failures
                .push((issue.line, String::new(), issue.message.clone()));
        }

        let wanted: Vec<&BindingSpec> = report.valid_bindings();

        // Release what is gone first, so a moved combination can be re-bound.
        let (kept, removed): (Vec<BindingSpec>, Vec<BindingSpec>) = std::mem::take(&mut self.bound)
            .into_iter()
            .partition(|old| wanted.iter().any(|new| new.same_binding(old)));

        for spec in removed {
            if let Err(err) = self.service.unbind(&spec.accelerator) {
                warn!(accelerator = %spec.accelerator, error = %err, "Failed to unbind removed hotkey");
            }
            outcome.unbound.push(spec.accelerator);
        }

        let mut next = Vec::with_capacity(wanted.len());
        for spec in wanted {
            if let Some(existing) = kept.iter().find(|old| old.same_binding(spec)) {
                if !next.iter().any(|b: &BindingSpec| b.same_binding(existing)) {
                    next.push(BindingSpec {
                        line: spec.line,
                        ..existing.clone()
                    });
                    continue;
                }
            }

            let handler = match Action::from_spec(spec) {
                Ok(action) => action.into_handler(),
                Err(err) => {
                    outcome
                        .failures
                        .push((spec.line, spec.accelerator.clone(), err.to_string()));
                    continue;
                }
            };

            match self.service.bind(&spec.accelerator, handler, Vec::new()) {
                Ok(combination) => {
                    info!(line = spec.line, combination = %combination, action = %spec.action, "Applied binding");
                    outcome.bound.push(spec.accelerator.clone());
                    next.push(spec.clone());
                }
                Err(err) => {
                    outcome
                        .failures
                        .push((spec.line, spec.accelerator.clone(), err.to_string()));
                }
            }
        }
        self.bound = next;

        self.apply_keybinding(report, &mut outcome);
        outcome
    }

    fn apply_keybinding(&mut self, report: &ValidationReport, outcome: &mut ApplyOutcome) {
        let Some(keybinder) = self.keybinder.as_mut() else {
            return;
        };

        match &report.config.keybinding {
            Some((line, accelerator)) => {
                if keybinder.is_bound() && keybinder.combination() == Some(accelerator.as_str()) {
                    return;
                }
                // Already reported as an issue
                if report.issues.iter().any(|issue| issue.line == *line) {
                    keybinder.unbind();
                    return;
                }
                match keybinder.set_combination(accelerator) {
                    Ok(_) => outcome.bound.push(accelerator.clone()),
                    Err(err) => outcome
                        .failures
                        .push((*line, accelerator.clone(), err.to_string())),
                }
            }
            None => {
                if let Some(previous) = keybinder.combination().map(str::to_string) {
                    if keybinder.is_bound() {
                        keybinder.unbind();
                        outcome.unbound.push(previous);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests;
