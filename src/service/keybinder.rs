//! Single configurable hotkey
//!
//! Wraps one binding whose combination comes from user configuration and
//! may change at runtime. Changing it releases the old combination first,
//! so at most one combination is bound through a `Keybinder` at a time.

use std::sync::Arc;
use tracing::{debug, info};

use crate::core::{Handler, KeyCombination};
use crate::service::{BindError, HotkeyService};

pub struct Keybinder {
    service: Arc<HotkeyService>,
    handler: Handler,
    combination: Option<String>,
    bound: bool,
}

impl Keybinder {
    /// Creates an unbound keybinder that will call `handler` when triggered.
    pub fn new(service: Arc<HotkeyService>, handler: Handler) -> Self {
        Self {
            service,
            handler,
            combination: None,
            bound: false,
        }
    }

    /// Switches to `combination`
    ///
    /// The previous combination is unbound first (a `NotFound` there is
    /// ignored). If the new bind fails the keybinder is left unbound, keeps
    /// the requested combination, and the error is returned.
    pub fn set_combination(&mut self, combination: &str) -> Result<KeyCombination, BindError> {
        self.unbind();
        self.combination = Some(combination.to_string());

        info!(combination, "Binding configured hotkey");
        match self.service.bind(combination, self.handler.clone(), Vec::new()) {
            Ok(bound) => {
                self.bound = true;
                Ok(bound)
            }
            Err(err) => {
                self.bound = false;
                Err(err)
            }
        }
    }

    /// Releases the current combination, if bound.
    pub fn unbind(&mut self) {
        if !self.bound {
            return;
        }
        self.bound = false;

        if let Some(previous) = self.combination.as_deref() {
            match self.service.unbind(previous) {
                Ok(()) | Err(BindError::NotFound(_)) => {}
                Err(err) => debug!(combination = previous, error = %err, "Ignoring unbind failure"),
            }
        }
    }

    /// Combination last requested, bound or not.
    pub fn combination(&self) -> Option<&str> {
        self.combination.as_deref()
    }

    pub fn is_bound(&self) -> bool {
        self.bound
    }
}
