use std::path::PathBuf;
use thiserror::Error;

use crate::config::parser::ParseError;

/// Errors that can occur while loading or watching a bindings file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Bindings file does not exist.
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),
    /// Bindings file could not be parsed.
    #[error(transparent)]
    Parse(#[from] ParseError),
    /// File watcher could not be set up.
    #[error("Failed to watch config: {0}")]
    Watch(#[from] notify::Error),
    /// Generic I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
