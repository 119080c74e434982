use thiserror::Error;

use crate::core::RegistryError;

/// Errors returned synchronously by `bind` / `unbind` / `start`.
///
/// Handler failures are not in here: they happen later, on the dispatch
/// thread, and only ever reach the log.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum BindError {
    /// Malformed call shape or accelerator
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The handler position holds something that cannot be called
    #[error("Type mismatch: {0}")]
    TypeMismatch(String),

    /// The combination is already bound; the existing binding is untouched
    #[error("Key combination already bound: {0}")]
    DuplicateKey(String),

    /// The combination is not currently bound
    #[error("Key combination not bound: {0}")]
    NotFound(String),

    /// The windowing system refused the grab; nothing was registered
    #[error("Failed to grab {combination}: {reason}")]
    GrabFailed { combination: String, reason: String },

    /// The service is not in a state that allows this call
    #[error("Service lifecycle error: {0}")]
    Lifecycle(String),
}

impl From<RegistryError> for BindError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::DuplicateKey(combination) => BindError::DuplicateKey(combination.to_string()),
            RegistryError::NotFound(combination) => BindError::NotFound(combination.to_string()),
        }
    }
}
