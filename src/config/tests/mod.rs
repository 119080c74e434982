//! Config module tests
//!
//! Contains test suites for:
//! - Bindings file parsing and variable substitution
//! - Line validation and conflict reporting
//! - Applying files to a live service, including reload diffs
//! - File watching

#[cfg(test)]
mod parser_tests;
#[cfg(test)]
mod validator_tests;
