//! Core module tests
//!
//! Contains test suites for core functionality:
//! - Accelerator parsing tests
//! - Keymap resolution and canonicalisation tests
//! - Binding registry tests
//! - Type tests (KeyCombination, Accelerator, etc.)

#[cfg(test)]
mod parser_tests;
#[cfg(test)]
mod registry_tests;
