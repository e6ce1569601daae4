//! Searoute CLI library.
//!
//! Shared input loading and output formatting for the `searoute-cli` binary.

pub mod input;
pub mod output;
