//! Tooling & Integration Layer
//!
//! Command-line entry points and text rendering on top of the store and
//! deletion APIs.

pub mod cli;
pub mod format;

pub use cli::{Cli, CliContext, Commands};
