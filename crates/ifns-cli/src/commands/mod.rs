//! Subcommand implementations
//!
//! Each `execute` returns the process exit code on success.

pub mod diff;
pub mod guard;
pub mod lint;
pub mod qc_weekly;

/// Boxed error returned by every subcommand.
pub type CommandResult = Result<i32, Box<dyn std::error::Error>>;
