//! Lint command
//!
//! Usage: ifns lint <SCHEMA_CSV>... --out <FILE>

use super::CommandResult;
use clap::Args;
use ifns_core::errors::ExError;
use ifns_core::lint::{lint_csv_file, write_lint_report};
use ifns_core::{log_op_end, log_op_error, log_op_start};
use std::path::PathBuf;
use std::time::Instant;

#[derive(Debug, Args)]
pub struct LintArgs {
    /// Feature schema CSV files
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// CSV report path
    #[arg(long)]
    pub out: PathBuf,
}

fn lint_all(args: &LintArgs) -> Result<usize, ExError> {
    let mut issues = Vec::new();
    for file in &args.files {
        issues.extend(lint_csv_file(file)?);
    }
    write_lint_report(&args.out, &issues)?;
    Ok(issues.len())
}

/// Execute lint command
pub fn execute(args: LintArgs) -> CommandResult {
    let started = Instant::now();
    log_op_start!("lint", files_len = args.files.len());

    match lint_all(&args) {
        Ok(count) => {
            log_op_end!(
                "lint",
                duration_ms = started.elapsed().as_millis() as u64,
                issues_len = count
            );
            println!("Wrote {} lints → {}", count, args.out.display());
            Ok(0)
        }
        Err(err) => {
            log_op_error!(
                "lint",
                err.clone(),
                duration_ms = started.elapsed().as_millis() as u64
            );
            Err(err.into())
        }
    }
}
