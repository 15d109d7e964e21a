//! CI guard entry point: load → diff → evaluate → report.

#![allow(clippy::result_large_err)]

use crate::config::GuardConfig;
use crate::diff::compute_diff;
use crate::errors::ExError;
use crate::manifest::load_manifest;
use crate::policy::{evaluate, write_report, Verdict};
use crate::{log_op_end, log_op_error, log_op_start};
use std::time::Instant;

fn guard(config: &GuardConfig) -> Result<Verdict, ExError> {
    let baseline = load_manifest(&config.baseline)?;
    let candidate = load_manifest(&config.candidate)?;
    let verdict = evaluate(compute_diff(&baseline, &candidate), &config.policy);
    if let Some(path) = &config.report_path {
        write_report(&verdict, path)?;
    }
    Ok(verdict)
}

/// Run the manifest change guard.
///
/// Loading failures abort before evaluation. A blocked verdict is an `Ok`
/// value; the caller maps it to an exit code.
///
/// # Errors
///
/// - `NotFound`, `Io`, `InvalidManifest`, `DuplicateColumn` from loading
/// - `Io`, `Serialization` from writing the report
pub fn run_guard(config: &GuardConfig) -> Result<Verdict, ExError> {
    let started = Instant::now();
    log_op_start!(
        "run_guard",
        baseline = %config.baseline.display(),
        candidate = %config.candidate.display()
    );

    let result = guard(config);

    let duration_ms = started.elapsed().as_millis() as u64;
    match &result {
        Ok(verdict) => {
            log_op_end!(
                "run_guard",
                duration_ms = duration_ms,
                passed = verdict.passed()
            );
        }
        Err(err) => {
            log_op_error!("run_guard", err.clone(), duration_ms = duration_ms);
        }
    }
    result
}
