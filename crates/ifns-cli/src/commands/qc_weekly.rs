//! QC weekly command
//!
//! Usage: ifns qc-weekly --manifest <FILE> --input-glob <GLOB> --week-end <YYYY-MM-DD> --out <FILE>

use super::CommandResult;
use clap::Args;
use ifns_core::config::QcWeeklyConfig;
use ifns_core::qc::run_qc_weekly;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct QcWeeklyArgs {
    /// Feature manifest JSON
    #[arg(long)]
    pub manifest: PathBuf,

    /// Market calendar JSON (closures and early closes)
    #[arg(long)]
    pub calendar: Option<PathBuf>,

    /// Glob of feature observation CSV files
    #[arg(long)]
    pub input_glob: String,

    /// Glob of clip-event logs (NDJSON or CSV)
    #[arg(long)]
    pub clip_glob: Option<String>,

    /// Last day of the week, YYYY-MM-DD
    #[arg(long)]
    pub week_end: String,

    /// JSONL file to append the record to
    #[arg(long)]
    pub out: PathBuf,
}

/// Execute qc-weekly command
pub fn execute(args: QcWeeklyArgs) -> CommandResult {
    let config = QcWeeklyConfig {
        week_end: QcWeeklyConfig::parse_week_end(&args.week_end)?,
        manifest: args.manifest,
        calendar: args.calendar,
        input_glob: args.input_glob,
        clip_glob: args.clip_glob,
        out: args.out,
    };
    config.validate()?;

    let record = run_qc_weekly(&config)?;
    tracing::debug!(
        row_count = record.row_count,
        integrity_pct = record.integrity_pct,
        "qc weekly record appended"
    );
    println!("Wrote QC weekly line to {}", config.out.display());
    Ok(0)
}
