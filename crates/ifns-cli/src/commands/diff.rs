//! Diff command
//!
//! Usage: ifns diff --a <BASELINE> --b <CANDIDATE> [--out <FILE>] [--summary]

use super::CommandResult;
use clap::Args;
use ifns_core::diff::{compute_diff, render_human_summary};
use ifns_core::manifest::load_manifest;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct DiffArgs {
    /// Baseline manifest JSON
    #[arg(long)]
    pub a: PathBuf,

    /// Candidate manifest JSON
    #[arg(long)]
    pub b: PathBuf,

    /// Write the JSON diff here instead of stdout
    #[arg(long)]
    pub out: Option<PathBuf>,

    /// Print a Markdown review summary to stdout
    #[arg(long)]
    pub summary: bool,
}

/// Execute diff command
pub fn execute(args: DiffArgs) -> CommandResult {
    let a = load_manifest(&args.a)?;
    let b = load_manifest(&args.b)?;
    let diff = compute_diff(&a, &b);
    let json = serde_json::to_string_pretty(&diff)?;

    match &args.out {
        Some(path) => {
            std::fs::write(path, json)?;
            if !args.summary {
                println!("✓ Diff written to {}", path.display());
            }
        }
        None if !args.summary => println!("{}", json),
        None => {}
    }

    if args.summary {
        print!("{}", render_human_summary(&diff));
    }

    Ok(0)
}
