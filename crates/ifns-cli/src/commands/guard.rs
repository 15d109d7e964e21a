//! Guard command
//!
//! Usage: ifns guard --baseline <FILE> --candidate <FILE> [--allow-*] [--out <FILE>]
//!
//! Exits 0 when the candidate passes, 2 when it is blocked.

use super::CommandResult;
use clap::Args;
use ifns_core::config::GuardConfig;
use ifns_core::guard::run_guard;
use ifns_core::policy::{ChangePolicy, Disposition};
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct GuardArgs {
    /// Known-good manifest (JSON)
    #[arg(long)]
    pub baseline: PathBuf,

    /// Proposed manifest (JSON)
    #[arg(long)]
    pub candidate: PathBuf,

    #[arg(long)]
    pub allow_added: bool,

    #[arg(long)]
    pub allow_removed: bool,

    #[arg(long)]
    pub allow_reordered: bool,

    /// Allow QC edits other than family changes
    #[arg(long)]
    pub allow_modified: bool,

    #[arg(long)]
    pub allow_family_changes: bool,

    /// Optional JSON report path
    #[arg(long)]
    pub out: Option<PathBuf>,
}

impl GuardArgs {
    fn into_config(self) -> GuardConfig {
        GuardConfig {
            baseline: self.baseline,
            candidate: self.candidate,
            policy: ChangePolicy {
                allow_added: self.allow_added,
                allow_removed: self.allow_removed,
                allow_reordered: self.allow_reordered,
                allow_modified: self.allow_modified,
                allow_family_changes: self.allow_family_changes,
            },
            report_path: self.out,
        }
    }
}

/// Execute guard command
pub fn execute(args: GuardArgs) -> CommandResult {
    let config = args.into_config();
    config.validate()?;

    let verdict = run_guard(&config)?;
    let disposition = verdict.disposition();

    println!("{}", disposition.status_line());
    if disposition == Disposition::Blocked {
        for violation in &verdict.violations {
            println!(" - {}", violation);
        }
        println!("(Pass flags to allow specific classes of change)");
    }

    Ok(disposition.exit_code())
}
