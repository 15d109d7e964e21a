//! IFNS CLI
//!
//! Command-line interface for feature manifest governance and weekly QC

use clap::{Parser, Subcommand};
use ifns_core::logging_facility::{init, Profile};

mod commands;

#[derive(Debug, Parser)]
#[command(name = "ifns")]
#[command(about = "IFNS - Feature manifest diff, CI guard and weekly QC", long_about = None)]
struct Cli {
    /// Human-readable debug logs on stderr
    #[arg(long, global = true, conflicts_with = "log_json")]
    verbose: bool,

    /// JSON logs on stderr
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Structural diff of two feature manifests
    Diff(commands::diff::DiffArgs),
    /// Block disallowed manifest changes (exit 2 when blocked)
    Guard(commands::guard::GuardArgs),
    /// Append one weekly QC record
    QcWeekly(commands::qc_weekly::QcWeeklyArgs),
    /// Lint feature schema CSV files
    Lint(commands::lint::LintArgs),
}

fn main() {
    let cli = Cli::parse();

    if cli.verbose {
        init(Profile::Development);
    } else if cli.log_json {
        init(Profile::Production);
    }

    let result = match cli.command {
        Commands::Diff(args) => commands::diff::execute(args),
        Commands::Guard(args) => commands::guard::execute(args),
        Commands::QcWeekly(args) => commands::qc_weekly::execute(args),
        Commands::Lint(args) => commands::lint::execute(args),
    };

    match result {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
