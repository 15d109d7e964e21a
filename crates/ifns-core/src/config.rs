//! Run configuration for the command entry points.
//!
//! Each entry point takes one of these structs. They are built once at
//! process start (from CLI arguments) and validated once, before any work.

use crate::errors::{IfnsError, Result};
use crate::policy::ChangePolicy;
use chrono::NaiveDate;
use std::path::PathBuf;

/// Configuration for a CI guard run.
#[derive(Debug, Clone, PartialEq)]
pub struct GuardConfig {
    /// Known-good manifest
    pub baseline: PathBuf,
    /// Proposed manifest
    pub candidate: PathBuf,
    pub policy: ChangePolicy,
    /// Where to write the `{diff, violations}` report, if anywhere
    pub report_path: Option<PathBuf>,
}

impl GuardConfig {
    /// # Errors
    ///
    /// `InvalidConfig` when either manifest path does not point to a file.
    pub fn validate(&self) -> Result<()> {
        require_file("baseline", &self.baseline)?;
        require_file("candidate", &self.candidate)
    }
}

/// Configuration for one QC weekly aggregation run.
#[derive(Debug, Clone, PartialEq)]
pub struct QcWeeklyConfig {
    pub manifest: PathBuf,
    /// Market calendar JSON; a missing file means "no closures"
    pub calendar: Option<PathBuf>,
    /// Glob of feature observation files
    pub input_glob: String,
    /// Glob of clip-event logs
    pub clip_glob: Option<String>,
    /// Last day (inclusive) of the seven-day window
    pub week_end: NaiveDate,
    /// JSONL file the record is appended to
    pub out: PathBuf,
}

impl QcWeeklyConfig {
    /// Parse a `YYYY-MM-DD` week-end date.
    ///
    /// # Errors
    ///
    /// `InvalidDate` for anything else.
    pub fn parse_week_end(value: &str) -> Result<NaiveDate> {
        NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| IfnsError::InvalidDate {
            value: value.to_string(),
        })
    }

    /// # Errors
    ///
    /// `InvalidConfig` when the manifest is missing or a glob is empty.
    pub fn validate(&self) -> Result<()> {
        require_file("manifest", &self.manifest)?;
        if self.input_glob.trim().is_empty() {
            return Err(IfnsError::InvalidConfig {
                reason: "input glob must not be empty".to_string(),
            });
        }
        if self
            .clip_glob
            .as_deref()
            .is_some_and(|g| g.trim().is_empty())
        {
            return Err(IfnsError::InvalidConfig {
                reason: "clip glob must not be empty when given".to_string(),
            });
        }
        Ok(())
    }

    /// First day (inclusive) of the window: six days before `week_end`.
    pub fn week_start(&self) -> NaiveDate {
        self.week_end - chrono::Duration::days(6)
    }
}

fn require_file(label: &str, path: &std::path::Path) -> Result<()> {
    if path.is_file() {
        Ok(())
    } else {
        Err(IfnsError::InvalidConfig {
            reason: format!("{} file not found: {}", label, path.display()),
        })
    }
}
