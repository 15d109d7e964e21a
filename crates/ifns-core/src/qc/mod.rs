//! Weekly QC aggregation.
//!
//! Rolls one week of feature observations and clip-event logs into a single
//! [`QcWeeklyRecord`] appended to a JSONL file.
//!
//! ## Window
//!
//! The week is the seven calendar days ending on `week_end`, both ends
//! inclusive. Observation rows and clip events outside it are ignored when
//! they carry a timestamp.
//!
//! ## Expected rows
//!
//! `1d` views expect one row per open day; `1h` views expect seven (three on
//! early-close days). Closed days expect none.

#![allow(clippy::result_large_err)]

pub mod calendar;
pub mod observations;
pub mod sources;
pub mod weekly;

pub use calendar::{expected_rows_for_week, load_calendar, MarketCalendar};
pub use observations::{
    load_clip_events, load_feature_frame, ClipEvent, FeatureFrame, ObservationRow, Window,
};
pub use sources::expand_glob;
pub use weekly::{
    append_record, build_record, column_coverage, compute_clip_metrics, FamilyBreakdown,
    QcWeeklyRecord,
};

use crate::config::QcWeeklyConfig;
use crate::errors::ExError;
use crate::manifest::load_manifest;
use crate::{log_op_end, log_op_error, log_op_start};
use std::time::Instant;

fn qc_weekly(config: &QcWeeklyConfig) -> Result<QcWeeklyRecord, ExError> {
    let manifest = load_manifest(&config.manifest)?;
    let calendar = load_calendar(config.calendar.as_deref())?;
    let window = Window::week_ending(config.week_end);

    let frame = load_feature_frame(&config.input_glob, &manifest.columns)?.within(window);
    let clips: Vec<ClipEvent> = match config.clip_glob.as_deref() {
        Some(glob) => load_clip_events(glob)?
            .into_iter()
            .filter(|e| window.contains(e.date()))
            .collect(),
        None => Vec::new(),
    };

    let record = build_record(&manifest, &calendar, window, &frame, &clips)?;
    append_record(&config.out, &record)?;
    Ok(record)
}

/// Run one weekly aggregation and append its record to `config.out`.
///
/// # Errors
///
/// - `NotFound`, `Io`, `InvalidManifest`, `DuplicateColumn` from the manifest
/// - `InvalidInput` for a malformed calendar
/// - `InvalidGlob` for a glob that does not compile
/// - `Serialization` for undecodable CSV input
/// - `MissingField` when the manifest has no `frequency`
/// - `Io`, `Serialization` from reading inputs or appending the record
pub fn run_qc_weekly(config: &QcWeeklyConfig) -> Result<QcWeeklyRecord, ExError> {
    let started = Instant::now();
    log_op_start!(
        "run_qc_weekly",
        manifest = %config.manifest.display(),
        week_end = %config.week_end
    );

    let result = qc_weekly(config);

    let duration_ms = started.elapsed().as_millis() as u64;
    match &result {
        Ok(record) => {
            log_op_end!(
                "run_qc_weekly",
                duration_ms = duration_ms,
                row_count = record.row_count,
                clip_budget_violations = record.clip_budget_violations
            );
        }
        Err(err) => {
            log_op_error!("run_qc_weekly", err.clone(), duration_ms = duration_ms);
        }
    }
    result
}
