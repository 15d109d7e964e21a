//! Weekly QC metrics and the appended record.

use crate::errors::{IfnsError, Result};
use crate::manifest::FeatureManifest;
use crate::qc::calendar::{expected_rows_for_week, MarketCalendar};
use crate::qc::observations::{ClipEvent, FeatureFrame, Window};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

/// Round to six decimal places.
pub fn round6(x: f64) -> f64 {
    (x * 1_000_000.0).round() / 1_000_000.0
}

/// Non-NA and NA fractions of one column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColumnCoverage {
    pub coverage: f64,
    pub na: f64,
}

impl ColumnCoverage {
    const MISSING: ColumnCoverage = ColumnCoverage {
        coverage: 0.0,
        na: 1.0,
    };
}

/// Coverage of `column` over the frame. A column no file carried, or an
/// empty frame, is fully missing.
pub fn column_coverage(frame: &FeatureFrame, column: &str) -> ColumnCoverage {
    if !frame.has_column(column) || frame.rows.is_empty() {
        return ColumnCoverage::MISSING;
    }
    let coverage = frame.non_na_count(column) as f64 / frame.rows.len() as f64;
    ColumnCoverage {
        coverage,
        na: 1.0 - coverage,
    }
}

/// Per-family rollup inside a weekly record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FamilyBreakdown {
    pub family: String,
    pub feature_count: u64,
    pub coverage_pct_mean: f64,
    pub max_na_pct: f64,
    pub drift_alerts: u64,
    pub clip_events_pct: f64,
}

/// Clip-derived metrics for a week.
#[derive(Debug, Clone, PartialEq)]
pub struct ClipMetrics {
    pub clip_events_pct: f64,
    pub clip_budget_violations: u64,
    pub family_breakdown: Vec<FamilyBreakdown>,
}

#[derive(Default)]
struct FamilyAcc {
    feature_count: u64,
    coverage_sum: f64,
    na_max: f64,
    clip_events: u64,
    non_na: u64,
}

fn ratio(num: u64, den: u64) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

/// Compute clip rates, budget violations and the family rollup.
///
/// Only events naming a manifest column count. Budget violations are
/// counted per (feature, day) whose clip rate over that day's non-NA
/// observations exceeds the feature's budget; days with no observations are
/// skipped.
pub fn compute_clip_metrics(
    frame: &FeatureFrame,
    clips: &[ClipEvent],
    manifest: &FeatureManifest,
) -> ClipMetrics {
    let mut clip_totals: BTreeMap<&str, u64> = BTreeMap::new();
    let mut clip_daily: BTreeMap<&str, BTreeMap<NaiveDate, u64>> = BTreeMap::new();
    for column in &manifest.columns {
        clip_totals.insert(column.as_str(), 0);
    }
    for event in clips {
        if let Some(total) = clip_totals.get_mut(event.feature_id.as_str()) {
            *total += 1;
            *clip_daily
                .entry(event.feature_id.as_str())
                .or_default()
                .entry(event.date())
                .or_insert(0) += 1;
        }
    }

    let mut total_non_na = 0u64;
    let mut total_clips = 0u64;
    let mut families: Vec<(&str, FamilyAcc)> = Vec::new();
    for column in &manifest.columns {
        let non_na = if frame.has_column(column) {
            frame.non_na_count(column)
        } else {
            0
        };
        let clip_events = clip_totals.get(column.as_str()).copied().unwrap_or(0);
        total_non_na += non_na;
        total_clips += clip_events;

        let family = manifest.family_of(column);
        let idx = match families.iter().position(|(f, _)| *f == family) {
            Some(idx) => idx,
            None => {
                families.push((family, FamilyAcc::default()));
                families.len() - 1
            }
        };
        let cov = column_coverage(frame, column);
        let acc = &mut families[idx].1;
        acc.feature_count += 1;
        acc.coverage_sum += cov.coverage;
        acc.na_max = acc.na_max.max(cov.na);
        acc.clip_events += clip_events;
        acc.non_na += non_na;
    }

    let family_breakdown = families
        .into_iter()
        .map(|(family, acc)| FamilyBreakdown {
            family: family.to_string(),
            feature_count: acc.feature_count,
            coverage_pct_mean: acc.coverage_sum / acc.feature_count.max(1) as f64,
            max_na_pct: acc.na_max,
            drift_alerts: 0,
            clip_events_pct: ratio(acc.clip_events, acc.non_na),
        })
        .collect();

    let mut violations = 0u64;
    for (feature_id, per_day) in &clip_daily {
        let denominators = if frame.has_column(feature_id) {
            frame.non_na_by_day(feature_id)
        } else {
            BTreeMap::new()
        };
        let budget = manifest.clip_budget_for(feature_id);
        for (day, count) in per_day {
            let observed = denominators.get(day).copied().unwrap_or(0);
            if observed == 0 {
                continue;
            }
            if ratio(*count, observed) > budget {
                violations += 1;
            }
        }
    }

    ClipMetrics {
        clip_events_pct: ratio(total_clips, total_non_na),
        clip_budget_violations: violations,
        family_breakdown,
    }
}

/// One line of the weekly QC log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QcWeeklyRecord {
    pub ts_week_end: String,
    pub view: Value,
    pub horizon: Value,
    pub frequency: Value,
    pub manifest_sha256: Value,
    pub row_count: u64,
    pub integrity_pct: f64,
    pub coverage_pct_mean: f64,
    pub max_na_pct_any_feature: f64,
    pub drift_alerts_count: u64,
    pub clip_events_pct: f64,
    pub clip_budget_violations: u64,
    pub family_breakdown: Vec<FamilyBreakdown>,
    pub notes: String,
}

/// Assemble the weekly record from loaded inputs.
///
/// # Errors
///
/// `MissingManifestField` when the manifest has no `frequency`.
pub fn build_record(
    manifest: &FeatureManifest,
    calendar: &MarketCalendar,
    window: Window,
    frame: &FeatureFrame,
    clips: &[ClipEvent],
) -> Result<QcWeeklyRecord> {
    if manifest.frequency.is_absent() {
        return Err(IfnsError::MissingManifestField {
            field: "frequency".to_string(),
        });
    }
    let frequency = manifest.frequency.as_str().unwrap_or_default();
    let expected = expected_rows_for_week(window.start, window.end, frequency, calendar);
    let row_count = frame.row_count();
    let integrity = row_count as f64 / expected.max(1) as f64;

    let coverages: Vec<_> = manifest
        .columns
        .iter()
        .map(|c| column_coverage(frame, c))
        .collect();
    let coverage_pct_mean =
        coverages.iter().map(|c| c.coverage).sum::<f64>() / coverages.len().max(1) as f64;
    let max_na_pct_any_feature = coverages
        .iter()
        .map(|c| c.na)
        .reduce(f64::max)
        .unwrap_or(1.0);

    let clip = compute_clip_metrics(frame, clips, manifest);

    let manifest_sha256 = if manifest.columns_sha256.is_absent() {
        Value::String(String::new())
    } else {
        manifest.columns_sha256.to_json()
    };

    Ok(QcWeeklyRecord {
        ts_week_end: window.end.format("%Y-%m-%d").to_string(),
        view: manifest.view.to_json(),
        horizon: manifest.horizon.to_json(),
        frequency: manifest.frequency.to_json(),
        manifest_sha256,
        row_count,
        integrity_pct: round6(integrity),
        coverage_pct_mean: round6(coverage_pct_mean),
        max_na_pct_any_feature: round6(max_na_pct_any_feature),
        drift_alerts_count: 0,
        clip_events_pct: round6(clip.clip_events_pct),
        clip_budget_violations: clip.clip_budget_violations,
        family_breakdown: clip.family_breakdown,
        notes: String::new(),
    })
}

/// Append `record` as one JSON line, creating parent directories.
///
/// # Errors
///
/// - `Serialization`: the record could not be encoded
/// - `Io`: the file could not be opened or written
pub fn append_record(path: impl AsRef<Path>, record: &QcWeeklyRecord) -> Result<()> {
    let path = path.as_ref();
    let mut line = serde_json::to_string(record)?;
    line.push('\n');

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| IfnsError::io(parent, e))?;
    }
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| IfnsError::io(path, e))?;
    file.write_all(line.as_bytes())
        .map_err(|e| IfnsError::io(path, e))
}
