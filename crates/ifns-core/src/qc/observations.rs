//! Feature observation and clip-event loaders.

use crate::errors::{IfnsError, Result};
use crate::qc::sources::{expand_glob, extension_of};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use csv::StringRecord;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

/// Column holding the observation time.
pub const TIMESTAMP_COLUMN: &str = "timestamp";
/// Column holding the clipped feature in clip-event logs.
pub const FEATURE_ID_COLUMN: &str = "feature_id";

/// Cell values read as missing, matching the pandas CSV defaults.
const NA_TOKENS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

pub fn is_na(cell: &str) -> bool {
    NA_TOKENS.contains(&cell.trim())
}

/// Parse an observation timestamp.
///
/// Accepts RFC 3339, `YYYY-MM-DD HH:MM[:SS[.fff]]` with either separator and
/// an optional `±HH:MM` offset, and bare dates. Offsets are dropped, keeping
/// the wall-clock time.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_local());
    }
    const OFFSET_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f%:z", "%Y-%m-%dT%H:%M:%S%.f%:z"];
    for fmt in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
            return Some(dt.naive_local());
        }
    }
    const NAIVE_FORMATS: [&str; 4] = [
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M",
    ];
    for fmt in NAIVE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Inclusive range of calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl Window {
    /// The seven days ending on `end`.
    pub fn week_ending(end: NaiveDate) -> Self {
        Self {
            start: end - chrono::Duration::days(6),
            end,
        }
    }

    pub fn contains(&self, day: NaiveDate) -> bool {
        self.start <= day && day <= self.end
    }
}

/// One observation row: its time, if the source had a timestamp column, and
/// which manifest columns hold a value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObservationRow {
    pub timestamp: Option<NaiveDateTime>,
    /// Column → non-NA. Columns the source file lacked are not present.
    pub present: BTreeMap<String, bool>,
}

impl ObservationRow {
    pub fn date(&self) -> Option<NaiveDate> {
        self.timestamp.map(|t| t.date())
    }

    pub fn has_value(&self, column: &str) -> bool {
        self.present.get(column).copied().unwrap_or(false)
    }
}

/// All observation rows matched by a glob, restricted to manifest columns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureFrame {
    /// Manifest columns found in at least one file header
    pub columns_seen: BTreeSet<String>,
    /// Whether any file had a timestamp column
    pub has_timestamp: bool,
    pub rows: Vec<ObservationRow>,
}

impl FeatureFrame {
    pub fn row_count(&self) -> u64 {
        self.rows.len() as u64
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns_seen.contains(column)
    }

    /// Number of rows holding a value for `column`.
    pub fn non_na_count(&self, column: &str) -> u64 {
        self.rows.iter().filter(|r| r.has_value(column)).count() as u64
    }

    /// Non-NA counts for `column`, grouped by observation date.
    pub fn non_na_by_day(&self, column: &str) -> BTreeMap<NaiveDate, u64> {
        let mut counts = BTreeMap::new();
        for row in &self.rows {
            if let Some(day) = row.date() {
                let slot = counts.entry(day).or_insert(0);
                if row.has_value(column) {
                    *slot += 1;
                }
            }
        }
        counts
    }

    /// Keep only rows dated inside `window`. Without a timestamp column
    /// every row is kept; with one, rows lacking a parseable time are dropped.
    pub fn within(mut self, window: Window) -> Self {
        if self.has_timestamp {
            self.rows
                .retain(|r| r.date().is_some_and(|d| window.contains(d)));
        }
        self
    }
}

fn open_csv(path: &Path) -> Result<csv::Reader<std::fs::File>> {
    csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(|e| match e.into_kind() {
            csv::ErrorKind::Io(io) => IfnsError::io(path, io),
            other => IfnsError::Csv {
                message: format!("{}: {:?}", path.display(), other),
            },
        })
}

fn csv_error(path: &Path, err: csv::Error) -> IfnsError {
    IfnsError::Csv {
        message: format!("{}: {}", path.display(), err),
    }
}

fn header_index(headers: &StringRecord, name: &str) -> Option<usize> {
    headers.iter().position(|h| h.trim() == name)
}

fn read_feature_csv(path: &Path, columns: &[String], frame: &mut FeatureFrame) -> Result<()> {
    let mut reader = open_csv(path)?;
    let headers = reader.headers().map_err(|e| csv_error(path, e))?.clone();

    let ts_idx = header_index(&headers, TIMESTAMP_COLUMN);
    let kept: Vec<(&String, usize)> = columns
        .iter()
        .filter_map(|c| header_index(&headers, c).map(|i| (c, i)))
        .collect();

    frame.has_timestamp |= ts_idx.is_some();
    frame
        .columns_seen
        .extend(kept.iter().map(|(c, _)| (*c).clone()));

    for record in reader.records() {
        let record = record.map_err(|e| csv_error(path, e))?;
        let timestamp = ts_idx
            .and_then(|i| record.get(i))
            .and_then(parse_timestamp);
        let present = kept
            .iter()
            .map(|(c, i)| ((*c).clone(), record.get(*i).is_some_and(|v| !is_na(v))))
            .collect();
        frame.rows.push(ObservationRow { timestamp, present });
    }
    Ok(())
}

/// Read every CSV matched by `glob`, keeping `columns` and the timestamp.
///
/// Files are read in sorted path order. Non-CSV matches are skipped.
///
/// # Errors
///
/// - `InvalidGlob`: the pattern does not compile
/// - `FileNotFound`, `Io`, `Csv`: a matched file could not be read
pub fn load_feature_frame(glob: &str, columns: &[String]) -> Result<FeatureFrame> {
    let mut frame = FeatureFrame::default();
    for path in expand_glob(glob)? {
        match extension_of(&path).as_deref() {
            Some("csv") => read_feature_csv(&path, columns, &mut frame)?,
            Some("parquet") => {
                tracing::warn!(path = %path.display(), "parquet input is not supported, skipping");
            }
            _ => {
                tracing::debug!(path = %path.display(), "skipping non-CSV input");
            }
        }
    }
    tracing::debug!(
        rows = frame.rows.len(),
        columns_seen = frame.columns_seen.len(),
        has_timestamp = frame.has_timestamp,
        "loaded feature frame"
    );
    Ok(frame)
}

/// A single clip event.
#[derive(Debug, Clone, PartialEq)]
pub struct ClipEvent {
    pub timestamp: NaiveDateTime,
    /// Clipped feature; empty when the log line did not name one
    pub feature_id: String,
}

impl ClipEvent {
    pub fn date(&self) -> NaiveDate {
        self.timestamp.date()
    }
}

fn clip_from_json(obj: &Value) -> Option<ClipEvent> {
    let timestamp = obj.get(TIMESTAMP_COLUMN)?.as_str().and_then(parse_timestamp)?;
    let feature_id = obj
        .get(FEATURE_ID_COLUMN)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    Some(ClipEvent {
        timestamp,
        feature_id,
    })
}

fn read_clip_lines(path: &Path, events: &mut Vec<ClipEvent>) -> Result<()> {
    let text = std::fs::read_to_string(path).map_err(|e| IfnsError::io(path, e))?;
    for (lineno, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<Value>(line) {
            Ok(obj) => events.extend(clip_from_json(&obj)),
            Err(err) => {
                tracing::debug!(
                    path = %path.display(),
                    line = lineno + 1,
                    error = %err,
                    "skipping malformed clip-event line"
                );
            }
        }
    }
    Ok(())
}

fn read_clip_csv(path: &Path, events: &mut Vec<ClipEvent>) -> Result<()> {
    let mut reader = open_csv(path)?;
    let headers = reader.headers().map_err(|e| csv_error(path, e))?.clone();
    let Some(ts_idx) = header_index(&headers, TIMESTAMP_COLUMN) else {
        tracing::warn!(path = %path.display(), "clip-event CSV has no timestamp column");
        return Ok(());
    };
    let fid_idx = header_index(&headers, FEATURE_ID_COLUMN);

    for record in reader.records() {
        let record = record.map_err(|e| csv_error(path, e))?;
        let Some(timestamp) = record.get(ts_idx).and_then(parse_timestamp) else {
            continue;
        };
        let feature_id = fid_idx
            .and_then(|i| record.get(i))
            .filter(|v| !is_na(v))
            .unwrap_or_default()
            .to_string();
        events.push(ClipEvent {
            timestamp,
            feature_id,
        });
    }
    Ok(())
}

/// Read every clip-event log matched by `glob`.
///
/// `.ndjson`/`.jsonl` files hold one JSON object per line; malformed lines
/// are skipped. `.csv` files need a `timestamp` column. Events without a
/// parseable timestamp are dropped.
///
/// # Errors
///
/// - `InvalidGlob`: the pattern does not compile
/// - `FileNotFound`, `Io`, `Csv`: a matched file could not be read
pub fn load_clip_events(glob: &str) -> Result<Vec<ClipEvent>> {
    let mut events = Vec::new();
    for path in expand_glob(glob)? {
        match extension_of(&path).as_deref() {
            Some("ndjson") | Some("jsonl") => read_clip_lines(&path, &mut events)?,
            Some("csv") => read_clip_csv(&path, &mut events)?,
            _ => {}
        }
    }
    Ok(events)
}
