//! Feature schema linter.
//!
//! Checks feature schema tables (one row per feature) for missing columns,
//! empty or duplicate ids, family labels that disagree with tags, and a few
//! scaling and dtype sanity rules.

use crate::errors::{IfnsError, Result};
use serde::Serialize;
use std::collections::HashSet;
use std::path::Path;

/// Tag → family, in match priority order.
const TAG_MAP: &[(&str, &str)] = &[
    ("momentum", "MOMENTUM"),
    ("trend", "TREND"),
    ("volatility", "VOLATILITY"),
    ("volume", "VOLUME"),
    ("mean_reversion", "MEAN_REVERSION"),
    ("mr", "MEAN_REVERSION"),
    ("breakout", "BREAKOUT"),
    ("composite", "COMPOSITE"),
    ("context", "CONTEXT"),
];

/// Columns every schema table must carry.
pub const REQUIRED_COLUMNS: [&str; 5] = ["feature_id", "level", "dtype", "horizon", "frequency"];

pub const REPORT_HEADER: [&str; 5] = ["severity", "file", "feature_id", "code", "message"];

/// Family implied by a tag string, or `""` when no tag is recognised.
///
/// Exact tag matches win over substring matches.
pub fn family_from_tags(tags: &str) -> &'static str {
    let parts: Vec<String> = tags
        .split(|c: char| c == '|' || c == ',' || c == ' ')
        .map(|t| t.trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .collect();
    if let Some((_, fam)) = TAG_MAP
        .iter()
        .find(|(tag, _)| parts.iter().any(|p| p.as_str() == *tag))
    {
        return *fam;
    }
    let joined = parts.join(" ");
    TAG_MAP
        .iter()
        .find(|(tag, _)| joined.contains(*tag))
        .map(|(_, fam)| *fam)
        .unwrap_or("")
}

/// Best-guess family from the naming conventions of feature ids.
pub fn infer_family_from_id(feature_id: &str) -> &'static str {
    let u = feature_id.to_uppercase();
    let has = |needle: &str| u.contains(needle);
    if u.starts_with("FEAT.CTX.") {
        "CONTEXT"
    } else if has("COMPOSITE") || has("MR_REGIME_AWARE") || has("BREAKOUT_CONFIRMATION") {
        "COMPOSITE"
    } else if has("BREAKOUT") || has("DONCH") {
        "BREAKOUT"
    } else if has("RSI") || has("STOCHK") || has("CCI") {
        "MEAN_REVERSION"
    } else if has("ATR") || has("REALVOL") || (has("VOL") && !has("VOLUME")) {
        "VOLATILITY"
    } else if has("VOLUME") {
        "VOLUME"
    } else if has("BOLL") || has("PL") || has("TREND") || has("STRUCT") {
        "TREND"
    } else if has("RET_") || has("MACD") || has("EMA") || has("SMA") || has("MOM") {
        "MOMENTUM"
    } else {
        "OTHER"
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Error,
    Warn,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Error => "ERROR",
            Severity::Warn => "WARN",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LintIssue {
    pub severity: Severity,
    pub file: String,
    pub feature_id: String,
    pub code: &'static str,
    pub message: String,
}

impl LintIssue {
    fn new(
        severity: Severity,
        file: &str,
        feature_id: &str,
        code: &'static str,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            file: file.to_string(),
            feature_id: feature_id.to_string(),
            code,
            message: message.into(),
        }
    }
}

struct Row<'a> {
    headers: &'a [String],
    cells: &'a [String],
}

impl<'a> Row<'a> {
    fn get(&self, column: &str) -> &'a str {
        self.headers
            .iter()
            .position(|h| h == column)
            .and_then(|i| self.cells.get(i))
            .map(String::as_str)
            .unwrap_or("")
    }
}

/// Lint one schema table. `name` labels the issues' `file` field.
pub fn lint_table(name: &str, headers: &[String], rows: &[Vec<String>]) -> Vec<LintIssue> {
    let mut issues = Vec::new();
    for required in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h == required) {
            issues.push(LintIssue::new(
                Severity::Error,
                name,
                "",
                "MISSING_COL",
                format!("Missing column {}", required),
            ));
        }
    }

    let mut seen: HashSet<&str> = HashSet::new();
    for cells in rows {
        let row = Row { headers, cells };
        let fid = row.get("feature_id").trim();
        if fid.is_empty() {
            issues.push(LintIssue::new(
                Severity::Error,
                name,
                "",
                "EMPTY_ID",
                "Empty feature_id",
            ));
            continue;
        }
        if !seen.insert(fid) {
            issues.push(LintIssue::new(
                Severity::Warn,
                name,
                fid,
                "DUPLICATE_ID",
                "Duplicate ID within file",
            ));
        }

        let family = row.get("family").trim();
        let tag_family = family_from_tags(row.get("tags"));
        if family.is_empty() && !tag_family.is_empty() {
            issues.push(LintIssue::new(
                Severity::Warn,
                name,
                fid,
                "FAMILY_EMPTY",
                format!("family empty, derived from tags -> {}", tag_family),
            ));
        }
        if !family.is_empty() && !tag_family.is_empty() && family != tag_family {
            issues.push(LintIssue::new(
                Severity::Warn,
                name,
                fid,
                "TAG_FAMILY_CONFLICT",
                format!("family={}, tags imply {}", family, tag_family),
            ));
        }

        let upper = fid.to_uppercase();
        let scaling = row.get("scaling").to_lowercase();
        if (upper.contains("RSI") || upper.contains("STOCHK"))
            && !matches!(scaling.as_str(), "minmax" | "")
        {
            issues.push(LintIssue::new(
                Severity::Warn,
                name,
                fid,
                "SCALING_EXPECT_MINMAX",
                format!("{} usually minmax-scaled; found {}", fid, scaling),
            ));
        }

        let ftype = row.get("type").to_lowercase();
        let dtype = row.get("dtype").to_lowercase();
        if matches!(ftype.as_str(), "numeric" | "") && matches!(dtype.as_str(), "string" | "object")
        {
            issues.push(LintIssue::new(
                Severity::Warn,
                name,
                fid,
                "DTYPE_SUSPECT",
                format!("numeric feature with dtype {}", dtype),
            ));
        }
    }
    issues
}

/// Lint a schema CSV file, labelling issues with the file stem.
///
/// # Errors
///
/// - `FileNotFound`, `Io`: the file could not be opened
/// - `Csv`: the file is not valid CSV
pub fn lint_csv_file(path: impl AsRef<Path>) -> Result<Vec<LintIssue>> {
    let path = path.as_ref();
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(|e| match e.into_kind() {
            csv::ErrorKind::Io(io) => IfnsError::io(path, io),
            other => IfnsError::Csv {
                message: format!("{}: {:?}", path.display(), other),
            },
        })?;

    let headers: Vec<String> = reader.headers()?.iter().map(|h| h.trim().to_string()).collect();
    let mut rows: Vec<Vec<String>> = Vec::new();
    for record in reader.records() {
        rows.push(record?.iter().map(str::to_string).collect());
    }

    let name = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string());
    let issues = lint_table(&name, &headers, &rows);
    tracing::debug!(file = %path.display(), rows = rows.len(), issues = issues.len(), "linted schema");
    Ok(issues)
}

/// Write issues as CSV, header included even when there are none.
///
/// # Errors
///
/// - `Io`: the file could not be created
/// - `Csv`: a record could not be written
pub fn write_lint_report(path: impl AsRef<Path>, issues: &[LintIssue]) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| IfnsError::io(parent, e))?;
    }
    let file = std::fs::File::create(path).map_err(|e| IfnsError::io(path, e))?;
    let mut writer = csv::Writer::from_writer(file);
    writer.write_record(REPORT_HEADER)?;
    for issue in issues {
        writer.write_record([
            issue.severity.as_str(),
            issue.file.as_str(),
            issue.feature_id.as_str(),
            issue.code,
            issue.message.as_str(),
        ])?;
    }
    writer.flush().map_err(|e| IfnsError::io(path, e))
}
