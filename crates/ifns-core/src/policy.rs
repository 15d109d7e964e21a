//! Manifest change policy and verdicts
//!
//! A [`ChangePolicy`] lists which classes of manifest change are allowed.
//! Everything is denied by default: any detected change category blocks
//! unless its flag is set.

#![allow(clippy::result_large_err)]

use crate::diff::model::{ManifestDiff, ModifiedEntry};
use crate::errors::{ExError, ExErrorKind};
use crate::{log_op_end, log_op_start};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Instant;

/// Exit code for a passing guard run.
pub const EXIT_PASS: i32 = 0;
/// Exit code for a blocked guard run.
pub const EXIT_BLOCKED: i32 = 2;

/// Allow-flags for each change category. All default to `false`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangePolicy {
    pub allow_added: bool,
    pub allow_removed: bool,
    pub allow_reordered: bool,
    /// QC field edits other than `family`
    pub allow_modified: bool,
    pub allow_family_changes: bool,
}

impl ChangePolicy {
    /// Deny every category (same as `Default`).
    pub fn deny_all() -> Self {
        Self::default()
    }

    /// Allow every category.
    pub fn allow_all() -> Self {
        Self {
            allow_added: true,
            allow_removed: true,
            allow_reordered: true,
            allow_modified: true,
            allow_family_changes: true,
        }
    }
}

/// Outcome of a guard evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Pass,
    Blocked,
}

impl Disposition {
    /// Process exit code for this outcome
    pub fn exit_code(&self) -> i32 {
        match self {
            Disposition::Pass => EXIT_PASS,
            Disposition::Blocked => EXIT_BLOCKED,
        }
    }

    /// Terminal status line printed by the CLI
    pub fn status_line(&self) -> &'static str {
        match self {
            Disposition::Pass => "CI GUARD — OK",
            Disposition::Blocked => "CI GUARD — BLOCKED",
        }
    }
}

/// The diff that was judged plus every violation found.
#[derive(Debug, Clone, PartialEq)]
pub struct Verdict {
    pub diff: ManifestDiff,
    pub violations: Vec<String>,
}

impl Verdict {
    pub fn disposition(&self) -> Disposition {
        if self.violations.is_empty() {
            Disposition::Pass
        } else {
            Disposition::Blocked
        }
    }

    pub fn passed(&self) -> bool {
        self.disposition() == Disposition::Pass
    }

    /// Borrowed report view for serialization.
    pub fn report(&self) -> GuardReport<'_> {
        GuardReport {
            diff: &self.diff,
            violations: &self.violations,
        }
    }
}

/// JSON report layout: `{"diff": ..., "violations": [...]}`.
#[derive(Debug, Serialize)]
pub struct GuardReport<'a> {
    pub diff: &'a ManifestDiff,
    pub violations: &'a [String],
}

/// Split `modified` into (family changes, other QC edits).
///
/// An entry with a `family` change lands only in the first partition, even if
/// other fields changed too.
pub fn partition_modified(modified: &[ModifiedEntry]) -> (Vec<&ModifiedEntry>, Vec<&ModifiedEntry>) {
    modified.iter().partition(|m| m.changes_family())
}

/// Judge a diff against a policy.
///
/// Every category is checked; all violations are collected.
pub fn evaluate(diff: ManifestDiff, policy: &ChangePolicy) -> Verdict {
    let started = Instant::now();
    log_op_start!("evaluate");

    let mut violations = Vec::new();
    if !diff.added.is_empty() && !policy.allow_added {
        violations.push(format!("Added features not allowed: {}", diff.added.len()));
    }
    if !diff.removed.is_empty() && !policy.allow_removed {
        violations.push(format!(
            "Removed features not allowed: {}",
            diff.removed.len()
        ));
    }
    if !diff.reordered.is_empty() && !policy.allow_reordered {
        violations.push(format!(
            "Reordered features not allowed: {}",
            diff.reordered.len()
        ));
    }

    let (family_changes, other_mods) = partition_modified(&diff.modified);
    if !family_changes.is_empty() && !policy.allow_family_changes {
        violations.push(format!(
            "Family changes not allowed: {}",
            family_changes.len()
        ));
    }
    if !other_mods.is_empty() && !policy.allow_modified {
        violations.push(format!(
            "QC modifications not allowed: {}",
            other_mods.len()
        ));
    }

    log_op_end!(
        "evaluate",
        duration_ms = started.elapsed().as_millis() as u64,
        violations_len = violations.len()
    );
    Verdict { diff, violations }
}

/// Write the `{diff, violations}` report as pretty JSON, replacing any
/// existing file. Parent directories are created.
///
/// # Errors
///
/// - `Serialization`: the report could not be encoded
/// - `Io`: the directory or file could not be written
pub fn write_report(verdict: &Verdict, path: impl AsRef<Path>) -> Result<(), ExError> {
    let path = path.as_ref();
    let json = serde_json::to_string_pretty(&verdict.report()).map_err(|e| {
        ExError::new(ExErrorKind::Serialization)
            .with_op("write_report")
            .with_message(e.to_string())
    })?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| {
            ExError::new(ExErrorKind::Io)
                .with_op("write_report")
                .with_path(parent)
                .with_message(e.to_string())
        })?;
    }

    std::fs::write(path, json).map_err(|e| {
        ExError::new(ExErrorKind::Io)
            .with_op("write_report")
            .with_path(path)
            .with_message(e.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::model::{FieldChange, ReorderEntry};
    use serde_json::json;
    use std::collections::BTreeMap;

    fn modified(fid: &str, fields: &[&str]) -> ModifiedEntry {
        let changes: BTreeMap<String, FieldChange> = fields
            .iter()
            .map(|f| {
                (
                    f.to_string(),
                    FieldChange {
                        a: json!("old"),
                        b: json!("new"),
                    },
                )
            })
            .collect();
        ModifiedEntry {
            feature_id: fid.to_string(),
            changes,
        }
    }

    #[test]
    fn test_default_policy_denies_everything() {
        assert_eq!(ChangePolicy::default(), ChangePolicy::deny_all());
        assert!(!ChangePolicy::default().allow_family_changes);
    }

    #[test]
    fn test_partition_is_mutually_exclusive() {
        let entries = vec![
            modified("x", &["family", "dtype"]),
            modified("y", &["dtype"]),
            modified("z", &["family"]),
        ];
        let (fam, other) = partition_modified(&entries);
        let fam_ids: Vec<_> = fam.iter().map(|m| m.feature_id.as_str()).collect();
        let other_ids: Vec<_> = other.iter().map(|m| m.feature_id.as_str()).collect();
        assert_eq!(fam_ids, vec!["x", "z"]);
        assert_eq!(other_ids, vec!["y"]);
    }

    #[test]
    fn test_all_violations_collected_in_order() {
        let diff = ManifestDiff {
            added: vec!["d".into()],
            removed: vec!["a".into(), "e".into()],
            reordered: vec![ReorderEntry {
                feature_id: "b".into(),
                from: 1,
                to: 0,
            }],
            modified: vec![modified("x", &["family"]), modified("y", &["thresholds"])],
            ..Default::default()
        };
        let verdict = evaluate(diff, &ChangePolicy::default());
        assert_eq!(
            verdict.violations,
            vec![
                "Added features not allowed: 1",
                "Removed features not allowed: 2",
                "Reordered features not allowed: 1",
                "Family changes not allowed: 1",
                "QC modifications not allowed: 1",
            ]
        );
        assert_eq!(verdict.disposition(), Disposition::Blocked);
        assert_eq!(verdict.disposition().exit_code(), 2);
    }

    #[test]
    fn test_meta_changes_alone_do_not_block() {
        let mut diff = ManifestDiff::default();
        diff.meta_changes.insert(
            "view".into(),
            FieldChange {
                a: json!("D1"),
                b: json!("H1"),
            },
        );
        let verdict = evaluate(diff, &ChangePolicy::default());
        assert!(verdict.passed());
        assert_eq!(verdict.disposition().status_line(), "CI GUARD — OK");
    }

    #[test]
    fn test_allow_flags_are_independent() {
        let diff = ManifestDiff {
            added: vec!["d".into()],
            removed: vec!["a".into()],
            ..Default::default()
        };
        let policy = ChangePolicy {
            allow_added: true,
            ..Default::default()
        };
        let verdict = evaluate(diff, &policy);
        assert_eq!(verdict.violations, vec!["Removed features not allowed: 1"]);
    }
}
