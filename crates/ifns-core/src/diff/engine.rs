//! Manifest diff computation engine.
//!
//! The core entry point is [`compute_diff`], a pure function over two loaded
//! manifests. [`diff_manifest_bytes`] adds the parse step for callers holding
//! raw bytes.

#![allow(clippy::result_large_err)]

use crate::diff::model::{DiffSummary, FieldChange, ManifestDiff, ModifiedEntry, ReorderEntry};
use crate::errors::ExError;
use crate::manifest::{parse_manifest_bytes, FeatureManifest, FieldValue, META_KEYS, TRACKED_QC_FIELDS};
use crate::{log_op_end, log_op_start};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::time::Instant;

/// Map each identifier to its zero-based position.
///
/// With duplicate identifiers the later occurrence wins.
fn position_index(columns: &[String]) -> HashMap<&str, usize> {
    columns
        .iter()
        .enumerate()
        .map(|(i, c)| (c.as_str(), i))
        .collect()
}

/// Sorted set-delta between two column lists.
///
/// Returns `(added, removed)` where added = in b but not a, removed = in a but not b.
fn sorted_set_delta(a: &[String], b: &[String]) -> (Vec<String>, Vec<String>) {
    let set_a: BTreeSet<&str> = a.iter().map(|s| s.as_str()).collect();
    let set_b: BTreeSet<&str> = b.iter().map(|s| s.as_str()).collect();
    let added = set_b.difference(&set_a).map(|s| s.to_string()).collect();
    let removed = set_a.difference(&set_b).map(|s| s.to_string()).collect();
    (added, removed)
}

fn field_change(a: &FieldValue, b: &FieldValue) -> Option<FieldChange> {
    if a.same_as(b) {
        None
    } else {
        Some(FieldChange {
            a: a.to_json(),
            b: b.to_json(),
        })
    }
}

fn reordered_columns(a: &[String], b: &[String]) -> Vec<ReorderEntry> {
    let idx_a = position_index(a);
    let idx_b = position_index(b);

    a.iter()
        .filter_map(|c| {
            let to = *idx_b.get(c.as_str())?;
            let from = idx_a[c.as_str()];
            (from != to).then(|| ReorderEntry {
                feature_id: c.clone(),
                from,
                to,
            })
        })
        .collect()
}

fn modified_features(a: &FeatureManifest, b: &FeatureManifest) -> Vec<ModifiedEntry> {
    // BTreeMap iteration gives sorted feature ids
    a.per_feature_qc
        .iter()
        .filter_map(|(fid, qa)| {
            let qb = b.per_feature_qc.get(fid)?;
            let changes: BTreeMap<String, FieldChange> = TRACKED_QC_FIELDS
                .iter()
                .filter_map(|name| {
                    let fa = qa.field(name)?;
                    let fb = qb.field(name)?;
                    field_change(fa, fb).map(|c| (name.to_string(), c))
                })
                .collect();
            (!changes.is_empty()).then(|| ModifiedEntry {
                feature_id: fid.clone(),
                changes,
            })
        })
        .collect()
}

/// Compute a structured, deterministic diff between two feature manifests.
///
/// `a` is the baseline, `b` the candidate. Never fails: missing collections
/// are empty and missing fields compare as `null`.
pub fn compute_diff(a: &FeatureManifest, b: &FeatureManifest) -> ManifestDiff {
    let started = Instant::now();
    log_op_start!("compute_diff");

    let mut meta_changes: BTreeMap<String, FieldChange> = BTreeMap::new();
    for key in META_KEYS {
        if let (Some(va), Some(vb)) = (a.meta(key), b.meta(key)) {
            if let Some(change) = field_change(va, vb) {
                meta_changes.insert(key.to_string(), change);
            }
        }
    }

    let (added, removed) = sorted_set_delta(&a.columns, &b.columns);
    let reordered = reordered_columns(&a.columns, &b.columns);
    let modified = modified_features(a, b);

    let summary = DiffSummary {
        added_count: added.len(),
        removed_count: removed.len(),
        reordered_count: reordered.len(),
        modified_count: modified.len(),
        meta_changes_count: meta_changes.len(),
    };

    let diff = ManifestDiff {
        summary,
        added,
        removed,
        reordered,
        modified,
        meta_changes,
    };

    log_op_end!(
        "compute_diff",
        duration_ms = started.elapsed().as_millis() as u64,
        added = diff.summary.added_count,
        removed = diff.summary.removed_count,
        reordered = diff.summary.reordered_count,
        modified = diff.summary.modified_count
    );
    diff
}

/// Parse two manifests from raw bytes and diff them.
///
/// # Errors
///
/// Any error from [`parse_manifest_bytes`] for either side.
pub fn diff_manifest_bytes(a_bytes: &[u8], b_bytes: &[u8]) -> Result<ManifestDiff, ExError> {
    let a = parse_manifest_bytes(a_bytes)?;
    let b = parse_manifest_bytes(b_bytes)?;
    Ok(compute_diff(&a, &b))
}
