//! Manifest diff output types.
//!
//! Field declaration order matches the serialized report layout. Collections
//! use `BTreeMap` and sorted `Vec` for deterministic serialization.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Structured delta between a baseline (`a`) and a candidate (`b`) manifest.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ManifestDiff {
    /// Per-category counts
    pub summary: DiffSummary,
    /// Feature ids in candidate `columns` but not baseline, sorted
    pub added: Vec<String>,
    /// Feature ids in baseline `columns` but not candidate, sorted
    pub removed: Vec<String>,
    /// Shared feature ids whose position changed, in baseline order
    pub reordered: Vec<ReorderEntry>,
    /// Shared QC records with at least one differing tracked field
    pub modified: Vec<ModifiedEntry>,
    /// Differing scalar context tags
    pub meta_changes: BTreeMap<String, FieldChange>,
}

impl ManifestDiff {
    /// True when no category has any entry.
    pub fn is_empty(&self) -> bool {
        self.added.is_empty()
            && self.removed.is_empty()
            && self.reordered.is_empty()
            && self.modified.is_empty()
            && self.meta_changes.is_empty()
    }
}

/// Counts for quick inspection.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DiffSummary {
    pub added_count: usize,
    pub removed_count: usize,
    pub reordered_count: usize,
    pub modified_count: usize,
    pub meta_changes_count: usize,
}

/// A column that moved.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReorderEntry {
    pub feature_id: String,
    /// Zero-based position in the baseline
    pub from: usize,
    /// Zero-based position in the candidate
    pub to: usize,
}

/// All differing tracked fields of one feature's QC record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModifiedEntry {
    pub feature_id: String,
    pub changes: BTreeMap<String, FieldChange>,
}

impl ModifiedEntry {
    /// True when the feature's `family` classification changed.
    pub fn changes_family(&self) -> bool {
        self.changes.contains_key("family")
    }
}

/// Baseline/candidate values of one field (`null` when missing).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FieldChange {
    pub a: Value,
    pub b: Value,
}
