//! Feature manifest schema.

use crate::manifest::field::FieldValue;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Scalar context keys compared by the diff engine.
pub const META_KEYS: [&str; 4] = ["view", "horizon", "frequency", "alignment"];

/// Per-feature QC fields compared by the diff engine.
pub const TRACKED_QC_FIELDS: [&str; 10] = [
    "level",
    "dtype",
    "family",
    "tags",
    "horizon",
    "frequency",
    "thresholds",
    "values",
    "value_exceptions",
    "clip_policy",
];

/// Clip budget used when neither the feature nor `policy_defaults` sets one.
pub const DEFAULT_CLIP_BUDGET: f64 = 0.005;

/// Key under `clip_policy` holding the per-day clip budget.
const MAX_CLIPPED_PCT_PER_DAY: &str = "max_clipped_pct_per_day";

/// A versioned feature manifest.
///
/// Missing `columns` and `per_feature_qc` deserialize as empty collections.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureManifest {
    #[serde(default, skip_serializing_if = "FieldValue::is_absent")]
    pub view: FieldValue,

    #[serde(default, skip_serializing_if = "FieldValue::is_absent")]
    pub horizon: FieldValue,

    #[serde(default, skip_serializing_if = "FieldValue::is_absent")]
    pub frequency: FieldValue,

    #[serde(default, skip_serializing_if = "FieldValue::is_absent")]
    pub alignment: FieldValue,

    /// Ordered feature identifiers; position is part of the schema
    #[serde(default)]
    pub columns: Vec<String>,

    /// QC metadata keyed by feature identifier
    #[serde(default)]
    pub per_feature_qc: BTreeMap<String, FeatureQc>,

    /// Digest of the column list, echoed into QC records
    #[serde(default, skip_serializing_if = "FieldValue::is_absent")]
    pub columns_sha256: FieldValue,

    /// Manifest-wide policy defaults (`clip_policy.max_clipped_pct_per_day`)
    #[serde(default, skip_serializing_if = "FieldValue::is_absent")]
    pub policy_defaults: FieldValue,
}

impl FeatureManifest {
    /// Look up one of the [`META_KEYS`] by name.
    pub fn meta(&self, key: &str) -> Option<&FieldValue> {
        match key {
            "view" => Some(&self.view),
            "horizon" => Some(&self.horizon),
            "frequency" => Some(&self.frequency),
            "alignment" => Some(&self.alignment),
            _ => None,
        }
    }

    /// Global per-day clip budget, falling back to [`DEFAULT_CLIP_BUDGET`].
    pub fn global_clip_budget(&self) -> f64 {
        self.policy_defaults
            .value()
            .and_then(|d| d.get("clip_policy"))
            .and_then(|c| c.get(MAX_CLIPPED_PCT_PER_DAY))
            .and_then(Value::as_f64)
            .unwrap_or(DEFAULT_CLIP_BUDGET)
    }

    /// Clip budget for one feature: its own override, else the global budget.
    pub fn clip_budget_for(&self, feature_id: &str) -> f64 {
        self.per_feature_qc
            .get(feature_id)
            .and_then(FeatureQc::clip_budget)
            .unwrap_or_else(|| self.global_clip_budget())
    }

    /// Family label used for QC rollups (`OTHER` when unset or not a string).
    pub fn family_of(&self, feature_id: &str) -> &str {
        self.per_feature_qc
            .get(feature_id)
            .and_then(|qc| qc.family.as_str())
            .unwrap_or("OTHER")
    }

    /// The first identifier that appears more than once in `columns`.
    pub fn first_duplicate_column(&self) -> Option<&str> {
        let mut seen = std::collections::BTreeSet::new();
        self.columns
            .iter()
            .find(|c| !seen.insert(c.as_str()))
            .map(|c| c.as_str())
    }
}

/// Per-feature QC metadata record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureQc {
    #[serde(default, skip_serializing_if = "FieldValue::is_absent")]
    pub level: FieldValue,
    #[serde(default, skip_serializing_if = "FieldValue::is_absent")]
    pub dtype: FieldValue,
    #[serde(default, skip_serializing_if = "FieldValue::is_absent")]
    pub family: FieldValue,
    #[serde(default, skip_serializing_if = "FieldValue::is_absent")]
    pub tags: FieldValue,
    #[serde(default, skip_serializing_if = "FieldValue::is_absent")]
    pub horizon: FieldValue,
    #[serde(default, skip_serializing_if = "FieldValue::is_absent")]
    pub frequency: FieldValue,
    #[serde(default, skip_serializing_if = "FieldValue::is_absent")]
    pub thresholds: FieldValue,
    #[serde(default, skip_serializing_if = "FieldValue::is_absent")]
    pub values: FieldValue,
    #[serde(default, skip_serializing_if = "FieldValue::is_absent")]
    pub value_exceptions: FieldValue,
    #[serde(default, skip_serializing_if = "FieldValue::is_absent")]
    pub clip_policy: FieldValue,
}

impl FeatureQc {
    /// Look up one of the [`TRACKED_QC_FIELDS`] by name.
    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        match name {
            "level" => Some(&self.level),
            "dtype" => Some(&self.dtype),
            "family" => Some(&self.family),
            "tags" => Some(&self.tags),
            "horizon" => Some(&self.horizon),
            "frequency" => Some(&self.frequency),
            "thresholds" => Some(&self.thresholds),
            "values" => Some(&self.values),
            "value_exceptions" => Some(&self.value_exceptions),
            "clip_policy" => Some(&self.clip_policy),
            _ => None,
        }
    }

    /// Per-feature clip budget from `clip_policy.max_clipped_pct_per_day`.
    pub fn clip_budget(&self) -> Option<f64> {
        self.clip_policy
            .value()
            .and_then(|p| p.get(MAX_CLIPPED_PCT_PER_DAY))
            .and_then(Value::as_f64)
    }
}
