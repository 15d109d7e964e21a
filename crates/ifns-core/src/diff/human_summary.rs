//! Human-readable summary renderer for manifest diffs.

use crate::diff::model::ManifestDiff;
use serde_json::Value;

/// Render a Markdown summary of a [`ManifestDiff`].
///
/// Intended for PR comments and review. Informational only; the structured
/// diff remains the source of truth.
pub fn render_human_summary(diff: &ManifestDiff) -> String {
    let mut out = String::new();

    out.push_str("## Manifest Diff\n\n");

    let s = &diff.summary;
    out.push_str(&format!(
        "| Added | Removed | Reordered | Modified | Meta |\n\
         |---|---|---|---|---|\n\
         | {} | {} | {} | {} | {} |\n\n",
        s.added_count, s.removed_count, s.reordered_count, s.modified_count, s.meta_changes_count
    ));

    if diff.is_empty() {
        out.push_str("_No changes detected._\n");
        return out;
    }

    if !diff.meta_changes.is_empty() {
        out.push_str("### Metadata Changes\n\n");
        for (key, change) in &diff.meta_changes {
            out.push_str(&format!(
                "- **{}**: `{}` → `{}`\n",
                key,
                compact(&change.a),
                compact(&change.b)
            ));
        }
        out.push('\n');
    }

    if !diff.added.is_empty() || !diff.removed.is_empty() {
        out.push_str("### Column Changes\n\n");
        if !diff.added.is_empty() {
            out.push_str(&format!(
                "- **Added** ({}): {}\n",
                diff.added.len(),
                diff.added.join(", ")
            ));
        }
        if !diff.removed.is_empty() {
            out.push_str(&format!(
                "- **Removed** ({}): {}\n",
                diff.removed.len(),
                diff.removed.join(", ")
            ));
        }
        out.push('\n');
    }

    if !diff.reordered.is_empty() {
        out.push_str("### Reordered Columns\n\n");
        for entry in &diff.reordered {
            out.push_str(&format!(
                "- `{}`: {} → {}\n",
                entry.feature_id, entry.from, entry.to
            ));
        }
        out.push('\n');
    }

    if !diff.modified.is_empty() {
        out.push_str("### QC Modifications\n\n");
        for entry in &diff.modified {
            let marker = if entry.changes_family() {
                " (family change)"
            } else {
                ""
            };
            out.push_str(&format!("- `{}`{}\n", entry.feature_id, marker));
            for (field, change) in &entry.changes {
                out.push_str(&format!(
                    "  - {}: `{}` → `{}`\n",
                    field,
                    compact(&change.a),
                    compact(&change.b)
                ));
            }
        }
        out.push('\n');
    }

    out
}

/// Single-line JSON rendering, truncated for display.
fn compact(value: &Value) -> String {
    const MAX: usize = 60;
    let s = value.to_string();
    if s.chars().count() <= MAX {
        s
    } else {
        let head: String = s.chars().take(MAX).collect();
        format!("{}…", head)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::engine::compute_diff;
    use crate::manifest::FeatureManifest;
    use serde_json::json;

    fn manifest(v: Value) -> FeatureManifest {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn test_summary_no_changes() {
        let a = manifest(json!({"view": "D1", "columns": ["a", "b"]}));
        let s = render_human_summary(&compute_diff(&a, &a));
        assert!(s.contains("_No changes detected._"));
        assert!(!s.contains("### Column Changes"));
    }

    #[test]
    fn test_summary_lists_columns_and_reorders() {
        let a = manifest(json!({"columns": ["a", "b", "c"]}));
        let b = manifest(json!({"columns": ["b", "c", "d"]}));
        let s = render_human_summary(&compute_diff(&a, &b));
        assert!(s.contains("- **Added** (1): d"));
        assert!(s.contains("- **Removed** (1): a"));
        assert!(s.contains("- `b`: 1 → 0"));
        assert!(s.contains("- `c`: 2 → 1"));
    }

    #[test]
    fn test_summary_marks_family_changes() {
        let a = manifest(json!({"per_feature_qc": {"x": {"family": "TREND"}}}));
        let b = manifest(json!({"per_feature_qc": {"x": {"family": "MOMENTUM"}}}));
        let s = render_human_summary(&compute_diff(&a, &b));
        assert!(s.contains("- `x` (family change)"));
        assert!(s.contains("family: `\"TREND\"` → `\"MOMENTUM\"`"));
    }

    #[test]
    fn test_summary_meta_changes() {
        let a = manifest(json!({"view": "D1"}));
        let b = manifest(json!({"view": "H1"}));
        let s = render_human_summary(&compute_diff(&a, &b));
        assert!(s.contains("### Metadata Changes"));
        assert!(s.contains("**view**"));
    }

    #[test]
    fn test_compact_truncates_long_values() {
        let long = json!("x".repeat(200));
        let s = compact(&long);
        assert!(s.ends_with('…'));
        assert_eq!(s.chars().count(), 61);
    }
}
