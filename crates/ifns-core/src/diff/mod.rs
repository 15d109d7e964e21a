//! Manifest diff engine.
//!
//! Compares a baseline and a candidate feature manifest and produces a
//! structured, deterministic delta suitable for the CI guard and for human
//! review.
//!
//! ## Entry point
//!
//! ```
//! use ifns_core::diff::compute_diff;
//! use ifns_core::manifest::FeatureManifest;
//!
//! let a = FeatureManifest::default();
//! let diff = compute_diff(&a, &a);
//! assert!(diff.is_empty());
//! ```
//!
//! ## Guarantees
//!
//! - **Determinism**: `added`/`removed` are sorted, `reordered` follows the
//!   baseline column order, `modified` is sorted by feature id.
//! - **Purity**: no I/O; loading happens before the engine is called.
//! - **Membership independence**: `per_feature_qc` entries are compared for
//!   every feature present in both QC maps, whether or not it is listed in
//!   `columns`.

pub mod engine;
pub mod human_summary;
pub mod model;

pub use engine::{compute_diff, diff_manifest_bytes};
pub use human_summary::render_human_summary;
pub use model::{DiffSummary, FieldChange, ManifestDiff, ModifiedEntry, ReorderEntry};
