//! IFNS Core - feature manifest governance and weekly QC
//!
//! This crate provides the building blocks behind the `ifns-cli` commands:
//! - Feature manifest model with explicit absent/null field semantics
//! - Deterministic manifest diff engine with a Markdown summary renderer
//! - Fail-closed change policy and the CI guard entry point
//! - Weekly QC aggregation over feature observations and clip-event logs
//! - Feature schema linter
//!
//! Every public entry point returns [`ExError`] and logs one start and one
//! end event through the [`logging_facility`].

pub mod config;
pub mod diff;
pub mod errors;
pub mod guard;
pub mod lint;
pub mod logging_facility;
pub mod manifest;
pub mod policy;
pub mod qc;

// Re-export commonly used types
pub use config::{GuardConfig, QcWeeklyConfig};
pub use diff::{compute_diff, render_human_summary, ManifestDiff};
pub use errors::{ExError, ExErrorKind, IfnsError, Result};
pub use guard::run_guard;
pub use manifest::{load_manifest, FeatureManifest, FieldValue};
pub use policy::{evaluate, ChangePolicy, Disposition, Verdict};
pub use qc::{run_qc_weekly, QcWeeklyRecord};
