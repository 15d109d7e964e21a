//! Feature manifest model and loader.
//!
//! A feature manifest describes one feature view: scalar context tags
//! (`view`, `horizon`, `frequency`, `alignment`), the ordered `columns` schema
//! and per-feature QC metadata.
//!
//! Fields use [`FieldValue`] so that a missing key and an explicit `null` stay
//! distinguishable on the loaded model.

pub mod field;
pub mod load;
pub mod model;

pub use field::{json_equal, FieldValue};
pub use load::{load_manifest, parse_manifest_bytes};
pub use model::{FeatureManifest, FeatureQc, DEFAULT_CLIP_BUDGET, META_KEYS, TRACKED_QC_FIELDS};
