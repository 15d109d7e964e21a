//! Manifest loading: bytes or file → [`FeatureManifest`].

#![allow(clippy::result_large_err)]

use crate::errors::{ExError, ExErrorKind};
use crate::manifest::model::FeatureManifest;
use crate::{log_op_end, log_op_error, log_op_start};
use serde_json::Value;
use std::path::Path;
use std::time::Instant;

/// Parse raw manifest bytes into a typed [`FeatureManifest`].
///
/// # Errors
///
/// - `InvalidManifest`: bytes are not valid UTF-8 or JSON, the root is not an
///   object, or a field has the wrong shape (e.g. `columns` is not a list of
///   strings)
/// - `DuplicateColumn`: an identifier appears twice in `columns`
pub fn parse_manifest_bytes(bytes: &[u8]) -> Result<FeatureManifest, ExError> {
    let text = std::str::from_utf8(bytes).map_err(|e| {
        ExError::new(ExErrorKind::InvalidManifest)
            .with_op("parse_manifest_bytes")
            .with_message(format!("manifest is not valid UTF-8: {}", e))
    })?;

    let raw: Value = serde_json::from_str(text).map_err(|e| {
        ExError::new(ExErrorKind::InvalidManifest)
            .with_op("parse_manifest_bytes")
            .with_message(format!("manifest is not valid JSON: {}", e))
    })?;

    if !raw.is_object() {
        return Err(ExError::new(ExErrorKind::InvalidManifest)
            .with_op("parse_manifest_bytes")
            .with_message("manifest JSON root must be an object"));
    }

    let manifest: FeatureManifest = serde_json::from_value(raw).map_err(|e| {
        ExError::new(ExErrorKind::InvalidManifest)
            .with_op("parse_manifest_bytes")
            .with_message(format!("failed to deserialize manifest: {}", e))
    })?;

    if let Some(dup) = manifest.first_duplicate_column() {
        return Err(ExError::new(ExErrorKind::DuplicateColumn)
            .with_op("parse_manifest_bytes")
            .with_entity_id(dup)
            .with_message("feature identifier listed more than once in `columns`"));
    }

    Ok(manifest)
}

/// Read and parse a manifest file.
///
/// # Errors
///
/// - `NotFound`: the file does not exist
/// - `Io`: the file could not be read
/// - any error from [`parse_manifest_bytes`], with the path attached
pub fn load_manifest(path: impl AsRef<Path>) -> Result<FeatureManifest, ExError> {
    let path = path.as_ref();
    let started = Instant::now();
    log_op_start!("load_manifest", path = %path.display());

    let result = std::fs::read(path)
        .map_err(|e| {
            let kind = if e.kind() == std::io::ErrorKind::NotFound {
                ExErrorKind::NotFound
            } else {
                ExErrorKind::Io
            };
            ExError::new(kind)
                .with_op("load_manifest")
                .with_path(path)
                .with_message(e.to_string())
        })
        .and_then(|bytes| parse_manifest_bytes(&bytes).map_err(|e| e.with_path(path)));

    let duration_ms = started.elapsed().as_millis() as u64;
    match &result {
        Ok(manifest) => {
            log_op_end!(
                "load_manifest",
                duration_ms = duration_ms,
                columns_len = manifest.columns.len()
            );
        }
        Err(err) => {
            log_op_error!("load_manifest", err.clone(), duration_ms = duration_ms);
        }
    }
    result
}
