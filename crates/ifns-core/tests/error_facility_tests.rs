#![allow(clippy::unwrap_used, clippy::expect_used)]

use ifns_core::errors::{ExError, ExErrorKind, IfnsError};

#[test]
fn test_file_not_found_verifiable_by_kind() {
    let err = IfnsError::FileNotFound {
        path: "data/features.csv".to_string(),
    };

    let ex_err: ExError = err.into();

    assert_eq!(ex_err.kind(), ExErrorKind::NotFound);
    assert_eq!(ex_err.code(), "ERR_NOT_FOUND");
    assert_eq!(ex_err.path(), Some("data/features.csv"));
}

#[test]
fn test_missing_field_distinct_from_invalid_manifest() {
    let err = IfnsError::MissingManifestField {
        field: "frequency".to_string(),
    };

    let ex_err: ExError = err.into();

    assert_eq!(ex_err.kind(), ExErrorKind::MissingField);
    assert_ne!(ex_err.kind(), ExErrorKind::InvalidManifest);
    assert!(ex_err.message().contains("frequency"));
}

#[test]
fn test_invalid_date_structured_fields() {
    let err = IfnsError::InvalidDate {
        value: "2025/03/07".to_string(),
    };

    let ex_err: ExError = err.into();

    assert_eq!(ex_err.kind(), ExErrorKind::InvalidDate);
    assert_eq!(ex_err.code(), "ERR_INVALID_DATE");
    assert!(ex_err.message().contains("2025/03/07"));
}

#[test]
fn test_invalid_glob_keeps_pattern() {
    let err = IfnsError::InvalidGlob {
        pattern: "data/[x".to_string(),
        message: "unclosed character class".to_string(),
    };

    let ex_err: ExError = err.into();

    assert_eq!(ex_err.kind(), ExErrorKind::InvalidGlob);
    assert!(ex_err.message().contains("data/[x"));
}

#[test]
fn test_calendar_errors_are_invalid_input() {
    let err = IfnsError::InvalidCalendar {
        path: "calendar.json".to_string(),
        message: "expected object".to_string(),
    };

    let ex_err: ExError = err.into();

    assert_eq!(ex_err.kind(), ExErrorKind::InvalidInput);
    assert_eq!(ex_err.path(), Some("calendar.json"));
}

#[test]
fn test_config_errors_are_invalid_config() {
    let err = IfnsError::InvalidConfig {
        reason: "input glob must not be empty".to_string(),
    };

    let ex_err: ExError = err.into();

    assert_eq!(ex_err.kind(), ExErrorKind::InvalidConfig);
    assert_eq!(ex_err.code(), "ERR_INVALID_CONFIG");
}

#[test]
fn test_builder_and_display() {
    let err = ExError::new(ExErrorKind::DuplicateColumn)
        .with_op("parse_manifest_bytes")
        .with_entity_id("ret_1")
        .with_message("column listed twice");

    assert_eq!(err.op(), Some("parse_manifest_bytes"));
    assert_eq!(err.entity_id(), Some("ret_1"));

    let shown = err.to_string();
    assert!(shown.contains("ERR_DUPLICATE_COLUMN"));
    assert!(shown.contains("parse_manifest_bytes"));
    assert!(shown.contains("ret_1"));
}

#[test]
fn test_all_codes_are_distinct() {
    let kinds = [
        ExErrorKind::InvalidInput,
        ExErrorKind::InvalidConfig,
        ExErrorKind::NotFound,
        ExErrorKind::InvalidManifest,
        ExErrorKind::MissingField,
        ExErrorKind::DuplicateColumn,
        ExErrorKind::InvalidGlob,
        ExErrorKind::InvalidDate,
        ExErrorKind::Io,
        ExErrorKind::Serialization,
        ExErrorKind::Internal,
    ];
    let codes: std::collections::HashSet<_> = kinds.iter().map(|k| k.code()).collect();
    assert_eq!(codes.len(), kinds.len());
    assert!(codes.iter().all(|c| c.starts_with("ERR_")));
}
