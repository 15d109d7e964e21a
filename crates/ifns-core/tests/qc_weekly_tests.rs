//! Weekly QC aggregation, end to end over temporary files.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use chrono::NaiveDate;
use ifns_core::config::QcWeeklyConfig;
use ifns_core::errors::ExErrorKind;
use ifns_core::logging_facility::test_capture::init_test_capture;
use ifns_core::qc::{run_qc_weekly, QcWeeklyRecord};
use ifns_core_types::schema::{EVENT_END, EVENT_START};
use serde_json::{json, Value};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {} got {}",
        expected,
        actual
    );
}

/// Week of 2025-03-01..=2025-03-07 with Monday 03-03 closed.
fn write_fixture(dir: &Path) {
    fs::write(
        dir.join("manifest.json"),
        serde_json::to_vec(&json!({
            "view": "D1",
            "horizon": "h5",
            "frequency": "1d",
            "columns_sha256": "deadbeef",
            "columns": ["ret_1", "atr_14"],
            "policy_defaults": {"clip_policy": {"max_clipped_pct_per_day": 0.1}},
            "per_feature_qc": {
                "ret_1": {"family": "MOMENTUM", "clip_policy": {"max_clipped_pct_per_day": 1.0}},
                "atr_14": {"family": "VOLATILITY"}
            }
        }))
        .unwrap(),
    )
    .unwrap();

    fs::write(
        dir.join("calendar.json"),
        r#"{"closed": ["2025-03-03"], "early_close": {}}"#,
    )
    .unwrap();

    fs::create_dir_all(dir.join("features")).unwrap();
    fs::write(
        dir.join("features").join("part-001.csv"),
        "timestamp,ret_1,atr_14,unrelated\n\
         2025-02-28,1,1,x\n\
         2025-03-04,1,1,x\n\
         2025-03-05,1,,x\n",
    )
    .unwrap();
    fs::write(
        dir.join("features").join("part-002.csv"),
        "timestamp,ret_1,atr_14\n\
         2025-03-06,NA,2\n\
         2025-03-07,1,3\n",
    )
    .unwrap();

    fs::create_dir_all(dir.join("clips")).unwrap();
    fs::write(
        dir.join("clips").join("clips.ndjson"),
        "{\"timestamp\": \"2025-03-04T10:00:00\", \"feature_id\": \"ret_1\"}\n\
         {\"timestamp\": \"2025-03-04T11:00:00\", \"feature_id\": \"atr_14\"}\n\
         {\"timestamp\": \"2025-03-06T11:00:00\", \"feature_id\": \"atr_14\"}\n\
         {\"timestamp\": \"2025-03-09T11:00:00\", \"feature_id\": \"atr_14\"}\n\
         {\"timestamp\": \"2025-03-05T11:00:00\", \"feature_id\": \"unknown\"}\n\
         garbage line\n",
    )
    .unwrap();
}

fn config(dir: &Path) -> QcWeeklyConfig {
    QcWeeklyConfig {
        manifest: dir.join("manifest.json"),
        calendar: Some(dir.join("calendar.json")),
        input_glob: format!("{}/features/*.csv", dir.display()),
        clip_glob: Some(format!("{}/clips/*.ndjson", dir.display())),
        week_end: NaiveDate::from_ymd_opt(2025, 3, 7).unwrap(),
        out: dir.join("out").join("qc_weekly.jsonl"),
    }
}

#[test]
fn test_weekly_record_metrics() {
    let tmp = TempDir::new().unwrap();
    write_fixture(tmp.path());
    let cfg = config(tmp.path());
    cfg.validate().unwrap();

    let record = run_qc_weekly(&cfg).unwrap();

    assert_eq!(record.ts_week_end, "2025-03-07");
    assert_eq!(record.view, json!("D1"));
    assert_eq!(record.horizon, json!("h5"));
    assert_eq!(record.frequency, json!("1d"));
    assert_eq!(record.manifest_sha256, json!("deadbeef"));

    // 4 rows in window; 6 open days expected
    assert_eq!(record.row_count, 4);
    assert_close(record.integrity_pct, 0.666667);

    // each column is 3/4 populated
    assert_close(record.coverage_pct_mean, 0.75);
    assert_close(record.max_na_pct_any_feature, 0.25);

    // 3 in-window clips on manifest columns over 6 non-NA observations
    assert_close(record.clip_events_pct, 0.5);
    // ret_1 at 100% is within its 1.0 override; atr_14 breaches 0.1 on two days
    assert_eq!(record.clip_budget_violations, 2);
    assert_eq!(record.drift_alerts_count, 0);
    assert_eq!(record.notes, "");

    let families: Vec<_> = record
        .family_breakdown
        .iter()
        .map(|f| f.family.as_str())
        .collect();
    assert_eq!(families, vec!["MOMENTUM", "VOLATILITY"]);
    let momentum = &record.family_breakdown[0];
    assert_eq!(momentum.feature_count, 1);
    assert_close(momentum.coverage_pct_mean, 0.75);
    assert_close(momentum.max_na_pct, 0.25);
    assert_close(momentum.clip_events_pct, 1.0 / 3.0);
    assert_close(record.family_breakdown[1].clip_events_pct, 2.0 / 3.0);
}

#[test]
fn test_output_is_append_only_jsonl() {
    let capture = init_test_capture();
    let tmp = TempDir::new().unwrap();
    write_fixture(tmp.path());
    let cfg = config(tmp.path());

    let first = run_qc_weekly(&cfg).unwrap();
    run_qc_weekly(&cfg).unwrap();

    let text = fs::read_to_string(&cfg.out).unwrap();
    let lines: Vec<_> = text.lines().collect();
    assert_eq!(lines.len(), 2);

    let parsed: QcWeeklyRecord = serde_json::from_str(lines[0]).unwrap();
    assert_eq!(parsed, first);

    let raw: Value = serde_json::from_str(lines[1]).unwrap();
    let keys: Vec<_> = raw.as_object().unwrap().keys().cloned().collect();
    for key in [
        "ts_week_end",
        "view",
        "horizon",
        "frequency",
        "manifest_sha256",
        "row_count",
        "integrity_pct",
        "coverage_pct_mean",
        "max_na_pct_any_feature",
        "drift_alerts_count",
        "clip_events_pct",
        "clip_budget_violations",
        "family_breakdown",
        "notes",
    ] {
        assert!(keys.iter().any(|k| k == key), "missing key {}", key);
    }

    capture.assert_event_exists("run_qc_weekly", EVENT_START);
    capture.assert_event_exists("run_qc_weekly", EVENT_END);
}

#[test]
fn test_no_clip_glob_and_no_calendar() {
    let tmp = TempDir::new().unwrap();
    write_fixture(tmp.path());
    let mut cfg = config(tmp.path());
    cfg.clip_glob = None;
    cfg.calendar = Some(tmp.path().join("does-not-exist.json"));

    let record = run_qc_weekly(&cfg).unwrap();
    assert_close(record.integrity_pct, 0.571429);
    assert_eq!(record.clip_events_pct, 0.0);
    assert_eq!(record.clip_budget_violations, 0);
}

#[test]
fn test_no_matching_inputs_yields_empty_week() {
    let tmp = TempDir::new().unwrap();
    write_fixture(tmp.path());
    let mut cfg = config(tmp.path());
    cfg.input_glob = format!("{}/nothing/*.csv", tmp.path().display());

    let record = run_qc_weekly(&cfg).unwrap();
    assert_eq!(record.row_count, 0);
    assert_eq!(record.integrity_pct, 0.0);
    assert_eq!(record.coverage_pct_mean, 0.0);
    assert_eq!(record.max_na_pct_any_feature, 1.0);
}

#[test]
fn test_hourly_manifest_uses_early_close() {
    let tmp = TempDir::new().unwrap();
    write_fixture(tmp.path());
    fs::write(
        tmp.path().join("manifest.json"),
        r#"{"view": "H1", "horizon": "h1", "frequency": "1h", "columns": ["ret_1"]}"#,
    )
    .unwrap();
    fs::write(
        tmp.path().join("calendar.json"),
        r#"{"closed": ["2025-03-01", "2025-03-02"], "early_close": {"2025-03-07": "13:00"}}"#,
    )
    .unwrap();

    let record = run_qc_weekly(&config(tmp.path())).unwrap();
    // 4 full days * 7 + 1 early close * 3 = 31 expected
    assert_close(record.integrity_pct, 0.129032);
    assert_eq!(record.manifest_sha256, json!(""));
}

#[test]
fn test_missing_frequency_is_an_error() {
    let tmp = TempDir::new().unwrap();
    write_fixture(tmp.path());
    fs::write(tmp.path().join("manifest.json"), r#"{"columns": ["ret_1"]}"#).unwrap();

    let cfg = config(tmp.path());
    let err = run_qc_weekly(&cfg).unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::MissingField);
    assert!(!cfg.out.exists());
}

#[test]
fn test_malformed_calendar_is_an_error() {
    let tmp = TempDir::new().unwrap();
    write_fixture(tmp.path());
    fs::write(tmp.path().join("calendar.json"), "[1, 2, 3]").unwrap();

    let err = run_qc_weekly(&config(tmp.path())).unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::InvalidInput);
}

#[test]
fn test_invalid_glob_is_an_error() {
    let tmp = TempDir::new().unwrap();
    write_fixture(tmp.path());
    let mut cfg = config(tmp.path());
    cfg.input_glob = format!("{}/features/[bad", tmp.path().display());

    let err = run_qc_weekly(&cfg).unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::InvalidGlob);
}
