use super::*;
use chrono::{Duration, Utc};
use std::fs;
use tempfile::TempDir;

fn activity(level: u8, wasps: u64) -> ActivityRecord {
    ActivityRecord {
        timestamp: Utc::now(),
        activity_level: level,
        bee_count: 4,
        entering: 1,
        leaving: 2,
        wasps_detected: wasps,
    }
}

#[test]
fn test_append_to_missing_log_round_trips_in_order() {
    let temp_dir = TempDir::new().unwrap();
    let log = ActivityLog::new(temp_dir.path().join("nested").join("activity_log.json"));

    let base = Utc::now();
    for i in 0..5u8 {
        let mut record = activity(i * 10, 0);
        record.timestamp = base + Duration::seconds(i64::from(i));
        assert_eq!(log.append(record).unwrap(), usize::from(i) + 1);
    }

    let document = log.load().unwrap();
    assert_eq!(document.activity_records.len(), 5);
    let levels: Vec<u8> = document
        .activity_records
        .iter()
        .map(|r| r.activity_level)
        .collect();
    assert_eq!(levels, vec![0, 10, 20, 30, 40]);
}

#[test]
fn test_append_to_empty_document() {
    let temp_dir = TempDir::new().unwrap();
    let log = HealthLog::new(temp_dir.path().join("health_log.json"));
    log.ensure_exists().unwrap();

    let raw = fs::read_to_string(log.path()).unwrap();
    assert!(raw.contains("\"records\""));

    log.append(HealthRecord::default()).unwrap();
    log.append(HealthRecord {
        health_score: 77,
        ..HealthRecord::default()
    })
    .unwrap();

    let document = log.load().unwrap();
    assert_eq!(document.records.len(), 2);
    assert_eq!(document.records[1].health_score, 77);
}

#[test]
fn test_written_document_uses_wire_field_names() {
    let temp_dir = TempDir::new().unwrap();
    let log = ActivityLog::new(temp_dir.path().join("activity_log.json"));
    log.append(activity(42, 1)).unwrap();

    let value: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(log.path()).unwrap()).unwrap();
    let record = &value["activity_records"][0];
    assert_eq!(record["activity_level"], 42);
    assert_eq!(record["bee_count"], 4);
    assert_eq!(record["entering"], 1);
    assert_eq!(record["leaving"], 2);
    assert_eq!(record["wasps_detected"], 1);
    assert!(record["timestamp"].is_string());
}

#[test]
fn test_latest_activity_missing_log() {
    let temp_dir = TempDir::new().unwrap();
    let log = ActivityLog::new(temp_dir.path().join("missing.json"));

    assert_eq!(log.latest_activity(), ActivitySummary::default());
}

#[test]
fn test_latest_activity_empty_records() {
    let temp_dir = TempDir::new().unwrap();
    let log = ActivityLog::new(temp_dir.path().join("activity_log.json"));
    log.ensure_exists().unwrap();

    assert_eq!(log.latest_activity(), ActivitySummary::default());
}

#[test]
fn test_latest_activity_malformed_log() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("activity_log.json");
    fs::write(&path, b"{\"activity_records\": [ {\"activity_level\": ").unwrap();
    let log = ActivityLog::new(&path);

    assert_eq!(log.latest_activity(), ActivitySummary::default());
    assert!(log.wasp_total().is_err());
}

#[test]
fn test_latest_activity_picks_last_record() {
    let temp_dir = TempDir::new().unwrap();
    let log = ActivityLog::new(temp_dir.path().join("activity_log.json"));
    log.append(activity(20, 0)).unwrap();
    log.append(activity(65, 2)).unwrap();

    let latest = log.latest_activity();
    assert_eq!(latest.activity_level, 65);
    assert_eq!(latest.wasps_detected, 2);
    assert!(latest.recorded_at.is_some());
}

#[test]
fn test_missing_fields_take_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("activity_log.json");
    fs::write(
        &path,
        br#"{"activity_records": [{"timestamp": "2026-05-01T10:00:00Z", "activity_level": 12}]}"#,
    )
    .unwrap();
    let log = ActivityLog::new(&path);

    let latest = log.latest_activity();
    assert_eq!(latest.activity_level, 12);
    assert_eq!(latest.wasps_detected, 0);
}

#[test]
fn test_naive_timestamps_are_accepted() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("activity_log.json");
    fs::write(
        &path,
        br#"{"activity_records": [
            {"timestamp": "2025-05-01T11:59:00Z", "activity_level": 20, "wasps_detected": 0},
            {"timestamp": "2025-05-01T12:00:00.123456", "activity_level": 44, "bee_count": 8,
             "entering": 2, "leaving": 1, "wasps_detected": 1}
        ]}"#,
    )
    .unwrap();
    let log = ActivityLog::new(&path);

    let latest = log.latest_activity();
    assert_eq!(latest.activity_level, 44);
    assert_eq!(latest.wasps_detected, 1);
    assert!(latest.recorded_at.is_some());
    assert_eq!(log.wasp_total().unwrap(), 1);

    // Appending keeps the old records and writes RFC 3339 from then on
    log.append(activity(50, 0)).unwrap();
    assert_eq!(log.load().unwrap().activity_records.len(), 3);
}

#[test]
fn test_append_replaces_corrupt_document() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("activity_log.json");
    fs::write(&path, b"not json").unwrap();
    let log = ActivityLog::new(&path);

    assert_eq!(log.append(activity(10, 0)).unwrap(), 1);
    assert_eq!(log.load().unwrap().activity_records.len(), 1);
}

#[test]
fn test_wasp_total_and_reset() {
    let temp_dir = TempDir::new().unwrap();
    let log = ActivityLog::new(temp_dir.path().join("verification_log.json"));
    log.append(activity(10, 0)).unwrap();
    log.append(activity(10, 3)).unwrap();

    assert_eq!(log.wasp_total().unwrap(), 3);

    log.reset().unwrap();
    assert_eq!(log.wasp_total().unwrap(), 0);
    assert!(log.load().unwrap().activity_records.is_empty());
}
