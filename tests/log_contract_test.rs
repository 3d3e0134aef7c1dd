// Integration tests for the activity log shared by the vision and sensor loops

use chrono::Utc;
use hivewatch::colony::ColonyStats;
use hivewatch::logs::{ActivityLog, ActivityRecord};
use hivewatch::tracking::{Direction, TrackClassifier, TrackingConfig};
use std::fs;
use tempfile::TempDir;

/// Drive the classifier through one session and record it
fn run_session(log: &ActivityLog, leaving_tracks: u64) {
    let mut classifier = TrackClassifier::new(TrackingConfig::default());
    let mut stats = ColonyStats::new();

    for frame in 0..12 {
        for track_id in 0..leaving_tracks {
            let x = 600.0 - frame as f64 * 25.0;
            let update = classifier.observe(track_id, x, 400.0, 480.0);
            stats.apply(&update);
        }
        classifier.next_frame();
    }

    log.append(ActivityRecord::from_snapshot(&stats.snapshot(), Utc::now()))
        .unwrap();
}

#[test]
fn test_sensor_side_reads_what_vision_side_wrote() {
    let temp_dir = TempDir::new().unwrap();
    let log = ActivityLog::new(temp_dir.path().join("activity_log.json"));

    run_session(&log, 4);

    let latest = log.latest_activity();
    // 20 presence + full churn
    assert_eq!(latest.activity_level, 70);
    assert_eq!(latest.wasps_detected, 0);

    let record = &log.load().unwrap().activity_records[0];
    assert_eq!(record.bee_count, 4);
    assert_eq!(record.leaving, 4);
    assert_eq!(record.entering, 0);
}

#[test]
fn test_leaving_decided_once_per_track() {
    let mut classifier = TrackClassifier::new(TrackingConfig::default());
    let mut stats = ColonyStats::new();

    for frame in 0..40 {
        let update = classifier.observe(9, 800.0 - frame as f64 * 20.0, 400.0, 480.0);
        stats.apply(&update);
        classifier.next_frame();
    }

    assert_eq!(classifier.track(9).unwrap().direction(), Direction::Leaving);
    assert_eq!(stats.snapshot().leaving, 1);
}

#[test]
fn test_sessions_append_in_order() {
    let temp_dir = TempDir::new().unwrap();
    let log = ActivityLog::new(temp_dir.path().join("activity_log.json"));

    for tracks in 1..=3 {
        run_session(&log, tracks);
    }

    let counts: Vec<u64> = log
        .load()
        .unwrap()
        .activity_records
        .iter()
        .map(|r| r.bee_count)
        .collect();
    assert_eq!(counts, vec![1, 2, 3]);
}

#[test]
fn test_hand_written_log_is_accepted() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("activity_log.json");
    fs::write(
        &path,
        r#"{
  "activity_records": [
    {
      "timestamp": "2026-06-01T09:30:00Z",
      "activity_level": 44,
      "bee_count": 8,
      "entering": 2,
      "leaving": 1,
      "wasps_detected": 1
    }
  ]
}"#,
    )
    .unwrap();

    let log = ActivityLog::new(&path);
    let latest = log.latest_activity();
    assert_eq!(latest.activity_level, 44);
    assert_eq!(latest.wasps_detected, 1);
    assert_eq!(log.wasp_total().unwrap(), 1);
}
