use super::*;
use hivewatch::logs::ActivityLog;
use hivewatch::tracking::TrackingConfig;
use std::time::Duration;
use tempfile::TempDir;
use tokio::io::{AsyncWriteExt, BufReader};

/// Track 1 walks right along the bottom of a 480 px frame; track 2 hovers
/// near the top.
fn frames(count: usize) -> String {
    let mut out = String::new();
    for i in 0..count {
        let x = i as f64 * 20.0;
        out.push_str(&format!(
            r#"{{"frame_height": 480, "detections": [{{"track_id": 1, "bbox": [{}, 390, {}, 410]}}, {{"track_id": 2, "bbox": [90, 10, 110, 30]}}]}}"#,
            x - 10.0,
            x + 10.0
        ));
        out.push('\n');
    }
    out
}

fn config(dir: &TempDir, session: Duration) -> TrackerConfig {
    let mut config = TrackerConfig::new(dir.path().join("activity_log.json"), TrackingConfig::default());
    config.session = session;
    config
}

#[tokio::test]
async fn test_session_record_from_frames() {
    let dir = TempDir::new().unwrap();
    let config = config(&dir, Duration::from_secs(30));
    let input = frames(12);

    let sessions = run_sessions(BufReader::new(input.as_bytes()), &config)
        .await
        .unwrap();
    assert_eq!(sessions, 1);

    let log = ActivityLog::new(&config.activity_log);
    let records = log.load().unwrap().activity_records;
    assert_eq!(records.len(), 1);
    let record = &records[0];
    assert_eq!(record.bee_count, 2);
    assert_eq!(record.entering, 1);
    assert_eq!(record.leaving, 0);
    assert_eq!(record.wasps_detected, 1);
    // 10 presence + 1/2 churn * 50
    assert_eq!(record.activity_level, 35);
}

#[tokio::test]
async fn test_bad_lines_are_skipped() {
    let dir = TempDir::new().unwrap();
    let config = config(&dir, Duration::from_secs(30));
    let input = format!("not json\n\n{{\"frame_height\": 0}}\n{}", frames(12));

    run_sessions(BufReader::new(input.as_bytes()), &config)
        .await
        .unwrap();

    let log = ActivityLog::new(&config.activity_log);
    assert_eq!(log.latest_activity().activity_level, 35);
}

#[tokio::test]
async fn test_empty_input_still_records_a_session() {
    let dir = TempDir::new().unwrap();
    let mut config = config(&dir, Duration::from_secs(30));
    config.single_session = true;

    run_sessions(BufReader::new(&b""[..]), &config).await.unwrap();

    let log = ActivityLog::new(&config.activity_log);
    let records = log.load().unwrap().activity_records;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].bee_count, 0);
    assert_eq!(log.wasp_total().unwrap(), 0);
}

#[tokio::test]
async fn test_sessions_reset_between_windows() {
    let dir = TempDir::new().unwrap();
    let config = config(&dir, Duration::from_millis(150));
    let (mut writer, reader) = tokio::io::duplex(64 * 1024);

    let feeder = tokio::spawn(async move {
        writer.write_all(frames(12).as_bytes()).await.unwrap();
        tokio::time::sleep(Duration::from_millis(400)).await;
        writer.write_all(frames(3).as_bytes()).await.unwrap();
    });

    let sessions = run_sessions(BufReader::new(reader), &config).await.unwrap();
    feeder.await.unwrap();

    assert!(sessions >= 2);
    let records = ActivityLog::new(&config.activity_log)
        .load()
        .unwrap()
        .activity_records;
    assert_eq!(records[0].entering, 1);
    assert_eq!(records[0].wasps_detected, 1);
    // Three frames are too few for either rule
    let last = records.last().unwrap();
    assert_eq!(last.bee_count, 2);
    assert_eq!(last.entering, 0);
    assert_eq!(last.wasps_detected, 0);
}

#[tokio::test]
async fn test_single_session_stops_at_deadline() {
    let dir = TempDir::new().unwrap();
    let mut config = config(&dir, Duration::from_millis(100));
    config.single_session = true;
    let (_writer, reader) = tokio::io::duplex(1024);

    let sessions = tokio::time::timeout(
        Duration::from_secs(5),
        run_sessions(BufReader::new(reader), &config),
    )
    .await
    .unwrap()
    .unwrap();

    assert_eq!(sessions, 1);
}

#[test]
fn test_tracker_finish_session_resets() {
    let mut tracker = ColonyTracker::new(TrackingConfig::default());
    for line in frames(12).lines() {
        tracker.ingest(&parse_frame(line).unwrap());
    }
    assert_eq!(tracker.frames(), 12);
    assert_eq!(tracker.snapshot().entering, 1);

    let record = tracker.finish_session(chrono::Utc::now());
    assert_eq!(record.entering, 1);
    assert_eq!(tracker.frames(), 0);
    assert_eq!(tracker.snapshot(), hivewatch::colony::ColonySnapshot::default());
}

#[test]
fn test_apply_env() {
    let mut config = TrackerConfig::new("activity_log.json", TrackingConfig::default());
    assert_eq!(config.session, Duration::from_secs(60));

    config
        .apply_env(|key| match key {
            "HIVEWATCH_ACTIVITY_LOG" => Some("/tmp/verification_log.json".to_string()),
            "HIVEWATCH_SESSION_SECONDS" => Some("15".to_string()),
            "HIVEWATCH_SINGLE_SESSION" => Some("1".to_string()),
            "HIVEWATCH_CAMERA" => Some("2".to_string()),
            _ => None,
        })
        .unwrap();

    assert_eq!(config.activity_log.to_str(), Some("/tmp/verification_log.json"));
    assert_eq!(config.session, Duration::from_secs(15));
    assert!(config.single_session);
    assert_eq!(config.camera, "2");

    let bad = config.apply_env(|key| (key == "HIVEWATCH_SESSION_SECONDS").then(|| "soon".to_string()));
    assert!(bad.is_err());
}
