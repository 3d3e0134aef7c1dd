use crate::frames::{parse_frame, Frame};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use hivewatch::alerting::{ENV_ACTIVITY_LOG, ENV_CAMERA, ENV_SESSION_SECONDS, ENV_SINGLE_SESSION};
use hivewatch::colony::{ColonySnapshot, ColonyStats};
use hivewatch::logs::{ActivityLog, ActivityRecord};
use hivewatch::tracking::{TrackClassifier, TrackingConfig};
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::time::Instant;
use tracing::{info, warn};

/// Frames between idle-track sweeps
const EVICTION_SWEEP_FRAMES: u64 = 100;

#[derive(Debug, Clone)]
pub struct TrackerConfig {
    pub activity_log: PathBuf,
    pub session: Duration,
    /// Stop after the first session (secondary verification pass)
    pub single_session: bool,
    /// Camera label, for logs only
    pub camera: String,
    pub tracking: TrackingConfig,
}

impl TrackerConfig {
    pub fn new(activity_log: impl Into<PathBuf>, tracking: TrackingConfig) -> Self {
        Self {
            activity_log: activity_log.into(),
            session: Duration::from_secs(tracking.session_seconds),
            single_session: false,
            camera: "0".to_string(),
            tracking,
        }
    }

    /// Overlay `HIVEWATCH_*` variables set by the verification runner
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(path) = lookup(ENV_ACTIVITY_LOG) {
            self.activity_log = PathBuf::from(path);
        }
        if let Some(seconds) = lookup(ENV_SESSION_SECONDS) {
            let seconds: u64 = seconds
                .trim()
                .parse()
                .with_context(|| format!("{} must be a number of seconds", ENV_SESSION_SECONDS))?;
            self.session = Duration::from_secs(seconds);
        }
        if let Some(flag) = lookup(ENV_SINGLE_SESSION) {
            self.single_session = matches!(flag.trim(), "1" | "true" | "yes");
        }
        if let Some(camera) = lookup(ENV_CAMERA) {
            self.camera = camera;
        }
        Ok(())
    }
}

/// Classifier plus colony counters for one session
pub struct ColonyTracker {
    classifier: TrackClassifier,
    stats: ColonyStats,
    frames: u64,
}

impl ColonyTracker {
    pub fn new(config: TrackingConfig) -> Self {
        Self {
            classifier: TrackClassifier::new(config),
            stats: ColonyStats::new(),
            frames: 0,
        }
    }

    /// Feed one frame's detections
    pub fn ingest(&mut self, frame: &Frame) {
        for detection in &frame.detections {
            let (x, y) = detection.centre();
            let update = self
                .classifier
                .observe(detection.track_id, x, y, frame.frame_height);
            self.stats.apply(&update);
        }

        self.classifier.next_frame();
        self.frames += 1;
        if self.frames % EVICTION_SWEEP_FRAMES == 0 {
            let max_idle = self.classifier.config().max_idle_frames;
            self.classifier.evict_idle(max_idle);
        }
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn snapshot(&self) -> ColonySnapshot {
        self.stats.snapshot()
    }

    /// Close the session: emit its record and start afresh
    pub fn finish_session(&mut self, timestamp: DateTime<Utc>) -> ActivityRecord {
        let record = ActivityRecord::from_snapshot(&self.stats.snapshot(), timestamp);
        self.reset();
        record
    }

    pub fn reset(&mut self) {
        self.classifier.reset();
        self.stats.reset();
        self.frames = 0;
    }
}

/// Read frames until EOF (or one session when `single_session`), appending
/// one activity record per session. Returns the number of sessions written.
pub async fn run_sessions<R>(reader: R, config: &TrackerConfig) -> Result<usize>
where
    R: AsyncBufRead + Unpin,
{
    let log = ActivityLog::new(&config.activity_log);
    log.ensure_exists()
        .context("Failed to initialize activity log")?;

    info!(
        camera = %config.camera,
        session_seconds = config.session.as_secs(),
        single_session = config.single_session,
        log = %config.activity_log.display(),
        "Starting colony tracking"
    );

    let mut lines = reader.lines();
    let mut tracker = ColonyTracker::new(config.tracking.clone());
    let mut sessions = 0;

    loop {
        let deadline = Instant::now() + config.session;
        let exhausted = loop {
            match tokio::time::timeout_at(deadline, lines.next_line()).await {
                Err(_) => break false,
                Ok(Ok(Some(line))) => match parse_frame(&line) {
                    Ok(frame) => tracker.ingest(&frame),
                    Err(e) => warn!(error = %e, "Skipping detector line"),
                },
                Ok(Ok(None)) => break true,
                Ok(Err(e)) => {
                    warn!(error = %e, "Failed to read detector output");
                    break true;
                }
            }
        };

        let frames = tracker.frames();
        let record = tracker.finish_session(Utc::now());
        match log.append(record.clone()) {
            Ok(count) => info!(
                frames,
                bee_count = record.bee_count,
                entering = record.entering,
                leaving = record.leaving,
                wasps_detected = record.wasps_detected,
                activity_level = record.activity_level,
                records = count,
                "Session recorded"
            ),
            Err(e) => warn!(error = %e, "Failed to save activity data"),
        }
        sessions += 1;

        if exhausted || config.single_session {
            break;
        }
    }

    Ok(sessions)
}
