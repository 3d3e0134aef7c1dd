use super::HiveMonitor;
use crate::alerting::AlertEngine;
use crate::logs::HealthRecord;
use crate::remote::push_alert;
use crate::sensor::SensorConfig;
use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{interval, Instant};
use tracing::{error, info, warn};

/// Polls on a fixed interval; uploads and checks alerts on the upload cadence
pub struct SensorLoop {
    monitor: Arc<HiveMonitor>,
    engine: Arc<AlertEngine>,
    config: SensorConfig,
    hive_id: String,
    last_upload: Mutex<Option<Instant>>,
}

impl SensorLoop {
    pub fn new(
        monitor: Arc<HiveMonitor>,
        engine: Arc<AlertEngine>,
        config: SensorConfig,
        hive_id: impl Into<String>,
    ) -> Self {
        Self {
            monitor,
            engine,
            config,
            hive_id: hive_id.into(),
            last_upload: Mutex::new(None),
        }
    }

    /// Run until the task is cancelled. A failed cycle delays the next one
    /// by the error backoff.
    pub async fn run_sensor_loop(&self) -> Result<()> {
        info!(
            poll_interval_seconds = self.config.poll_interval_seconds,
            upload_interval_seconds = self.config.upload_interval_seconds,
            "Starting sensor loop"
        );

        let mut timer = interval(Duration::from_secs(self.config.poll_interval_seconds.max(1)));
        timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            let tick = timer.tick().await;

            if let Err(e) = self.run_cycle_at(tick).await {
                error!(error = %e, "Error in monitoring cycle");
                tokio::time::sleep(Duration::from_secs(self.config.error_backoff_seconds)).await;
            }
        }
    }

    /// One poll cycle. Returns whether an upload was attempted.
    pub async fn run_cycle(&self) -> Result<bool> {
        self.run_cycle_at(Instant::now()).await
    }

    /// One poll cycle scheduled at `tick`. The upload cadence is measured
    /// between ticks, not between the ends of cycles.
    pub async fn run_cycle_at(&self, tick: Instant) -> Result<bool> {
        let snapshot = self.monitor.sample();

        if !self.upload_due(tick).await {
            self.save(snapshot.health_record(false, false)).await;
            return Ok(false);
        }

        let evaluation = self
            .engine
            .evaluate(&snapshot.alert_inputs(), &snapshot.activity)
            .await;

        // A failed local write must not hold back the alerts
        self.save(snapshot.health_record(evaluation.wasp_detected, evaluation.wasp_verified))
            .await;

        if self
            .monitor
            .upload(&snapshot, evaluation.wasp_detected, evaluation.wasp_verified)
            .await
        {
            *self.last_upload.lock().await = Some(tick);
        } else {
            warn!("Upload failed, retrying next cycle");
        }

        for alert in &evaluation.alerts {
            push_alert(self.monitor.store().as_ref(), alert, &self.hive_id).await;
        }

        Ok(true)
    }

    async fn save(&self, record: HealthRecord) {
        if let Err(e) = self.monitor.record(record).await {
            warn!(error = %e, "Health record not saved, continuing cycle");
        }
    }

    async fn upload_due(&self, tick: Instant) -> bool {
        match *self.last_upload.lock().await {
            Some(at) => {
                tick.saturating_duration_since(at)
                    >= Duration::from_secs(self.config.upload_interval_seconds)
            }
            None => true,
        }
    }
}
