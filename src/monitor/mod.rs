//! Sensor-and-alerting side of the hive.
//!
//! `HiveMonitor` owns one cycle's worth of work (poll, score, persist,
//! upload); `SensorLoop` schedules it and runs the alert engine on the upload
//! cadence.

mod scheduler;

pub use scheduler::SensorLoop;

use crate::alerting::AlertInputs;
use crate::logs::{ActivityLog, ActivitySummary, HealthLog, HealthRecord};
use crate::remote::{push_hive_update, ActivityPoint, HiveUpdate, RemoteStore};
use crate::scoring::DerivedMetrics;
use crate::sensor::{SensorReading, SensorSource};
use anyhow::{bail, Context, Result};
use chrono::{DateTime, Datelike, Local, Utc};
use std::sync::{Arc, Mutex};
use tracing::{debug, info};


/// Everything one cycle derives
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HiveSnapshot {
    pub timestamp: DateTime<Utc>,
    pub reading: SensorReading,
    pub activity: ActivitySummary,
    pub metrics: DerivedMetrics,
}

impl HiveSnapshot {
    pub fn alert_inputs(&self) -> AlertInputs {
        AlertInputs {
            temperature: f64::from(self.reading.temperature),
            activity_level: self.activity.activity_level,
            health_score: self.metrics.health_score,
            swarm_likelihood: self.metrics.swarm_likelihood,
        }
    }

    pub fn health_record(&self, wasp_detected: bool, wasp_verified: bool) -> HealthRecord {
        HealthRecord::new(
            self.timestamp,
            &self.reading,
            self.activity.activity_level,
            &self.metrics,
            wasp_detected,
            wasp_verified,
        )
    }

    pub fn hive_update(&self, wasp_detected: bool, wasp_verified: bool) -> HiveUpdate {
        HiveUpdate {
            temperature: self.reading.temperature,
            activity: self.activity.activity_level,
            health: self.metrics.health_score,
            swarm_likelihood: self.metrics.swarm_likelihood,
            brood_state: self.reading.brood_state,
            battery: self.reading.battery,
            wasp_detected: wasp_detected.then_some(true),
            wasp_verified: wasp_detected.then_some(wasp_verified),
            last_updated: self.timestamp,
        }
    }

    pub fn activity_point(&self) -> ActivityPoint {
        ActivityPoint {
            day: self.timestamp,
            activity: self.activity.activity_level,
        }
    }
}

pub struct HiveMonitor {
    sensor: Mutex<SensorSource>,
    activity_log: ActivityLog,
    health_log: tokio::sync::Mutex<HealthLog>,
    store: Arc<dyn RemoteStore>,
    last_reading: Mutex<Option<SensorReading>>,
}

impl HiveMonitor {
    pub fn new(
        sensor: SensorSource,
        activity_log: ActivityLog,
        health_log: HealthLog,
        store: Arc<dyn RemoteStore>,
    ) -> Self {
        Self {
            sensor: Mutex::new(sensor),
            activity_log,
            health_log: tokio::sync::Mutex::new(health_log),
            store,
            last_reading: Mutex::new(None),
        }
    }

    pub fn store(&self) -> &Arc<dyn RemoteStore> {
        &self.store
    }

    /// Poll the microcontroller and score against the latest activity
    pub fn sample(&self) -> HiveSnapshot {
        let reading = {
            let mut sensor = match self.sensor.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            sensor.poll()
        };
        self.remember(reading);
        self.score(reading)
    }

    /// Re-score the last reading without polling; polls when there is none
    pub fn rescore(&self) -> HiveSnapshot {
        let last = match self.last_reading.lock() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        };
        match last {
            Some(reading) => self.score(reading),
            None => self.sample(),
        }
    }

    fn remember(&self, reading: SensorReading) {
        let mut last = match self.last_reading.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *last = Some(reading);
    }

    fn score(&self, reading: SensorReading) -> HiveSnapshot {
        let activity = self.activity_log.latest_activity();
        let metrics = DerivedMetrics::compute(&reading, activity.activity_level, Local::now().month());

        debug!(
            temperature = reading.temperature,
            battery = reading.battery,
            activity_level = activity.activity_level,
            health_score = metrics.health_score,
            swarm_likelihood = metrics.swarm_likelihood,
            "Scored hive reading"
        );

        HiveSnapshot {
            timestamp: Utc::now(),
            reading,
            activity,
            metrics,
        }
    }

    /// Append one record to the health log
    pub async fn record(&self, record: HealthRecord) -> Result<usize> {
        let log = self.health_log.lock().await;
        let count = log
            .append(record)
            .with_context(|| format!("Failed to save health data to {}", log.path().display()))?;
        debug!(records = count, "Saved health data");
        Ok(count)
    }

    /// Push metrics to the remote store; false on any fault
    pub async fn upload(&self, snapshot: &HiveSnapshot, wasp_detected: bool, wasp_verified: bool) -> bool {
        let update = snapshot.hive_update(wasp_detected, wasp_verified);
        push_hive_update(self.store.as_ref(), &update, &snapshot.activity_point()).await
    }

    /// Maintenance flush: rescore, persist locally, then push remotely.
    ///
    /// Errors when the push fails so the indicator stays off.
    pub async fn flush(&self) -> Result<()> {
        info!("Flushing hive data before maintenance");
        let snapshot = self.rescore();
        self.record(snapshot.health_record(false, false)).await?;

        if !self.upload(&snapshot, false, false).await {
            bail!("Failed to push hive data to the remote store");
        }

        info!("Hive data flushed");
        Ok(())
    }
}
