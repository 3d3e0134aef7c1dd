use super::LogDocument;
use crate::colony::ColonySnapshot;
use crate::scoring::DerivedMetrics;
use crate::sensor::SensorReading;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One vision session
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActivityRecord {
    #[serde(deserialize_with = "lenient_time::deserialize")]
    pub timestamp: DateTime<Utc>,
    pub activity_level: u8,
    pub bee_count: u64,
    pub entering: u64,
    pub leaving: u64,
    pub wasps_detected: u64,
}

impl ActivityRecord {
    pub fn from_snapshot(snapshot: &ColonySnapshot, timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            activity_level: snapshot.activity_level,
            bee_count: snapshot.unique_tracks,
            entering: snapshot.entering,
            leaving: snapshot.leaving,
            wasps_detected: snapshot.wasps,
        }
    }
}

/// `{"activity_records": [...]}`
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ActivityDocument {
    #[serde(default)]
    pub activity_records: Vec<ActivityRecord>,
}

impl LogDocument for ActivityDocument {
    type Record = ActivityRecord;

    fn records(&self) -> &[ActivityRecord] {
        &self.activity_records
    }

    fn push(&mut self, record: ActivityRecord) {
        self.activity_records.push(record);
    }
}

/// What the sensor loop needs from the latest activity record
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ActivitySummary {
    pub activity_level: u8,
    pub wasps_detected: u64,
    pub recorded_at: Option<DateTime<Utc>>,
}

impl From<&ActivityRecord> for ActivitySummary {
    fn from(record: &ActivityRecord) -> Self {
        Self {
            activity_level: record.activity_level.min(100),
            wasps_detected: record.wasps_detected,
            recorded_at: Some(record.timestamp),
        }
    }
}

/// One sensor cycle
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthRecord {
    #[serde(deserialize_with = "lenient_time::deserialize")]
    pub timestamp: DateTime<Utc>,
    pub temperature: u8,
    pub activity_level: u8,
    pub battery: u8,
    pub health_score: u8,
    pub swarm_likelihood: u8,
    pub brood_state: u8,
    pub wasp_detected: bool,
    pub wasp_verified: bool,
}

impl HealthRecord {
    pub fn new(
        timestamp: DateTime<Utc>,
        reading: &SensorReading,
        activity_level: u8,
        metrics: &DerivedMetrics,
        wasp_detected: bool,
        wasp_verified: bool,
    ) -> Self {
        Self {
            timestamp,
            temperature: reading.temperature,
            activity_level,
            battery: reading.battery,
            health_score: metrics.health_score,
            swarm_likelihood: metrics.swarm_likelihood,
            brood_state: reading.brood_state,
            wasp_detected,
            wasp_verified,
        }
    }
}

/// `{"records": [...]}`
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct HealthDocument {
    #[serde(default)]
    pub records: Vec<HealthRecord>,
}

impl LogDocument for HealthDocument {
    type Record = HealthRecord;

    fn records(&self) -> &[HealthRecord] {
        &self.records
    }

    fn push(&mut self, record: HealthRecord) {
        self.records.push(record);
    }
}

/// Record timestamps: RFC 3339, or a naive ISO 8601 stamp (no offset) read as
/// local time. Older vision loops write the naive form.
mod lenient_time {
    use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
    use serde::de::Error;
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| D::Error::custom(format!("invalid timestamp: {raw}")))
    }

    pub(super) fn parse(raw: &str) -> Option<DateTime<Utc>> {
        if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
            return Some(at.with_timezone(&Utc));
        }

        let naive = raw.trim().parse::<NaiveDateTime>().ok()?;
        let at = Local
            .from_local_datetime(&naive)
            .earliest()
            .map(|local| local.with_timezone(&Utc))
            .unwrap_or_else(|| naive.and_utc());
        Some(at)
    }

}
