//! Colony health and swarm-risk scores.
//!
//! Both scorers are pure: they take the current readings and return a
//! bounded integer, so they can be re-run from any log record.

mod health;
mod swarm;

pub use health::health_score;
pub use swarm::swarm_likelihood;

use crate::sensor::SensorReading;
use serde::{Deserialize, Serialize};

/// Scores derived every sensor cycle
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivedMetrics {
    /// 0-100
    pub health_score: u8,
    /// 0-100
    pub swarm_likelihood: u8,
}

impl DerivedMetrics {
    /// Score a reading against the latest colony activity level
    pub fn compute(reading: &SensorReading, activity_level: u8, month: u32) -> Self {
        let temperature = reading.temperature as f64;
        Self {
            health_score: health_score(temperature, activity_level, reading.battery),
            swarm_likelihood: swarm_likelihood(
                temperature,
                activity_level,
                reading.raw_swarm_signal,
                month,
            ),
        }
    }
}
