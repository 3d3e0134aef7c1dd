//! Threshold alerts and the two-stage wasp escalation.
//!
//! Threshold rules are pure checks over the current cycle's values. Wasp
//! alerts are different: a primary detection in the activity log only marks
//! the engine as pending, and the severity of the eventual alert depends on
//! whether an isolated secondary pass on another camera corroborates it.

mod engine;
mod rules;
mod verification;

pub use engine::{AlertEngine, AlertInputs, Evaluation};
pub use rules::{check_threshold, AlertsConfig, ThresholdRule};
pub use verification::{
    CameraVerifier, VerificationConfig, WaspVerifier, ENV_ACTIVITY_LOG, ENV_CAMERA,
    ENV_SESSION_SECONDS, ENV_SINGLE_SESSION,
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;


/// What an alert is about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertKind {
    Temperature,
    Activity,
    Health,
    Swarm,
    Wasp,
}

impl fmt::Display for AlertKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AlertKind::Temperature => "Temperature",
            AlertKind::Activity => "Activity",
            AlertKind::Health => "Health",
            AlertKind::Swarm => "Swarm",
            AlertKind::Wasp => "Wasp",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Comparison {
    /// Fires when value > threshold
    Greater,
    /// Fires when value < threshold
    Less,
}

impl Comparison {
    pub fn fires(&self, value: f64, threshold: f64) -> bool {
        match self {
            Comparison::Greater => value > threshold,
            Comparison::Less => value < threshold,
        }
    }
}

/// Per-cycle value a threshold rule can watch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Measurement {
    Temperature,
    Activity,
    Health,
    SwarmLikelihood,
}

impl Measurement {
    pub fn kind(&self) -> AlertKind {
        match self {
            Measurement::Temperature => AlertKind::Temperature,
            Measurement::Activity => AlertKind::Activity,
            Measurement::Health => AlertKind::Health,
            Measurement::SwarmLikelihood => AlertKind::Swarm,
        }
    }

    /// Name used in alert descriptions
    pub fn label(&self) -> &'static str {
        match self {
            Measurement::Temperature => "temperature",
            Measurement::Activity => "activity level",
            Measurement::Health => "health score",
            Measurement::SwarmLikelihood => "swarm likelihood",
        }
    }
}

/// Alert handed to the remote store. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertRecord {
    pub id: Uuid,
    pub kind: AlertKind,
    pub severity: Severity,
    pub title: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

impl AlertRecord {
    pub fn new(
        kind: AlertKind,
        severity: Severity,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            kind,
            severity,
            title: title.into(),
            description: description.into(),
            created_at: Utc::now(),
        }
    }
}
