use super::{AlertKind, AlertRecord, Measurement, Severity, ThresholdRule, WaspVerifier};
use crate::logs::ActivitySummary;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

/// Values one alert cycle is judged on
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AlertInputs {
    pub temperature: f64,
    pub activity_level: u8,
    pub health_score: u8,
    pub swarm_likelihood: u8,
}

impl AlertInputs {
    fn value(&self, measurement: Measurement) -> f64 {
        match measurement {
            Measurement::Temperature => self.temperature,
            Measurement::Activity => f64::from(self.activity_level),
            Measurement::Health => f64::from(self.health_score),
            Measurement::SwarmLikelihood => f64::from(self.swarm_likelihood),
        }
    }
}

/// Outcome of one alert cycle
#[derive(Debug, Clone, Default)]
pub struct Evaluation {
    pub alerts: Vec<AlertRecord>,
    /// A primary wasp detection was handled this cycle
    pub wasp_detected: bool,
    /// The secondary pass corroborated it
    pub wasp_verified: bool,
}

/// Clears the in-flight flag when a pass ends, including on cancellation
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

pub struct AlertEngine {
    rules: Vec<ThresholdRule>,
    verifier: Arc<dyn WaspVerifier>,
    pending_wasp: AtomicBool,
    verifying: AtomicBool,
    last_primary: Mutex<Option<DateTime<Utc>>>,
}

impl AlertEngine {
    pub fn new(rules: Vec<ThresholdRule>, verifier: Arc<dyn WaspVerifier>) -> Self {
        Self {
            rules,
            verifier,
            pending_wasp: AtomicBool::new(false),
            verifying: AtomicBool::new(false),
            last_primary: Mutex::new(None),
        }
    }

    pub fn rules(&self) -> &[ThresholdRule] {
        &self.rules
    }

    pub fn is_pending(&self) -> bool {
        self.pending_wasp.load(Ordering::SeqCst)
    }

    pub fn is_verifying(&self) -> bool {
        self.verifying.load(Ordering::SeqCst)
    }

    /// Raise the pending flag for a primary detection.
    ///
    /// Each activity record is considered once: a record already seen (same
    /// timestamp) does not re-arm the flag after its alert was emitted.
    pub fn note_primary_detection(&self, activity: &ActivitySummary) -> bool {
        if activity.wasps_detected == 0 {
            return false;
        }

        let mut last = match self.last_primary.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if activity.recorded_at.is_some() && *last == activity.recorded_at {
            return false;
        }
        *last = activity.recorded_at;

        info!(wasps_detected = activity.wasps_detected, "Primary wasp detection pending verification");
        self.pending_wasp.store(true, Ordering::SeqCst);
        true
    }

    /// Threshold alerts for this cycle's values, in rule order
    pub fn check_thresholds(&self, inputs: &AlertInputs) -> Vec<AlertRecord> {
        self.rules
            .iter()
            .filter_map(|rule| rule.check(inputs.value(rule.measurement)))
            .collect()
    }

    /// Run one secondary pass unless one is already in flight.
    ///
    /// Every fault collapses to "unconfirmed".
    pub async fn run_verification(&self) -> bool {
        if self
            .verifying
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            warn!("Verification already in progress, request dropped");
            return false;
        }
        let _in_flight = InFlight(&self.verifying);

        match self.verifier.verify().await {
            Ok(confirmed) => confirmed,
            Err(e) => {
                warn!(error = %e, "Wasp verification failed, treating as unconfirmed");
                false
            }
        }
    }

    /// Full alert cycle: thresholds, then the wasp escalation
    pub async fn evaluate(&self, inputs: &AlertInputs, activity: &ActivitySummary) -> Evaluation {
        let mut evaluation = Evaluation {
            alerts: self.check_thresholds(inputs),
            ..Evaluation::default()
        };

        self.note_primary_detection(activity);
        if !self.is_pending() {
            return evaluation;
        }

        let confirmed = self.run_verification().await;

        evaluation.wasp_detected = true;
        evaluation.wasp_verified = confirmed;
        evaluation.alerts.push(wasp_alert(confirmed));

        // Edge-triggered: the next alert needs a new primary detection
        self.pending_wasp.store(false, Ordering::SeqCst);

        evaluation
    }
}

fn wasp_alert(confirmed: bool) -> AlertRecord {
    if confirmed {
        AlertRecord::new(
            AlertKind::Wasp,
            Severity::High,
            "CRITICAL: Wasp/Hornet Invasion",
            "Wasps or hornets confirmed by multiple cameras! Immediate inspection recommended.",
        )
    } else {
        AlertRecord::new(
            AlertKind::Wasp,
            Severity::Medium,
            "Warning: Possible Wasp Detection",
            "Wasps or hornets may be present. Detection on primary camera only.",
        )
    }
}
