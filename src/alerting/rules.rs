use super::{AlertRecord, Comparison, Measurement, Severity};
use serde::{Deserialize, Serialize};

/// One configured threshold.
///
/// `title` and `description` override the per-measurement templates; both may
/// use the `{value}` and `{threshold}` placeholders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdRule {
    pub measurement: Measurement,
    pub threshold: f64,
    pub comparison: Comparison,
    #[serde(default = "default_severity")]
    pub severity: Severity,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

fn default_severity() -> Severity {
    Severity::Medium
}

impl ThresholdRule {
    pub fn new(
        measurement: Measurement,
        threshold: f64,
        comparison: Comparison,
        severity: Severity,
    ) -> Self {
        Self {
            measurement,
            threshold,
            comparison,
            severity,
            title: None,
            description: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Alert for `value`, or None when the rule does not fire
    pub fn check(&self, value: f64) -> Option<AlertRecord> {
        if !self.comparison.fires(value, self.threshold) {
            return None;
        }

        let title = match &self.title {
            Some(template) => self.render(template, value),
            None => default_title(self.measurement, self.comparison),
        };
        let description = match &self.description {
            Some(template) => self.render(template, value),
            None => default_description(self.measurement, self.comparison, value, self.threshold),
        };

        Some(AlertRecord::new(
            self.measurement.kind(),
            self.severity,
            title,
            description,
        ))
    }

    fn render(&self, template: &str, value: f64) -> String {
        template
            .replace("{value}", &format_number(value))
            .replace("{threshold}", &format_number(self.threshold))
    }
}

/// Ad-hoc check with the default templates and medium severity
pub fn check_threshold(
    measurement: Measurement,
    value: f64,
    threshold: f64,
    comparison: Comparison,
) -> Option<AlertRecord> {
    ThresholdRule::new(measurement, threshold, comparison, Severity::Medium).check(value)
}

fn default_title(measurement: Measurement, comparison: Comparison) -> String {
    match (measurement, comparison) {
        (Measurement::Temperature, Comparison::Greater) => "High Temperature Alert".to_string(),
        (Measurement::Temperature, Comparison::Less) => "Low Temperature Alert".to_string(),
        (Measurement::Activity, _) => "Activity Level Alert".to_string(),
        (Measurement::SwarmLikelihood, _) => "Swarm Risk Alert".to_string(),
        (m, _) => format!("{} Alert", m.kind()),
    }
}

fn default_description(
    measurement: Measurement,
    comparison: Comparison,
    value: f64,
    threshold: f64,
) -> String {
    let verb = match comparison {
        Comparison::Greater => "has exceeded",
        Comparison::Less => "has fallen below",
    };
    format!(
        "The {} {} the safe limit of {}. Current value: {}.",
        measurement.label(),
        verb,
        format_number(threshold),
        format_number(value)
    )
}

/// Whole numbers print without a fractional part
fn format_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{:.1}", value)
    }
}

/// Threshold rules evaluated every alert cycle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertsConfig {
    #[serde(default = "default_rules")]
    pub rules: Vec<ThresholdRule>,
}

fn default_rules() -> Vec<ThresholdRule> {
    vec![
        ThresholdRule::new(
            Measurement::Temperature,
            35.0,
            Comparison::Greater,
            Severity::High,
        ),
        ThresholdRule::new(
            Measurement::Temperature,
            32.0,
            Comparison::Less,
            Severity::Medium,
        ),
        ThresholdRule::new(Measurement::Activity, 30.0, Comparison::Less, Severity::Medium),
        ThresholdRule::new(Measurement::Health, 50.0, Comparison::Less, Severity::High),
        ThresholdRule::new(
            Measurement::SwarmLikelihood,
            70.0,
            Comparison::Greater,
            Severity::High,
        )
        .with_description(
            "High risk of swarming detected! Current swarm likelihood: {value}%",
        ),
    ]
}

impl Default for AlertsConfig {
    fn default() -> Self {
        Self {
            rules: default_rules(),
        }
    }
}

