mod env;

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::{info, warn};

// Re-export section types
pub use crate::alerting::{AlertsConfig, VerificationConfig};
pub use crate::logs::LogsConfig;
pub use crate::maintenance::MaintenanceConfig;
pub use crate::remote::{HiveIdentity, RemoteConfig};
pub use crate::sensor::SensorConfig;
pub use crate::tracking::TrackingConfig;

/// Default config file, relative to the working directory
pub const DEFAULT_CONFIG_PATH: &str = "hivewatch.toml";

/// Complete hivewatch configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HiveConfig {
    #[serde(default)]
    pub hive: HiveIdentity,
    #[serde(default)]
    pub logs: LogsConfig,
    #[serde(default)]
    pub sensor: SensorConfig,
    #[serde(default)]
    pub tracking: TrackingConfig,
    #[serde(default)]
    pub alerts: AlertsConfig,
    #[serde(default)]
    pub verification: VerificationConfig,
    #[serde(default)]
    pub maintenance: MaintenanceConfig,
    #[serde(default)]
    pub remote: RemoteConfig,
}

impl HiveConfig {
    /// Apply `HIVEWATCH_*` overrides on top of the file values
    pub fn apply_env(&mut self) {
        env::apply(self, |key| std::env::var(key).ok());
    }
}

/// Load configuration from a TOML file
pub fn load_config(path: impl AsRef<Path>) -> Result<HiveConfig> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    let config: HiveConfig = toml::from_str(&contents)
        .with_context(|| format!("Failed to parse config {}", path.display()))?;
    Ok(config)
}

/// Load `path` if it exists, defaults otherwise, then apply env overrides
pub fn load_or_default(path: impl AsRef<Path>) -> Result<HiveConfig> {
    let path = path.as_ref();
    let mut config = if path.exists() {
        info!(path = %path.display(), "Loading configuration");
        load_config(path)?
    } else {
        warn!(path = %path.display(), "Config file not found, using defaults");
        HiveConfig::default()
    };
    config.apply_env();
    Ok(config)
}
