//! Remote store for hive metrics and alerts.
//!
//! The sensor loop never fails because the store does: every call surfaces a
//! plain success flag (or an optional document id) and logs the cause.

mod http;

pub use http::HttpRemoteStore;

use crate::alerting::AlertRecord;
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};

/// Remote store configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// REST base URL. Without one, updates are only logged.
    #[serde(default)]
    pub base_url: Option<String>,

    /// Bearer token sent with every request
    #[serde(default)]
    pub api_token: Option<String>,

    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

fn default_timeout() -> u64 {
    10
}

/// Hive the loop reports for
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct HiveIdentity {
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub hive_id: String,
}

/// Named numeric fields upserted on the hive document
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct HiveUpdate {
    pub temperature: u8,
    pub activity: u8,
    pub health: u8,
    pub swarm_likelihood: u8,
    pub brood_state: u8,
    pub battery: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wasp_detected: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wasp_verified: Option<bool>,
    pub last_updated: DateTime<Utc>,
}

/// Point appended to the hive's activity time series
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActivityPoint {
    pub day: DateTime<Utc>,
    pub activity: u8,
}

/// Alert document as stored remotely
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AlertDocument {
    pub title: String,
    pub description: String,
    pub severity: String,
    pub read: bool,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "hiveId")]
    pub hive_id: String,
}

impl AlertDocument {
    pub fn from_record(record: &AlertRecord, hive_id: &str) -> Self {
        Self {
            title: record.title.clone(),
            description: record.description.clone(),
            severity: record.severity.as_str().to_string(),
            read: false,
            timestamp: record.created_at,
            hive_id: hive_id.to_string(),
        }
    }
}

/// Persistence for metrics and alerts
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Upsert hive fields, then append `activity` to the time series
    async fn update_hive(&self, update: &HiveUpdate, activity: &ActivityPoint) -> Result<()>;

    /// Create an alert document; returns its id
    async fn create_alert(&self, alert: &AlertDocument) -> Result<String>;
}

/// Store used when no remote endpoint is configured
pub struct LogOnlyStore;

#[async_trait]
impl RemoteStore for LogOnlyStore {
    async fn update_hive(&self, update: &HiveUpdate, activity: &ActivityPoint) -> Result<()> {
        info!(
            temperature = update.temperature,
            activity = activity.activity,
            health = update.health,
            swarm_likelihood = update.swarm_likelihood,
            "No remote store configured, hive update logged only"
        );
        Ok(())
    }

    async fn create_alert(&self, alert: &AlertDocument) -> Result<String> {
        info!(
            title = %alert.title,
            severity = %alert.severity,
            "No remote store configured, alert logged only"
        );
        Ok(uuid::Uuid::now_v7().to_string())
    }
}

/// Build the store described by `config`
pub fn from_config(config: &RemoteConfig, hive: &HiveIdentity) -> Result<Arc<dyn RemoteStore>> {
    match &config.base_url {
        Some(url) if !url.trim().is_empty() => {
            info!(base_url = %url, hive_id = %hive.hive_id, "Using HTTP remote store");
            Ok(Arc::new(HttpRemoteStore::new(config, hive.clone())?))
        }
        _ => {
            info!("Remote store disabled, running in log-only mode");
            Ok(Arc::new(LogOnlyStore))
        }
    }
}

/// Push hive metrics; false on any fault
pub async fn push_hive_update(
    store: &dyn RemoteStore,
    update: &HiveUpdate,
    activity: &ActivityPoint,
) -> bool {
    match store.update_hive(update, activity).await {
        Ok(()) => {
            info!(activity = activity.activity, health = update.health, "Updated remote hive data");
            true
        }
        Err(e) => {
            error!(error = %e, "Failed to update remote hive data");
            false
        }
    }
}

/// Publish an alert; None on any fault
pub async fn push_alert(store: &dyn RemoteStore, record: &AlertRecord, hive_id: &str) -> Option<String> {
    let document = AlertDocument::from_record(record, hive_id);
    match store.create_alert(&document).await {
        Ok(id) => {
            info!(alert_id = %id, title = %record.title, severity = %document.severity, "Alert sent");
            Some(id)
        }
        Err(e) => {
            error!(title = %record.title, error = %e, "Failed to send alert");
            None
        }
    }
}
