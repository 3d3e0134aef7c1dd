use crate::logs::ActivityLog;
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info, warn};

/// Environment handed to the secondary pass
pub const ENV_ACTIVITY_LOG: &str = "HIVEWATCH_ACTIVITY_LOG";
pub const ENV_SESSION_SECONDS: &str = "HIVEWATCH_SESSION_SECONDS";
pub const ENV_SINGLE_SESSION: &str = "HIVEWATCH_SINGLE_SESSION";
pub const ENV_CAMERA: &str = "HIVEWATCH_CAMERA";

/// Secondary detection pass settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationConfig {
    /// Program and arguments. Usually a shell pipeline feeding the second
    /// camera's detector output into `colony-tracker`.
    #[serde(default)]
    pub command: Vec<String>,

    #[serde(default = "default_camera")]
    pub camera: String,

    /// Length of the detection session
    #[serde(default = "default_duration")]
    pub duration_seconds: u64,

    /// Extra time allowed for start-up and the final log write
    #[serde(default = "default_grace")]
    pub grace_seconds: u64,
}

fn default_camera() -> String {
    "2".to_string()
}

fn default_duration() -> u64 {
    15
}

fn default_grace() -> u64 {
    10
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self {
            command: Vec::new(),
            camera: default_camera(),
            duration_seconds: default_duration(),
            grace_seconds: default_grace(),
        }
    }
}

impl VerificationConfig {
    /// Hard bound on one pass
    pub fn deadline(&self) -> Duration {
        Duration::from_secs(self.duration_seconds + self.grace_seconds)
    }
}

/// Corroborates a primary wasp detection.
///
/// `Ok(true)` means confirmed; `Ok(false)` or any error means unconfirmed.
#[async_trait]
pub trait WaspVerifier: Send + Sync {
    async fn verify(&self) -> Result<bool>;
}

/// Runs one bounded detection session on the second camera and inspects the
/// wasp counter of its isolated log
pub struct CameraVerifier {
    config: VerificationConfig,
    log: ActivityLog,
}

impl CameraVerifier {
    pub fn new(config: VerificationConfig, log: ActivityLog) -> Self {
        Self { config, log }
    }

    fn command(&self) -> Result<Command> {
        let (program, args) = match self.config.command.split_first() {
            Some(parts) => parts,
            None => bail!("No verification command configured"),
        };

        let mut command = Command::new(program);
        command
            .args(args)
            .env(ENV_ACTIVITY_LOG, self.log.path())
            .env(ENV_SESSION_SECONDS, self.config.duration_seconds.to_string())
            .env(ENV_SINGLE_SESSION, "1")
            .env(ENV_CAMERA, &self.config.camera)
            .stdin(Stdio::null())
            .kill_on_drop(true);
        Ok(command)
    }
}

#[async_trait]
impl WaspVerifier for CameraVerifier {
    async fn verify(&self) -> Result<bool> {
        self.log
            .reset()
            .context("Failed to reset verification log")?;

        let mut child = self
            .command()?
            .spawn()
            .context("Failed to start verification pass")?;

        info!(
            camera = %self.config.camera,
            duration_seconds = self.config.duration_seconds,
            "Started wasp verification pass"
        );

        let waited = tokio::time::timeout(self.config.deadline(), child.wait()).await;
        match waited {
            Ok(status) => {
                let status = status.context("Failed to wait for verification pass")?;
                if !status.success() {
                    bail!("Verification pass exited with {}", status);
                }
            }
            Err(_) => {
                warn!(
                    deadline_seconds = self.config.deadline().as_secs(),
                    "Verification pass timed out"
                );
                if let Err(e) = child.kill().await {
                    debug!(error = %e, "Failed to kill verification pass");
                }
                return Ok(false);
            }
        }

        let wasps = self.log.wasp_total()?;
        info!(wasps_detected = wasps, "Verification pass complete");
        Ok(wasps > 0)
    }
}
