//! Append-only JSON logs.
//!
//! The vision loop and the sensor loop share no memory; they communicate only
//! through these files. Each append reads the whole document, pushes one
//! record and writes the whole document back (atomically, via a temp file and
//! rename). One writer per file is expected; callers serialize their own
//! appends.

mod records;

pub use records::{
    ActivityDocument, ActivityRecord, ActivitySummary, HealthDocument, HealthRecord,
};

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::Write;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

#[cfg(test)]
mod tests;

/// Log file locations
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LogsConfig {
    #[serde(default = "default_activity_path")]
    pub activity_path: PathBuf,
    #[serde(default = "default_health_path")]
    pub health_path: PathBuf,
    #[serde(default = "default_verification_path")]
    pub verification_path: PathBuf,
}

fn default_activity_path() -> PathBuf {
    PathBuf::from("activity_log.json")
}

fn default_health_path() -> PathBuf {
    PathBuf::from("health_log.json")
}

fn default_verification_path() -> PathBuf {
    PathBuf::from("verification_log.json")
}

impl Default for LogsConfig {
    fn default() -> Self {
        Self {
            activity_path: default_activity_path(),
            health_path: default_health_path(),
            verification_path: default_verification_path(),
        }
    }
}

/// Top-level JSON document holding one record array
pub trait LogDocument: Default + Serialize + DeserializeOwned {
    type Record;

    fn records(&self) -> &[Self::Record];

    fn push(&mut self, record: Self::Record);
}

/// Handle to one append-only log file
#[derive(Clone, Debug)]
pub struct JsonLog<D> {
    path: PathBuf,
    _document: PhantomData<D>,
}

/// Colony snapshots written by the vision loop (and by a verification pass)
pub type ActivityLog = JsonLog<ActivityDocument>;

/// Sensor readings and derived scores written by the sensor loop
pub type HealthLog = JsonLog<HealthDocument>;

impl<D: LogDocument> JsonLog<D> {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            _document: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create an empty document (and parent directories) if the file is missing
    pub fn ensure_exists(&self) -> Result<()> {
        if self.path.exists() {
            return Ok(());
        }
        self.write(&D::default())?;
        debug!(path = %self.path.display(), "Created log file");
        Ok(())
    }

    /// Load the document. A missing file is an empty log; a malformed one is an error.
    pub fn load(&self) -> Result<D> {
        if !self.path.exists() {
            return Ok(D::default());
        }

        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read log {}", self.path.display()))?;

        if contents.trim().is_empty() {
            return Ok(D::default());
        }

        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse log {}", self.path.display()))
    }

    /// Load the document, treating any fault as an empty log
    pub fn load_or_default(&self) -> D {
        match self.load() {
            Ok(document) => document,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Unreadable log, using empty record set");
                D::default()
            }
        }
    }

    /// Append one record; returns the record count after the write.
    ///
    /// An unreadable existing document is replaced by a fresh one.
    pub fn append(&self, record: D::Record) -> Result<usize> {
        let mut document = self.load_or_default();
        document.push(record);
        self.write(&document)?;
        Ok(document.records().len())
    }

    /// Replace the file with an empty document
    pub fn reset(&self) -> Result<()> {
        self.write(&D::default())
    }

    /// Atomic write: temp file, fsync, rename
    fn write(&self, document: &D) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create log directory {}", parent.display()))?;
            }
        }

        let json = serde_json::to_string_pretty(document).context("Failed to serialize log")?;
        let tmp_path = self.path.with_extension("tmp");

        {
            let mut file = File::create(&tmp_path).context("Failed to create temporary log file")?;
            file.write_all(json.as_bytes())
                .context("Failed to write log data")?;
            file.sync_all().context("Failed to sync log file to disk")?;
        }

        fs::rename(&tmp_path, &self.path)
            .with_context(|| format!("Failed to replace log {}", self.path.display()))?;

        Ok(())
    }
}

impl JsonLog<ActivityDocument> {
    /// Latest colony activity; a missing, empty or malformed log yields the
    /// neutral default.
    pub fn latest_activity(&self) -> ActivitySummary {
        let document = match self.load() {
            Ok(document) => document,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Error reading activity data");
                return ActivitySummary::default();
            }
        };

        document
            .activity_records
            .last()
            .map(ActivitySummary::from)
            .unwrap_or_default()
    }

    /// Total wasps across every record. Strict: a malformed log is an error.
    pub fn wasp_total(&self) -> Result<u64> {
        let document = self.load()?;
        Ok(document
            .activity_records
            .iter()
            .map(|record| record.wasps_detected)
            .fold(0u64, u64::saturating_add))
    }
}
