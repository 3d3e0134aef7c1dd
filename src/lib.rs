// Per-track trajectory buffers and one-shot classification
pub mod tracking;

// Colony-wide counters and activity level
pub mod colony;

// Health and swarm-risk scoring
pub mod scoring;

// Append-only JSON logs shared between the loops
pub mod logs;

// Microcontroller link and reading decoding
pub mod sensor;

// Remote store client
pub mod remote;

// Threshold alerts and wasp verification
pub mod alerting;

// Maintenance switch watcher
pub mod maintenance;

// Sensor-and-alerting loop
pub mod monitor;

// Configuration
pub mod config;

pub use alerting::{AlertEngine, AlertKind, AlertRecord, Comparison, Severity};
pub use colony::{activity_level, ColonySnapshot, ColonyStats};
pub use config::HiveConfig;
pub use scoring::DerivedMetrics;
pub use sensor::SensorReading;
pub use tracking::{Direction, TrackClassifier};
