//! Vision-and-classification loop.
//!
//! Reads detector/tracker output as JSON lines, classifies each track and
//! folds the decisions into colony counters. Every session (a fixed window of
//! wall-clock time) ends with one record appended to the activity log, which
//! is the only thing the sensor loop ever sees of this process.
//!
//! ```text
//! detector | colony-tracker  ──►  activity_log.json  ──►  hivewatch
//! ```

pub mod frames;
pub mod session;

pub use frames::{parse_frame, Detection, Frame, FrameError};
pub use session::{run_sessions, ColonyTracker, TrackerConfig};

#[cfg(test)]
mod tests;
