// Per-track trajectory buffers and behaviour classification

mod classifier;
mod config;
mod track;

pub use classifier::{TrackClassifier, TrackUpdate};
pub use config::TrackingConfig;
pub use track::{Direction, Point, Track};
