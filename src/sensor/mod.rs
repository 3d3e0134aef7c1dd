// Microcontroller link: 4 raw bytes per poll, decoded into hive readings

mod link;

pub use link::{McuLink, SimulatedLink, SpidevLink};

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, warn};

/// Sensor loop configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SensorConfig {
    /// Seconds between microcontroller polls
    #[serde(default = "default_poll_interval")]
    pub poll_interval_seconds: u64,

    /// Minimum seconds between remote uploads and alert checks
    #[serde(default = "default_upload_interval")]
    pub upload_interval_seconds: u64,

    /// Delay before retrying after a failed cycle
    #[serde(default = "default_error_backoff")]
    pub error_backoff_seconds: u64,

    /// spidev device node
    #[serde(default = "default_device")]
    pub device: PathBuf,

    /// Substitute simulated readings instead of zeros when the link fails
    #[serde(default = "default_simulate_on_failure")]
    pub simulate_on_failure: bool,
}

fn default_poll_interval() -> u64 {
    60
}

fn default_upload_interval() -> u64 {
    60
}

fn default_error_backoff() -> u64 {
    5
}

fn default_device() -> PathBuf {
    PathBuf::from("/dev/spidev0.0")
}

fn default_simulate_on_failure() -> bool {
    true
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            poll_interval_seconds: default_poll_interval(),
            upload_interval_seconds: default_upload_interval(),
            error_backoff_seconds: default_error_backoff(),
            device: default_device(),
            simulate_on_failure: default_simulate_on_failure(),
        }
    }
}

/// Decoded microcontroller frame
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensorReading {
    /// °C
    pub temperature: u8,
    /// %
    pub battery: u8,
    /// Raw swarm signal, 0-255
    pub raw_swarm_signal: u8,
    /// Brood state ordinal
    pub brood_state: u8,
}

impl SensorReading {
    /// Decode the wire frame.
    ///
    /// Byte 0 carries temperature in half degrees, byte 1 battery on a 0-255
    /// scale; bytes 2 and 3 pass through.
    pub fn decode(frame: [u8; 4]) -> Self {
        let [temp, battery, swarm, brood] = frame;
        Self {
            temperature: (f64::from(temp) / 2.0).round() as u8,
            battery: (f64::from(battery) / 255.0 * 100.0).round() as u8,
            raw_swarm_signal: swarm,
            brood_state: brood,
        }
    }
}

/// Polls the link, substituting a safe reading when it fails
pub struct SensorSource {
    link: Option<Box<dyn McuLink>>,
    simulate_on_failure: bool,
    simulator: SimulatedLink,
}

impl SensorSource {
    /// Open the configured spidev device; a missing device leaves the
    /// source running on fallback readings.
    pub fn open(config: &SensorConfig) -> Self {
        let link: Option<Box<dyn McuLink>> = match SpidevLink::open(&config.device) {
            Ok(link) => Some(Box::new(link)),
            Err(e) => {
                warn!(
                    device = %config.device.display(),
                    error = %e,
                    simulate = config.simulate_on_failure,
                    "Microcontroller link unavailable, using fallback readings"
                );
                None
            }
        };

        Self {
            link,
            simulate_on_failure: config.simulate_on_failure,
            simulator: SimulatedLink,
        }
    }

    pub fn with_link(link: Box<dyn McuLink>, simulate_on_failure: bool) -> Self {
        Self {
            link: Some(link),
            simulate_on_failure,
            simulator: SimulatedLink,
        }
    }

    /// Read one frame; never fails
    pub fn poll(&mut self) -> SensorReading {
        if let Some(link) = self.link.as_mut() {
            match link.read_frame() {
                Ok(frame) => {
                    debug!(link = link.name(), frame = ?frame, "Read microcontroller frame");
                    return SensorReading::decode(frame);
                }
                Err(e) => {
                    warn!(link = link.name(), error = %e, "Microcontroller read failed");
                }
            }
        }

        if self.simulate_on_failure {
            match self.simulator.read_frame() {
                Ok(frame) => {
                    warn!("Using simulated sensor data");
                    return SensorReading::decode(frame);
                }
                Err(e) => warn!(error = %e, "Simulated read failed"),
            }
        }

        SensorReading::default()
    }
}
