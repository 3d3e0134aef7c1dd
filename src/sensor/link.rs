use anyhow::{Context, Result};
use rand::Rng;
use std::fs::{File, OpenOptions};
use std::io::Read;
use std::path::{Path, PathBuf};

/// Transport that yields one 4-byte frame per poll
pub trait McuLink: Send {
    /// Short identifier used in logs
    fn name(&self) -> &str;

    fn read_frame(&mut self) -> Result<[u8; 4]>;
}

/// Linux spidev device node.
///
/// A plain `read` clocks out idle bytes while receiving, which is all the
/// microcontroller protocol needs.
pub struct SpidevLink {
    path: PathBuf,
    device: File,
}

impl SpidevLink {
    pub fn open(path: &Path) -> Result<Self> {
        let device = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .with_context(|| format!("Failed to open SPI device {}", path.display()))?;

        Ok(Self {
            path: path.to_path_buf(),
            device,
        })
    }
}

impl McuLink for SpidevLink {
    fn name(&self) -> &str {
        "spidev"
    }

    fn read_frame(&mut self) -> Result<[u8; 4]> {
        let mut frame = [0u8; 4];
        self.device
            .read_exact(&mut frame)
            .with_context(|| format!("Failed to read frame from {}", self.path.display()))?;
        Ok(frame)
    }
}

/// Plausible readings for bench testing without hardware
pub struct SimulatedLink;

impl McuLink for SimulatedLink {
    fn name(&self) -> &str {
        "simulated"
    }

    fn read_frame(&mut self) -> Result<[u8; 4]> {
        let mut rng = rand::thread_rng();

        // Temperature travels in half degrees
        let temperature = rng.gen_range(64..=72u8);
        let battery_percent: f64 = f64::from(rng.gen_range(60..=95u8));
        let battery = (battery_percent * 255.0 / 100.0).round() as u8;
        let swarm = rng.gen_range(10..=200u8);
        let brood = rng.gen_range(0..=5u8);

        Ok([temperature, battery, swarm, brood])
    }
}
