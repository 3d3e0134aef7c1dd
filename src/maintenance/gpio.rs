use super::{DigitalInput, DigitalOutput};
use anyhow::{bail, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// One pin under the sysfs GPIO interface (`{root}/gpio{N}/value`)
#[derive(Debug)]
pub struct SysfsPin {
    pin: u32,
    value_path: PathBuf,
}

impl SysfsPin {
    /// Export `pin` as an input
    pub fn input(root: &Path, pin: u32) -> Result<Self> {
        let gpio = Self::export(root, pin, "in")?;
        // Fail now rather than in the sampling loop
        gpio.read_level()?;
        Ok(gpio)
    }

    /// Export `pin` as an output, driven low
    pub fn output(root: &Path, pin: u32) -> Result<Self> {
        let mut gpio = Self::export(root, pin, "out")?;
        gpio.write(false)?;
        Ok(gpio)
    }

    pub fn pin(&self) -> u32 {
        self.pin
    }

    fn export(root: &Path, pin: u32, direction: &str) -> Result<Self> {
        if !root.is_dir() {
            bail!("GPIO root {} not found", root.display());
        }

        let pin_dir = root.join(format!("gpio{}", pin));
        if !pin_dir.exists() {
            fs::write(root.join("export"), pin.to_string())
                .with_context(|| format!("Failed to export GPIO {}", pin))?;
        }

        fs::write(pin_dir.join("direction"), direction)
            .with_context(|| format!("Failed to set GPIO {} direction", pin))?;

        Ok(Self {
            pin,
            value_path: pin_dir.join("value"),
        })
    }

    fn read_level(&self) -> Result<bool> {
        let raw = fs::read_to_string(&self.value_path)
            .with_context(|| format!("Failed to read GPIO {}", self.pin))?;
        match raw.trim() {
            "1" => Ok(true),
            "0" => Ok(false),
            other => bail!("Unexpected GPIO {} value {:?}", self.pin, other),
        }
    }
}

impl DigitalInput for SysfsPin {
    fn read(&mut self) -> Result<bool> {
        self.read_level()
    }
}

impl DigitalOutput for SysfsPin {
    fn write(&mut self, high: bool) -> Result<()> {
        fs::write(&self.value_path, if high { "1" } else { "0" })
            .with_context(|| format!("Failed to write GPIO {}", self.pin))
    }
}
