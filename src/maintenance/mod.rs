//! Maintenance switch watcher.
//!
//! Two states, `Normal` and `Maintenance`. Entering maintenance runs the
//! registered flush hook and only then lights the indicator, so the beekeeper
//! knows the latest data is safe before the hive is opened. When no GPIO is
//! available the handler is inert (degraded) and the binary routes the same
//! transitions from stdin.

mod gpio;

pub use gpio::SysfsPin;

use anyhow::Result;
use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};


/// Maintenance switch and indicator wiring
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaintenanceConfig {
    #[serde(default = "default_switch_pin")]
    pub switch_pin: u32,

    #[serde(default = "default_led_pin")]
    pub led_pin: u32,

    /// Switch sampling interval
    #[serde(default = "default_sample_interval_ms")]
    pub sample_interval_ms: u64,

    /// sysfs GPIO root
    #[serde(default = "default_gpio_root")]
    pub gpio_root: PathBuf,

    /// Accept on/off on stdin when the GPIO subsystem is unavailable
    #[serde(default = "default_manual_control")]
    pub manual_control: bool,
}

fn default_switch_pin() -> u32 {
    24
}

fn default_led_pin() -> u32 {
    27
}

fn default_sample_interval_ms() -> u64 {
    100
}

fn default_gpio_root() -> PathBuf {
    PathBuf::from("/sys/class/gpio")
}

fn default_manual_control() -> bool {
    true
}

impl Default for MaintenanceConfig {
    fn default() -> Self {
        Self {
            switch_pin: default_switch_pin(),
            led_pin: default_led_pin(),
            sample_interval_ms: default_sample_interval_ms(),
            gpio_root: default_gpio_root(),
            manual_control: default_manual_control(),
        }
    }
}

/// Level-read on one pin
pub trait DigitalInput: Send {
    fn read(&mut self) -> Result<bool>;
}

/// Level-write on one pin
pub trait DigitalOutput: Send {
    fn write(&mut self, high: bool) -> Result<()>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaintenanceState {
    #[default]
    Normal,
    Maintenance,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MaintenanceSession {
    pub state: MaintenanceState,
    pub activated_at: Option<DateTime<Utc>>,
}

impl MaintenanceSession {
    pub fn is_active(&self) -> bool {
        self.state == MaintenanceState::Maintenance
    }
}

/// Zero-argument flush run on entry to maintenance.
///
/// Errors and panics are caught by the handler; either one keeps the
/// indicator off.
pub type FlushHook = Arc<dyn Fn() -> BoxFuture<'static, Result<()>> + Send + Sync>;

pub struct MaintenanceHandler {
    session: Mutex<MaintenanceSession>,
    flush: FlushHook,
    indicator: std::sync::Mutex<Option<Box<dyn DigitalOutput>>>,
    input: std::sync::Mutex<Option<Box<dyn DigitalInput>>>,
    degraded: AtomicBool,
}

impl MaintenanceHandler {
    /// Handler over explicit pins. Without an input the handler is degraded.
    pub fn new(
        flush: FlushHook,
        input: Option<Box<dyn DigitalInput>>,
        indicator: Option<Box<dyn DigitalOutput>>,
    ) -> Self {
        let degraded = input.is_none() || indicator.is_none();
        Self {
            session: Mutex::new(MaintenanceSession::default()),
            flush,
            indicator: std::sync::Mutex::new(indicator),
            input: std::sync::Mutex::new(input),
            degraded: AtomicBool::new(degraded),
        }
    }

    /// Claim the configured sysfs pins. Failure degrades the handler instead
    /// of failing start-up.
    pub fn from_config(config: &MaintenanceConfig, flush: FlushHook) -> Self {
        let pins = SysfsPin::output(&config.gpio_root, config.led_pin).and_then(|led| {
            let switch = SysfsPin::input(&config.gpio_root, config.switch_pin)?;
            Ok((switch, led))
        });

        match pins {
            Ok((switch, led)) => {
                info!(
                    switch_pin = config.switch_pin,
                    led_pin = config.led_pin,
                    "Maintenance GPIO initialized"
                );
                Self::new(flush, Some(Box::new(switch)), Some(Box::new(led)))
            }
            Err(e) => {
                warn!(error = %e, "GPIO unavailable, maintenance monitoring disabled");
                Self::new(flush, None, None)
            }
        }
    }

    /// True when the GPIO subsystem could not be claimed
    pub fn is_degraded(&self) -> bool {
        self.degraded.load(Ordering::SeqCst)
    }

    pub async fn session(&self) -> MaintenanceSession {
        *self.session.lock().await
    }

    /// Normal → Maintenance. Returns false when already in maintenance.
    pub async fn activate(&self) -> bool {
        let mut session = self.session.lock().await;
        if session.is_active() {
            debug!("Maintenance already active");
            return false;
        }

        session.state = MaintenanceState::Maintenance;
        session.activated_at = Some(Utc::now());
        info!("Maintenance switch activated, flushing data");

        let outcome = AssertUnwindSafe((self.flush)()).catch_unwind().await;
        match outcome {
            Ok(Ok(())) => {
                self.set_indicator(true);
                info!("Data flushed, safe to proceed with maintenance");
            }
            Ok(Err(e)) => {
                error!(error = %e, "Maintenance flush failed, indicator left off");
                self.set_indicator(false);
            }
            Err(_) => {
                error!("Maintenance flush panicked, indicator left off");
                self.set_indicator(false);
            }
        }

        true
    }

    /// Maintenance → Normal. Returns false when not in maintenance.
    pub async fn deactivate(&self) -> bool {
        let mut session = self.session.lock().await;
        if !session.is_active() {
            return false;
        }

        *session = MaintenanceSession::default();
        self.set_indicator(false);
        info!("Maintenance mode deactivated");
        true
    }

    /// Apply one observed switch level
    pub async fn handle_level(&self, active: bool) -> bool {
        if active {
            self.activate().await
        } else {
            self.deactivate().await
        }
    }

    /// Start sampling the switch; None when degraded.
    ///
    /// The switch is assumed open at start, so a switch already closed enters
    /// maintenance on the first sample.
    pub fn spawn_watcher(self: &Arc<Self>, sample_interval: Duration) -> Option<JoinHandle<()>> {
        let mut input = match self.input.lock() {
            Ok(mut guard) => guard.take()?,
            Err(poisoned) => poisoned.into_inner().take()?,
        };

        let handler = Arc::clone(self);
        Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(sample_interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            let mut last_level = false;

            loop {
                ticker.tick().await;

                match input.read() {
                    Ok(level) => {
                        if level != last_level {
                            debug!(level, "Maintenance switch changed");
                            handler.handle_level(level).await;
                            last_level = level;
                        }
                    }
                    Err(e) => {
                        warn!(error = %e, "Failed to read maintenance switch");
                        tokio::time::sleep(Duration::from_secs(1)).await;
                    }
                }
            }
        }))
    }

    /// Turn the indicator off on shutdown
    pub fn release(&self) {
        self.set_indicator(false);
    }

    fn set_indicator(&self, high: bool) {
        let mut indicator = match self.indicator.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(output) = indicator.as_mut() {
            if let Err(e) = output.write(high) {
                error!(high, error = %e, "Failed to set maintenance indicator");
            }
        }
    }
}
