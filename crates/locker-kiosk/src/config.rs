//! Kiosk configuration file.
//!
//! Everything is optional: a missing file, or a missing field in a file,
//! falls back to the compile-time defaults in [`locker_core::constants`].

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use locker_core::constants::{LOOP_TICK_MS, SENSOR_DEBOUNCE_MS};
use locker_engine::EngineConfig;
use locker_hardware::{LatchConfig, PresenceConfig};
use locker_network::{LinkConfig, LinkRole};
use serde::{Deserialize, Serialize};

use crate::cli::LinkMode;

/// Complete runtime configuration of the kiosk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KioskConfig {
    /// Period of the polling loop.
    pub tick_ms: u64,

    /// Interval between presence sensor samples.
    pub sensor_interval_ms: u64,

    pub engine: EngineConfig,
    pub link: LinkConfig,
    pub box_sensor: PresenceConfig,
    pub door_sensor: PresenceConfig,
    pub latch: LatchConfig,
}

impl Default for KioskConfig {
    fn default() -> Self {
        Self {
            tick_ms: LOOP_TICK_MS,
            sensor_interval_ms: SENSOR_DEBOUNCE_MS,
            engine: EngineConfig::default(),
            link: LinkConfig::default(),
            box_sensor: PresenceConfig::box_sensor(),
            door_sensor: PresenceConfig::door_sensor(),
            latch: LatchConfig::default(),
        }
    }
}

impl KioskConfig {
    /// Load `path`, or the defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config: Self = serde_json::from_str(&text)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        Ok(config)
    }

    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }

    pub fn sensor_interval(&self) -> Duration {
        Duration::from_millis(self.sensor_interval_ms)
    }

    /// Apply `--mode` / `--addr` from the command line.
    ///
    /// Switching role without an address keeps the current address.
    pub fn override_link(&mut self, mode: Option<LinkMode>, addr: Option<String>) {
        let current = &self.link.role;
        let addr = addr.unwrap_or_else(|| current.address().to_string());
        let mode = mode.unwrap_or(if current.is_server() {
            LinkMode::Server
        } else {
            LinkMode::Client
        });

        self.link.role = match mode {
            LinkMode::Server => LinkRole::Server { bind: addr },
            LinkMode::Client => LinkRole::Client { peer: addr },
        };
    }

    pub fn validate(&self) -> Result<()> {
        if self.tick_ms == 0 {
            bail!("tick_ms must be greater than 0");
        }
        if self.sensor_interval_ms < self.tick_ms {
            bail!(
                "sensor_interval_ms ({}) must not be shorter than tick_ms ({})",
                self.sensor_interval_ms,
                self.tick_ms
            );
        }
        if self.sensor_interval_ms < SENSOR_DEBOUNCE_MS {
            bail!(
                "sensor_interval_ms ({}) below the {}ms debounce interval",
                self.sensor_interval_ms,
                SENSOR_DEBOUNCE_MS
            );
        }
        if self.link.role.address().is_empty() {
            bail!("link address must not be empty");
        }

        self.engine.validate().context("invalid engine configuration")?;
        self.box_sensor.validate().context("invalid box sensor")?;
        self.door_sensor.validate().context("invalid door sensor")?;
        self.latch.validate().context("invalid latch")?;
        Ok(())
    }
}
