//! Infrared presence sensors.
//!
//! Both locker sensors behave identically and differ only in pin and
//! threshold, so a single [`PresenceSensor`] type is configured per instance
//! through [`PresenceConfig`].

use locker_core::constants::{
    ADC_MAX, IR_BOX_THRESHOLD, IR_DOOR_THRESHOLD, PIN_IR_SENSOR_BOX, PIN_IR_SENSOR_DOOR,
};
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::{HardwareError, Result};
use crate::traits::AnalogInput;
use crate::types::DeviceInfo;

/// Pin and threshold of one presence sensor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresenceConfig {
    pub name: String,
    pub pin: u8,

    /// Raw samples at or above this value mean "object present".
    pub threshold: u16,
}

impl PresenceConfig {
    /// Sensor looking at the stored box.
    pub fn box_sensor() -> Self {
        Self {
            name: "box IR".to_string(),
            pin: PIN_IR_SENSOR_BOX,
            threshold: IR_BOX_THRESHOLD,
        }
    }

    /// Sensor looking at the door.
    pub fn door_sensor() -> Self {
        Self {
            name: "door IR".to_string(),
            pin: PIN_IR_SENSOR_DOOR,
            threshold: IR_DOOR_THRESHOLD,
        }
    }

    /// Reject thresholds the ADC can never reach.
    pub fn validate(&self) -> Result<()> {
        if self.threshold > ADC_MAX {
            return Err(HardwareError::configuration(format!(
                "{} threshold {} above ADC maximum {}",
                self.name, self.threshold, ADC_MAX
            )));
        }
        Ok(())
    }
}

/// Threshold detector over an analog input.
///
/// # Examples
///
/// ```
/// use locker_hardware::mock::MockAnalog;
/// use locker_hardware::{PresenceConfig, PresenceSensor};
///
/// let (adc, handle) = MockAnalog::new(0);
/// let mut sensor = PresenceSensor::new(adc, PresenceConfig::box_sensor());
///
/// assert!(!sensor.read().unwrap());
/// handle.set_raw(3000);
/// assert!(sensor.read().unwrap());
/// ```
#[derive(Debug)]
pub struct PresenceSensor<A> {
    input: A,
    config: PresenceConfig,
}

impl<A: AnalogInput> PresenceSensor<A> {
    pub fn new(input: A, config: PresenceConfig) -> Self {
        Self { input, config }
    }

    /// Validate the configuration and initialize the ADC channel.
    pub fn init(&mut self) -> Result<()> {
        self.config.validate()?;
        self.input.init()
    }

    /// Whether an object is in front of the sensor.
    ///
    /// No smoothing is applied; callers sample at a fixed interval.
    pub fn read(&mut self) -> Result<bool> {
        let raw = self.input.read_raw()?;
        let present = raw >= self.config.threshold;
        trace!(sensor = %self.config.name, raw, present, "Presence sample");
        Ok(present)
    }

    pub fn config(&self) -> &PresenceConfig {
        &self.config
    }

    pub fn info(&self) -> DeviceInfo {
        DeviceInfo::new(self.config.name.clone(), self.input.info().model).with_pin(self.config.pin)
    }
}
