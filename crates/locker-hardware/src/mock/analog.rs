//! Mock ADC channel.

use locker_core::constants::ADC_MAX;
use tokio::sync::watch;

use crate::{HardwareError, Result, traits::AnalogInput, types::DeviceInfo};

/// Analog input whose raw value is set through a [`MockAnalogHandle`].
///
/// Reading fails once every handle has been dropped, which stands in for a
/// disconnected sensor.
#[derive(Debug)]
pub struct MockAnalog {
    raw_rx: watch::Receiver<u16>,
}

impl MockAnalog {
    pub fn new(initial: u16) -> (Self, MockAnalogHandle) {
        let (raw_tx, raw_rx) = watch::channel(initial);
        (Self { raw_rx }, MockAnalogHandle { raw_tx })
    }
}

impl AnalogInput for MockAnalog {
    fn read_raw(&mut self) -> Result<u16> {
        if self.raw_rx.has_changed().is_err() {
            return Err(HardwareError::disconnected("Analog input channel closed"));
        }

        let raw = *self.raw_rx.borrow_and_update();
        if raw > ADC_MAX {
            return Err(HardwareError::invalid_data(format!(
                "ADC reading {raw} above {ADC_MAX}"
            )));
        }
        Ok(raw)
    }

    fn info(&self) -> DeviceInfo {
        DeviceInfo::new("Mock ADC", "Mock ADC 12-bit")
    }
}

/// Sets the raw sample returned by a [`MockAnalog`].
#[derive(Debug)]
pub struct MockAnalogHandle {
    raw_tx: watch::Sender<u16>,
}

impl MockAnalogHandle {
    pub fn set_raw(&self, raw: u16) {
        self.raw_tx.send_replace(raw);
    }

    pub fn raw(&self) -> u16 {
        *self.raw_tx.borrow()
    }
}
