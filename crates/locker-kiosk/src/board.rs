//! Emulated kiosk board.
//!
//! Builds the peripheral set from mock devices and hands back the control
//! handles the console uses to press keys, move the box in front of the
//! sensors, and watch the LCD.

use locker_core::constants::ADC_MAX;
use locker_hardware::mock::{
    IndicatorState, MockAnalog, MockAnalogHandle, MockDisplay, MockDisplayHandle, MockIndicator,
    MockKeypad, MockKeypadHandle, MockServo, MockServoHandle,
};
use locker_hardware::{KeyInput, Panel, PresenceSensor, ServoLatch};
use tracing::info;

use crate::config::KioskConfig;

/// Margin above the threshold used for a "present" sample.
const PRESENT_MARGIN: u16 = 500;

pub type BoardPanel = Panel<MockIndicator, MockIndicator, MockDisplay>;
pub type BoardSensor = PresenceSensor<MockAnalog>;
pub type BoardLatch = ServoLatch<MockServo>;

/// Every peripheral of the board.
#[derive(Debug)]
pub struct Devices {
    pub keypad: MockKeypad,
    pub box_sensor: BoardSensor,
    pub door_sensor: BoardSensor,
    pub latch: BoardLatch,
    pub panel: BoardPanel,
}

impl Devices {
    /// Build the emulated board. The box starts in its compartment.
    ///
    /// With `display_present` false the LCD fails initialization.
    pub fn emulated(config: &KioskConfig, display_present: bool) -> (Self, BoardControls) {
        let (keypad, keys) = MockKeypad::new();

        let box_threshold = config.box_sensor.threshold;
        let door_threshold = config.door_sensor.threshold;
        let (box_adc, box_ir) = MockAnalog::new(present_sample(box_threshold));
        let (door_adc, door_ir) = MockAnalog::new(0);

        let (servo, servo_state) = MockServo::new();
        let (led, led_state) = MockIndicator::new("status LED");
        let (buzzer, buzzer_state) = MockIndicator::new("buzzer");
        let (display, screen) = if display_present {
            MockDisplay::new()
        } else {
            MockDisplay::unplugged()
        };

        let devices = Self {
            keypad,
            box_sensor: PresenceSensor::new(box_adc, config.box_sensor.clone()),
            door_sensor: PresenceSensor::new(door_adc, config.door_sensor.clone()),
            latch: ServoLatch::new(servo, config.latch.clone()),
            panel: Panel::new(led, buzzer, display),
        };
        let controls = BoardControls {
            keys,
            box_ir,
            door_ir,
            box_threshold,
            door_threshold,
            servo: servo_state,
            led: led_state,
            buzzer: buzzer_state,
            screen,
        };
        (devices, controls)
    }

    /// Initialize every peripheral. The latch is locked first.
    ///
    /// # Errors
    ///
    /// Returns the first initialization failure. The caller must halt.
    pub fn init(&mut self) -> locker_hardware::Result<()> {
        self.latch.init()?;
        self.panel.init()?;
        self.keypad.init()?;
        self.box_sensor.init()?;
        self.door_sensor.init()?;

        for device in [
            self.keypad.info(),
            self.box_sensor.info(),
            self.door_sensor.info(),
            self.latch.info(),
        ]
        .into_iter()
        .chain(self.panel.devices())
        {
            info!(device = %device.name, model = %device.model, pin = ?device.pin, "Initialized");
        }
        Ok(())
    }
}

/// Outside view of the emulated board.
///
/// Dropping it disconnects the emulated sensors and keypad.
#[derive(Debug)]
pub struct BoardControls {
    pub keys: MockKeypadHandle,
    pub box_ir: MockAnalogHandle,
    pub door_ir: MockAnalogHandle,
    box_threshold: u16,
    door_threshold: u16,
    pub servo: MockServoHandle,
    pub led: IndicatorState,
    pub buzzer: IndicatorState,
    pub screen: MockDisplayHandle,
}

impl BoardControls {
    /// Put the box in front of (or away from) the box sensor.
    pub fn set_box(&self, present: bool) {
        self.box_ir.set_raw(sample(present, self.box_threshold));
    }

    /// Put the box in front of (or away from) the door sensor.
    pub fn set_door(&self, present: bool) {
        self.door_ir.set_raw(sample(present, self.door_threshold));
    }

    pub fn box_present(&self) -> bool {
        self.box_ir.raw() >= self.box_threshold
    }

    pub fn door_present(&self) -> bool {
        self.door_ir.raw() >= self.door_threshold
    }
}

fn present_sample(threshold: u16) -> u16 {
    threshold.saturating_add(PRESENT_MARGIN).min(ADC_MAX)
}

fn sample(present: bool, threshold: u16) -> u16 {
    if present { present_sample(threshold) } else { 0 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use locker_core::constants::{DOOR_LOCKED_ANGLE, IR_BOX_THRESHOLD, IR_DOOR_THRESHOLD};
    use rstest::rstest;

    #[test]
    fn test_init_locks_latch() {
        let (mut devices, controls) = Devices::emulated(&KioskConfig::default(), true);
        devices.init().unwrap();

        assert_eq!(controls.servo.angle(), Some(DOOR_LOCKED_ANGLE));
        assert!(!controls.led.is_on());
        assert!(!controls.buzzer.is_on());
    }

    #[test]
    fn test_box_starts_present() {
        let (mut devices, controls) = Devices::emulated(&KioskConfig::default(), true);
        assert!(controls.box_present());
        assert!(!controls.door_present());
        assert!(devices.box_sensor.read().unwrap());
        assert!(!devices.door_sensor.read().unwrap());
    }

    #[test]
    fn test_controls_drive_sensors() {
        let (mut devices, controls) = Devices::emulated(&KioskConfig::default(), true);
        controls.set_box(false);
        controls.set_door(true);

        assert!(!devices.box_sensor.read().unwrap());
        assert!(devices.door_sensor.read().unwrap());
    }

    #[test]
    fn test_unplugged_lcd_fails_init() {
        let (mut devices, controls) = Devices::emulated(&KioskConfig::default(), false);
        assert!(devices.init().is_err());
        // The latch is secured before the display is touched
        assert_eq!(controls.servo.angle(), Some(DOOR_LOCKED_ANGLE));
    }

    #[rstest]
    #[case(IR_BOX_THRESHOLD, IR_BOX_THRESHOLD + PRESENT_MARGIN)]
    #[case(IR_DOOR_THRESHOLD, IR_DOOR_THRESHOLD + PRESENT_MARGIN)]
    #[case(ADC_MAX - 10, ADC_MAX)]
    fn test_present_sample_clears_threshold(#[case] threshold: u16, #[case] expected: u16) {
        assert_eq!(present_sample(threshold), expected);
        assert!(present_sample(threshold) >= threshold);
    }
}
