//! Servo-backed locker latch.

use locker_core::constants::{DOOR_LOCKED_ANGLE, DOOR_UNLOCKED_ANGLE, PIN_SERVO_LOCK, SERVO_MAX_ANGLE};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::error::{HardwareError, Result};
use crate::traits::{Latch, Servo};
use crate::types::{DeviceInfo, LatchPosition};

/// Servo pin and the two commanded angles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LatchConfig {
    pub pin: u8,
    pub locked_angle: u8,
    pub unlocked_angle: u8,
}

impl LatchConfig {
    pub fn validate(&self) -> Result<()> {
        for angle in [self.locked_angle, self.unlocked_angle] {
            if angle > SERVO_MAX_ANGLE {
                return Err(HardwareError::configuration(format!(
                    "servo angle {angle} above {SERVO_MAX_ANGLE}"
                )));
            }
        }
        if self.locked_angle == self.unlocked_angle {
            return Err(HardwareError::configuration(
                "locked and unlocked angles are identical",
            ));
        }
        Ok(())
    }

    fn angle(&self, position: LatchPosition) -> u8 {
        match position {
            LatchPosition::Locked => self.locked_angle,
            LatchPosition::Unlocked => self.unlocked_angle,
        }
    }
}

impl Default for LatchConfig {
    fn default() -> Self {
        Self {
            pin: PIN_SERVO_LOCK,
            locked_angle: DOOR_LOCKED_ANGLE,
            unlocked_angle: DOOR_UNLOCKED_ANGLE,
        }
    }
}

/// [`Latch`] driving a servo between two fixed angles.
///
/// Every `lock()`/`unlock()` call writes the angle again, even when the
/// latch is already in that position.
///
/// # Examples
///
/// ```
/// use locker_hardware::mock::MockServo;
/// use locker_hardware::{Latch, LatchConfig, LatchPosition, ServoLatch};
///
/// let (servo, handle) = MockServo::new();
/// let mut latch = ServoLatch::new(servo, LatchConfig::default());
///
/// latch.unlock();
/// assert_eq!(handle.angle(), Some(90));
/// assert_eq!(latch.position(), Some(LatchPosition::Unlocked));
/// ```
#[derive(Debug)]
pub struct ServoLatch<S> {
    servo: S,
    config: LatchConfig,

    /// Last commanded position, `None` until the first command.
    position: Option<LatchPosition>,
}

impl<S: Servo> ServoLatch<S> {
    pub fn new(servo: S, config: LatchConfig) -> Self {
        Self {
            servo,
            config,
            position: None,
        }
    }

    /// Initialize the servo and drive it to the locked position.
    pub fn init(&mut self) -> Result<()> {
        self.config.validate()?;
        self.servo.init()?;
        self.command(LatchPosition::Locked)
    }

    /// Last commanded position.
    pub fn position(&self) -> Option<LatchPosition> {
        self.position
    }

    pub fn info(&self) -> DeviceInfo {
        DeviceInfo::new("latch", self.servo.info().model).with_pin(self.config.pin)
    }

    fn command(&mut self, position: LatchPosition) -> Result<()> {
        let angle = self.config.angle(position);
        self.servo.write_angle(angle)?;
        self.position = Some(position);
        info!(?position, angle, "Latch commanded");
        Ok(())
    }

    fn command_or_log(&mut self, position: LatchPosition) {
        if let Err(e) = self.command(position) {
            error!(?position, error = %e, "Latch command failed");
        }
    }
}

impl<S: Servo> Latch for ServoLatch<S> {
    fn lock(&mut self) {
        self.command_or_log(LatchPosition::Locked);
    }

    fn unlock(&mut self) {
        self.command_or_log(LatchPosition::Unlocked);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockServo;

    #[test]
    fn test_init_locks() {
        let (servo, handle) = MockServo::new();
        let mut latch = ServoLatch::new(servo, LatchConfig::default());

        latch.init().unwrap();
        assert_eq!(handle.angle(), Some(DOOR_LOCKED_ANGLE));
        assert_eq!(latch.position(), Some(LatchPosition::Locked));
    }

    #[test]
    fn test_lock_unlock_angles() {
        let (servo, handle) = MockServo::new();
        let mut latch = ServoLatch::new(servo, LatchConfig::default());

        latch.unlock();
        assert_eq!(handle.angle(), Some(DOOR_UNLOCKED_ANGLE));
        latch.lock();
        assert_eq!(handle.angle(), Some(DOOR_LOCKED_ANGLE));
    }

    #[test]
    fn test_relock_writes_again() {
        let (servo, handle) = MockServo::new();
        let mut latch = ServoLatch::new(servo, LatchConfig::default());

        latch.lock();
        latch.lock();
        assert_eq!(handle.write_count(), 2);
    }

    #[test]
    fn test_failed_write_keeps_previous_position() {
        let (servo, handle) = MockServo::new();
        let mut latch = ServoLatch::new(servo, LatchConfig::default());

        latch.lock();
        handle.set_fail(true);
        latch.unlock();

        assert_eq!(latch.position(), Some(LatchPosition::Locked));
        assert_eq!(handle.angle(), Some(DOOR_LOCKED_ANGLE));
    }

    #[test]
    fn test_config_validation() {
        assert!(LatchConfig::default().validate().is_ok());

        let too_far = LatchConfig {
            unlocked_angle: 200,
            ..LatchConfig::default()
        };
        assert!(too_far.validate().is_err());

        let same = LatchConfig {
            unlocked_angle: DOOR_LOCKED_ANGLE,
            ..LatchConfig::default()
        };
        assert!(same.validate().is_err());
    }
}
