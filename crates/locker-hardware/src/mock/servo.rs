//! Mock servo.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU16, AtomicUsize, Ordering};

use locker_core::constants::SERVO_MAX_ANGLE;

use crate::{HardwareError, Result, traits::Servo, types::DeviceInfo};

/// Marker for "never commanded".
const NO_ANGLE: u16 = u16::MAX;

#[derive(Debug)]
struct ServoState {
    angle: AtomicU16,
    writes: AtomicUsize,
    fail: AtomicBool,
}

/// Servo that records the last commanded angle.
#[derive(Debug)]
pub struct MockServo {
    state: Arc<ServoState>,
}

impl MockServo {
    pub fn new() -> (Self, MockServoHandle) {
        let state = Arc::new(ServoState {
            angle: AtomicU16::new(NO_ANGLE),
            writes: AtomicUsize::new(0),
            fail: AtomicBool::new(false),
        });
        (
            Self {
                state: Arc::clone(&state),
            },
            MockServoHandle { state },
        )
    }
}

impl Servo for MockServo {
    fn write_angle(&mut self, angle: u8) -> Result<()> {
        if self.state.fail.load(Ordering::SeqCst) {
            return Err(HardwareError::disconnected("Mock servo"));
        }
        if angle > SERVO_MAX_ANGLE {
            return Err(HardwareError::invalid_data(format!(
                "Servo angle {angle} above {SERVO_MAX_ANGLE}"
            )));
        }

        self.state.angle.store(u16::from(angle), Ordering::SeqCst);
        self.state.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn info(&self) -> DeviceInfo {
        DeviceInfo::new("Mock Servo", "Mock Servo SG90")
    }
}

/// Observes and controls a [`MockServo`].
#[derive(Debug, Clone)]
pub struct MockServoHandle {
    state: Arc<ServoState>,
}

impl MockServoHandle {
    /// Last commanded angle.
    pub fn angle(&self) -> Option<u8> {
        match self.state.angle.load(Ordering::SeqCst) {
            NO_ANGLE => None,
            angle => u8::try_from(angle).ok(),
        }
    }

    /// Number of successful writes.
    pub fn write_count(&self) -> usize {
        self.state.writes.load(Ordering::SeqCst)
    }

    /// Make subsequent writes fail.
    pub fn set_fail(&self, fail: bool) {
        self.state.fail.store(fail, Ordering::SeqCst);
    }
}
