//! Hardware device trait definitions.
//!
//! Two layers of traits live here. The device traits ([`KeyInput`],
//! [`AnalogInput`], [`Servo`], [`Indicator`], [`TextDisplay`]) mirror one
//! physical peripheral each and report failures through [`Result`]. The
//! engine-facing traits ([`Latch`], [`Annunciator`]) are side-effecting only:
//! implementations log peripheral faults instead of returning them.
//!
//! Every method is synchronous and returns immediately. The kiosk drives all
//! devices from a single fixed-rate polling loop, so "nothing happened this
//! tick" is always a valid outcome and no call may wait on the hardware.

use std::time::Instant;

use crate::error::Result;
use crate::types::{BeepLength, DeviceInfo, Key};

/// Matrix keypad scanner.
///
/// # Examples
///
/// ```
/// use locker_hardware::mock::MockKeypad;
/// use locker_hardware::{Key, KeyInput};
///
/// let (mut keypad, handle) = MockKeypad::new();
/// assert_eq!(keypad.poll().unwrap(), None);
///
/// handle.press(Key::Hash).unwrap();
/// assert_eq!(keypad.poll().unwrap(), Some(Key::Hash));
/// assert_eq!(keypad.poll().unwrap(), None);
/// ```
pub trait KeyInput: Send {
    /// Prepare the scanner. Called once at startup.
    fn init(&mut self) -> Result<()> {
        Ok(())
    }

    /// Return at most one newly pressed key.
    ///
    /// Held keys are reported once; debouncing is the scanner's concern.
    fn poll(&mut self) -> Result<Option<Key>>;

    /// Describe the device.
    fn info(&self) -> DeviceInfo;
}

/// Single analog input channel (ADC).
pub trait AnalogInput: Send {
    fn init(&mut self) -> Result<()> {
        Ok(())
    }

    /// Take one raw sample, `0..=ADC_MAX`.
    fn read_raw(&mut self) -> Result<u16>;

    fn info(&self) -> DeviceInfo;
}

/// Hobby servo commanded by angle.
pub trait Servo: Send {
    fn init(&mut self) -> Result<()> {
        Ok(())
    }

    /// Command the horn to `angle` degrees. There is no position feedback.
    fn write_angle(&mut self, angle: u8) -> Result<()>;

    fn info(&self) -> DeviceInfo;
}

/// On/off output such as a status LED or an active buzzer.
pub trait Indicator: Send {
    fn init(&mut self) -> Result<()> {
        Ok(())
    }

    fn set(&mut self, on: bool) -> Result<()>;

    fn info(&self) -> DeviceInfo;
}

/// Character display with a fixed number of rows.
pub trait TextDisplay: Send {
    fn init(&mut self) -> Result<()> {
        Ok(())
    }

    /// Render two lines, replacing whatever was shown.
    fn print_lines(&mut self, line1: &str, line2: &str) -> Result<()>;

    fn clear(&mut self) -> Result<()>;

    fn info(&self) -> DeviceInfo;
}

/// Physical lock with two commanded positions.
///
/// The commanded state is trusted; nothing confirms the actual position.
pub trait Latch {
    fn lock(&mut self);
    fn unlock(&mut self);
}

/// User feedback: two display lines, a status light and a buzzer.
pub trait Annunciator {
    /// Replace both display lines.
    fn show(&mut self, line1: &str, line2: &str);

    /// Positive outcome: status light on, short beep.
    fn signal_success(&mut self);

    /// Negative outcome: status light off, long beep.
    fn signal_failure(&mut self);

    fn beep(&mut self, length: BeepLength);

    /// End timed effects (beeps, status light) that are due by `now`.
    ///
    /// Called by the polling loop every tick.
    fn update(&mut self, _now: Instant) {}
}

impl<T: Latch + ?Sized> Latch for &mut T {
    fn lock(&mut self) {
        (**self).lock();
    }

    fn unlock(&mut self) {
        (**self).unlock();
    }
}

impl<T: Annunciator + ?Sized> Annunciator for &mut T {
    fn show(&mut self, line1: &str, line2: &str) {
        (**self).show(line1, line2);
    }

    fn signal_success(&mut self) {
        (**self).signal_success();
    }

    fn signal_failure(&mut self) {
        (**self).signal_failure();
    }

    fn beep(&mut self, length: BeepLength) {
        (**self).beep(length);
    }

    fn update(&mut self, now: Instant) {
        (**self).update(now);
    }
}
