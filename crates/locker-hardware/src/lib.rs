//! Hardware abstraction layer for the campus locker kiosk.
//!
//! The kiosk board carries a 4x4 matrix keypad, a 16x2 I2C LCD, a status LED,
//! an active buzzer, a servo-driven latch and two analog infrared presence
//! sensors. This crate defines a trait per peripheral plus the small adapters
//! the transaction engine talks to:
//!
//! - [`PresenceSensor`] turns an [`AnalogInput`] into a boolean reading using
//!   a per-instance threshold ([`PresenceConfig`]).
//! - [`ServoLatch`] implements [`Latch`] over a [`Servo`] with fixed locked
//!   and unlocked angles ([`LatchConfig`]).
//! - [`Panel`] implements [`Annunciator`] over two [`Indicator`]s and a
//!   [`TextDisplay`].
//! - [`MatrixKeypad`] implements [`KeyInput`] over a raw [`MatrixScanner`].
//!
//! # Non-blocking I/O
//!
//! All traits are synchronous and must return immediately. The kiosk runs a
//! single cooperative polling loop; a device that has nothing to report
//! returns `Ok(None)` or its last level rather than waiting.
//!
//! # Example
//!
//! ```
//! use locker_hardware::mock::{MockAnalog, MockServo};
//! use locker_hardware::{Latch, LatchConfig, PresenceConfig, PresenceSensor, ServoLatch};
//!
//! let (adc, box_ir) = MockAnalog::new(3500);
//! let mut sensor = PresenceSensor::new(adc, PresenceConfig::box_sensor());
//!
//! let (servo, servo_state) = MockServo::new();
//! let mut latch = ServoLatch::new(servo, LatchConfig::default());
//! latch.init().unwrap();
//!
//! assert!(sensor.read().unwrap());
//! latch.unlock();
//! box_ir.set_raw(200);
//! assert!(!sensor.read().unwrap());
//! latch.lock();
//! assert_eq!(servo_state.angle(), Some(0));
//! ```

pub mod annunciator;
pub mod display;
pub mod error;
pub mod keypad;
pub mod latch;
pub mod mock;
pub mod sensor;
pub mod traits;
pub mod types;

pub use annunciator::Panel;
pub use error::{HardwareError, Result};
pub use keypad::{KEYMAP, MatrixKeypad, MatrixScanner};
pub use latch::{LatchConfig, ServoLatch};
pub use sensor::{PresenceConfig, PresenceSensor};
pub use traits::{AnalogInput, Annunciator, Indicator, KeyInput, Latch, Servo, TextDisplay};
pub use types::{BeepLength, DeviceInfo, Key, LatchPosition};
