//! Compile-time configuration for the locker kiosk.
//!
//! Every tunable of the kiosk lives here: pin assignments, sensor thresholds,
//! timing, student ID bounds, and link identity. Runtime configuration structs
//! in the other crates take their `Default` values from these constants, so a
//! firmware build that never loads a config file behaves exactly as described
//! below.
//!
//! # Usage
//!
//! ```
//! use locker_core::constants::*;
//! use std::time::Duration;
//!
//! let auth_timeout = Duration::from_millis(AUTH_TIMEOUT_MS);
//! assert_eq!(auth_timeout.as_secs(), 10);
//!
//! assert!(MIN_STUDENT_ID_LENGTH <= MAX_STUDENT_ID_LENGTH);
//! ```

// ============================================================================
// Pin Assignments
// ============================================================================

/// I2C data pin for the LCD backpack.
pub const PIN_I2C_SDA: u8 = 21;

/// I2C clock pin for the LCD backpack.
pub const PIN_I2C_SCL: u8 = 22;

/// I2C address of the LCD backpack.
pub const LCD_I2C_ADDRESS: u8 = 0x27;

/// Status LED (green).
pub const PIN_LED_GREEN: u8 = 23;

/// Piezo buzzer.
pub const PIN_BUZZER: u8 = 27;

/// Keypad row pins, top to bottom.
pub const PIN_KEYPAD_ROWS: [u8; 4] = [14, 12, 13, 15];

/// Keypad column pins, left to right.
pub const PIN_KEYPAD_COLS: [u8; 4] = [2, 0, 25, 4];

/// Analog input of the box presence sensor.
pub const PIN_IR_SENSOR_BOX: u8 = 34;

/// Analog input of the door presence sensor.
pub const PIN_IR_SENSOR_DOOR: u8 = 35;

/// PWM output driving the latch servo.
pub const PIN_SERVO_LOCK: u8 = 26;

// ============================================================================
// Sensors and Actuators
// ============================================================================

/// Raw ADC reading at or above which the box sensor reports "present".
///
/// The ADC is 12-bit (0-4095). Calibrate per enclosure.
pub const IR_BOX_THRESHOLD: u16 = 2800;

/// Raw ADC reading at or above which the door sensor reports "present".
pub const IR_DOOR_THRESHOLD: u16 = 1300;

/// Largest value the 12-bit ADC can return.
pub const ADC_MAX: u16 = 4095;

/// Servo angle (degrees) holding the latch closed.
pub const DOOR_LOCKED_ANGLE: u8 = 0;

/// Servo angle (degrees) releasing the latch.
pub const DOOR_UNLOCKED_ANGLE: u8 = 90;

/// Largest angle the servo accepts.
pub const SERVO_MAX_ANGLE: u8 = 180;

// ============================================================================
// Timing (milliseconds)
// ============================================================================

/// Time allowed to type the student ID, measured from the first digit.
pub const INPUT_TIMEOUT_MS: u64 = 15_000;

/// Time allowed for the peer to answer a borrow/return command.
pub const AUTH_TIMEOUT_MS: u64 = 10_000;

/// Time allowed for the physical borrow/return once the latch is open.
pub const DOOR_OPEN_TIMEOUT_MS: u64 = 30_000;

/// How long a notice stays on the display before the idle prompt returns.
pub const DISPLAY_MESSAGE_MS: u64 = 3_000;

/// Minimum interval between two presence sensor samples.
///
/// Sampling faster than this lets transient reflections flip the reading.
pub const SENSOR_DEBOUNCE_MS: u64 = 200;

/// Period of the main polling loop.
///
/// Must not exceed [`SENSOR_DEBOUNCE_MS`]; keys are polled every tick while
/// sensors are only sampled once per debounce interval.
pub const LOOP_TICK_MS: u64 = 20;

/// Duration of a short confirmation beep.
pub const SHORT_BEEP_MS: u64 = 80;

/// Duration of a long error beep.
pub const LONG_BEEP_MS: u64 = 600;

// ============================================================================
// Validation
// ============================================================================

/// Minimum number of digits in a student ID.
pub const MIN_STUDENT_ID_LENGTH: usize = 8;

/// Maximum number of digits in a student ID.
pub const MAX_STUDENT_ID_LENGTH: usize = 9;

// ============================================================================
// Display
// ============================================================================

/// Number of columns of the LCD.
pub const LCD_COLUMNS: usize = 16;

/// Number of rows of the LCD.
pub const LCD_ROWS: usize = 2;

// ============================================================================
// Wireless Link
// ============================================================================

/// Name the kiosk advertises on the serial-profile link.
pub const DEVICE_NAME: &str = "SmartLockerTTGO";

/// Line terminator of the link protocol.
pub const LINE_TERMINATOR: u8 = b'\n';

/// Longest line accepted from the peer, terminator excluded.
///
/// Replies are a handful of bytes; anything longer is treated as noise and
/// discarded up to the next terminator.
pub const MAX_LINE_LENGTH: usize = 128;

/// Address the kiosk listens on when running in server role.
pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:7070";

/// Address the kiosk dials when running in client role.
pub const DEFAULT_PEER_ADDR: &str = "127.0.0.1:7071";

/// Timeout for establishing the link in client role.
pub const LINK_CONNECT_TIMEOUT_MS: u64 = 3_000;

// ============================================================================
// Reply Vocabulary
// ============================================================================

/// Replies (after trim + uppercase) that grant a transaction.
pub const DEFAULT_GRANTED_REPLIES: &[&str] = &["OK", "GRANTED", "SUCCESS"];

/// Replies (after trim + uppercase) that deny a transaction.
///
/// Anything that matches neither set is also treated as a denial.
pub const DEFAULT_DENIED_REPLIES: &[&str] = &["DENIED", "DENY", "REJECTED"];
