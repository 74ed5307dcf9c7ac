//! Common types shared across hardware device implementations.

use std::time::Duration;

use locker_core::constants::{LONG_BEEP_MS, SHORT_BEEP_MS};
use serde::{Deserialize, Serialize};

use crate::error::{HardwareError, Result};

/// Generic device information.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    /// Device name (e.g., "box IR", "Mock Keypad").
    pub name: String,

    /// Device model identifier.
    pub model: String,

    /// Optional pin or bus address the device is wired to.
    pub pin: Option<u8>,
}

impl DeviceInfo {
    /// Create a new DeviceInfo with required fields.
    pub fn new(name: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            model: model.into(),
            pin: None,
        }
    }

    /// Set the pin.
    pub fn with_pin(mut self, pin: u8) -> Self {
        self.pin = Some(pin);
        self
    }
}

/// A key on the 4x4 matrix keypad.
///
/// ```text
/// 1 2 3 A
/// 4 5 6 B
/// 7 8 9 C
/// * 0 # D
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    /// Numeric digit (0-9).
    Digit(u8),

    /// Star key (*), used as Clear.
    Star,

    /// Hash key (#), used as Enter.
    Hash,

    /// Letter key (A-D).
    Letter(char),
}

impl Key {
    /// Create a digit key.
    ///
    /// # Errors
    ///
    /// Returns an error if the digit is greater than 9.
    ///
    /// # Examples
    ///
    /// ```
    /// use locker_hardware::Key;
    ///
    /// assert_eq!(Key::digit(5).unwrap().as_digit(), Some(5));
    /// assert!(Key::digit(10).is_err());
    /// ```
    pub fn digit(d: u8) -> Result<Self> {
        if d > 9 {
            return Err(HardwareError::invalid_data(format!(
                "Digit must be 0-9, got {}",
                d
            )));
        }
        Ok(Self::Digit(d))
    }

    /// Map a keymap character to a key.
    ///
    /// Letters are accepted in either case.
    ///
    /// # Examples
    ///
    /// ```
    /// use locker_hardware::Key;
    ///
    /// assert_eq!(Key::from_char('7'), Some(Key::Digit(7)));
    /// assert_eq!(Key::from_char('#'), Some(Key::Hash));
    /// assert_eq!(Key::from_char('b'), Some(Key::Letter('B')));
    /// assert_eq!(Key::from_char('x'), None);
    /// ```
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '0'..='9' => c.to_digit(10).map(|d| Self::Digit(d as u8)),
            '*' => Some(Self::Star),
            '#' => Some(Self::Hash),
            'A'..='D' => Some(Self::Letter(c)),
            'a'..='d' => Some(Self::Letter(c.to_ascii_uppercase())),
            _ => None,
        }
    }

    /// Keymap character of this key.
    pub fn as_char(&self) -> char {
        match self {
            Self::Digit(d) => char::from_digit(u32::from(*d), 10).unwrap_or('?'),
            Self::Star => '*',
            Self::Hash => '#',
            Self::Letter(c) => *c,
        }
    }

    /// Check if this is a digit key.
    pub fn is_digit(&self) -> bool {
        matches!(self, Self::Digit(_))
    }

    /// Get the digit value if this is a digit key.
    pub fn as_digit(&self) -> Option<u8> {
        match self {
            Self::Digit(d) => Some(*d),
            _ => None,
        }
    }
}

/// Length of a buzzer beep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BeepLength {
    /// Key click or confirmation.
    Short,

    /// Error or timeout.
    Long,
}

impl BeepLength {
    /// How long the buzzer stays on.
    pub fn duration(&self) -> Duration {
        match self {
            Self::Short => Duration::from_millis(SHORT_BEEP_MS),
            Self::Long => Duration::from_millis(LONG_BEEP_MS),
        }
    }
}

/// Commanded position of the latch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LatchPosition {
    Locked,
    Unlocked,
}
