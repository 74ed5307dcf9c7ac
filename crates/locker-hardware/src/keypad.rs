//! 4x4 matrix keypad.
//!
//! A [`MatrixScanner`] reports which row/column intersection is closed right
//! now; [`MatrixKeypad`] turns those levels into press events through the
//! locker keymap.

use locker_core::constants::{PIN_KEYPAD_COLS, PIN_KEYPAD_ROWS};
use tracing::debug;

use crate::error::{HardwareError, Result};
use crate::traits::KeyInput;
use crate::types::{DeviceInfo, Key};

/// Characters printed on the keypad, row-major.
pub const KEYMAP: [[char; 4]; 4] = [
    ['1', '2', '3', 'A'],
    ['4', '5', '6', 'B'],
    ['7', '8', '9', 'C'],
    ['*', '0', '#', 'D'],
];

/// Consecutive identical scans required before a level change counts.
const DEBOUNCE_SCANS: u8 = 2;

/// Low-level matrix scan.
pub trait MatrixScanner: Send {
    fn init(&mut self) -> Result<()> {
        Ok(())
    }

    /// `(row, col)` of the closed switch, if any.
    fn scan(&mut self) -> Result<Option<(usize, usize)>>;
}

/// Look up the key at a matrix position.
pub fn key_at(row: usize, col: usize) -> Option<Key> {
    KEYMAP
        .get(row)
        .and_then(|r| r.get(col))
        .and_then(|&c| Key::from_char(c))
}

/// Keypad producing one event per physical press.
///
/// A key held down across many polls is reported once. A new reading must
/// be seen on two consecutive scans before it is accepted, which filters
/// contact bounce at the polling rate.
#[derive(Debug)]
pub struct MatrixKeypad<S> {
    scanner: S,

    /// Debounced level.
    stable: Option<(usize, usize)>,

    candidate: Option<(usize, usize)>,
    candidate_scans: u8,
}

impl<S: MatrixScanner> MatrixKeypad<S> {
    pub fn new(scanner: S) -> Self {
        Self {
            scanner,
            stable: None,
            candidate: None,
            candidate_scans: 0,
        }
    }
}

impl<S: MatrixScanner> KeyInput for MatrixKeypad<S> {
    fn init(&mut self) -> Result<()> {
        self.scanner.init()
    }

    fn poll(&mut self) -> Result<Option<Key>> {
        let level = self.scanner.scan()?;

        if level == self.stable {
            self.candidate = None;
            self.candidate_scans = 0;
            return Ok(None);
        }

        if level == self.candidate {
            self.candidate_scans = self.candidate_scans.saturating_add(1);
        } else {
            self.candidate = level;
            self.candidate_scans = 1;
        }

        if self.candidate_scans < DEBOUNCE_SCANS {
            return Ok(None);
        }

        self.stable = level;
        self.candidate = None;
        self.candidate_scans = 0;

        match level {
            Some((row, col)) => {
                let key = key_at(row, col).ok_or_else(|| {
                    HardwareError::invalid_data(format!("no key at row {row} col {col}"))
                })?;
                debug!(key = %key.as_char(), "Key pressed");
                Ok(Some(key))
            }
            None => Ok(None),
        }
    }

    fn info(&self) -> DeviceInfo {
        let model = format!(
            "4x4 matrix rows {:?} cols {:?}",
            PIN_KEYPAD_ROWS, PIN_KEYPAD_COLS
        );
        DeviceInfo::new("keypad", model)
    }
}
