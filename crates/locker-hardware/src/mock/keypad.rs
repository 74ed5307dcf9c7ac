//! Mock keypad implementation for testing and development.
//!
//! This module provides a simulated keypad that can be fed key presses
//! programmatically, without a physical matrix attached.

use crate::{
    HardwareError, Result,
    traits::KeyInput,
    types::{DeviceInfo, Key},
};
use tokio::sync::mpsc::{self, error::TryRecvError};

/// Keys that may be queued before the keypad is polled.
const KEY_QUEUE_CAPACITY: usize = 32;

/// Mock keypad device.
///
/// Key presses queued through a [`MockKeypadHandle`] are returned by
/// [`KeyInput::poll`], one per call, in order.
///
/// # Examples
///
/// ```
/// use locker_hardware::mock::MockKeypad;
/// use locker_hardware::{Key, KeyInput};
///
/// let (mut keypad, handle) = MockKeypad::new();
/// handle.enter_id("12345678").unwrap();
///
/// let mut keys = Vec::new();
/// while let Some(key) = keypad.poll().unwrap() {
///     keys.push(key);
/// }
/// assert_eq!(keys.len(), 9);
/// assert_eq!(keys.last(), Some(&Key::Hash));
/// ```
#[derive(Debug)]
pub struct MockKeypad {
    /// Channel receiver for simulated presses
    key_rx: mpsc::Receiver<Key>,

    name: String,
}

impl MockKeypad {
    /// Create a new mock keypad with the default name.
    pub fn new() -> (Self, MockKeypadHandle) {
        Self::with_name("Mock Keypad".to_string())
    }

    /// Create a new mock keypad with a custom name.
    pub fn with_name(name: String) -> (Self, MockKeypadHandle) {
        let (key_tx, key_rx) = mpsc::channel(KEY_QUEUE_CAPACITY);

        let keypad = Self {
            key_rx,
            name: name.clone(),
        };

        let handle = MockKeypadHandle { key_tx, name };

        (keypad, handle)
    }
}

impl KeyInput for MockKeypad {
    fn poll(&mut self) -> Result<Option<Key>> {
        match self.key_rx.try_recv() {
            Ok(key) => Ok(Some(key)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => {
                Err(HardwareError::disconnected("Keypad input channel closed"))
            }
        }
    }

    fn info(&self) -> DeviceInfo {
        DeviceInfo::new(self.name.clone(), "Mock Keypad v1.0")
    }
}

/// Handle for controlling a mock keypad.
///
/// Cloneable; every clone feeds the same keypad.
#[derive(Debug, Clone)]
pub struct MockKeypadHandle {
    key_tx: mpsc::Sender<Key>,

    name: String,
}

impl MockKeypadHandle {
    /// Queue one key press.
    ///
    /// # Errors
    ///
    /// Returns an error if the keypad has been dropped or the queue is full.
    pub fn press(&self, key: Key) -> Result<()> {
        self.key_tx
            .try_send(key)
            .map_err(|e| HardwareError::disconnected(format!("Keypad input queue: {e}")))
    }

    /// Queue the key printed as `c`.
    ///
    /// # Errors
    ///
    /// Returns an error if `c` is not on the keypad.
    pub fn press_char(&self, c: char) -> Result<()> {
        let key = Key::from_char(c)
            .ok_or_else(|| HardwareError::invalid_data(format!("No key labelled {c:?}")))?;
        self.press(key)
    }

    /// Queue a sequence of digits.
    pub fn send_digits(&self, digits: &[u8]) -> Result<()> {
        for &digit in digits {
            self.press(Key::digit(digit)?)?;
        }
        Ok(())
    }

    /// Queue the characters of `id` followed by `#`.
    pub fn enter_id(&self, id: &str) -> Result<()> {
        for c in id.chars() {
            self.press_char(c)?;
        }
        self.press(Key::Hash)
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_poll_empty() {
        let (mut keypad, _handle) = MockKeypad::new();
        assert_eq!(keypad.poll().unwrap(), None);
        assert_eq!(keypad.poll().unwrap(), None);
    }

    #[test]
    fn test_one_key_per_poll() {
        let (mut keypad, handle) = MockKeypad::new();
        handle.send_digits(&[1, 2]).unwrap();

        assert_eq!(keypad.poll().unwrap(), Some(Key::Digit(1)));
        assert_eq!(keypad.poll().unwrap(), Some(Key::Digit(2)));
        assert_eq!(keypad.poll().unwrap(), None);
    }

    #[test]
    fn test_press_char() {
        let (mut keypad, handle) = MockKeypad::new();
        handle.press_char('*').unwrap();
        assert_eq!(keypad.poll().unwrap(), Some(Key::Star));
        assert!(handle.press_char('x').is_err());
    }

    #[test]
    fn test_enter_id_ends_with_hash() {
        let (mut keypad, handle) = MockKeypad::new();
        handle.enter_id("42").unwrap();

        assert_eq!(keypad.poll().unwrap(), Some(Key::Digit(4)));
        assert_eq!(keypad.poll().unwrap(), Some(Key::Digit(2)));
        assert_eq!(keypad.poll().unwrap(), Some(Key::Hash));
    }

    #[test]
    fn test_handle_clone_feeds_same_keypad() {
        let (mut keypad, handle) = MockKeypad::new();
        let clone = handle.clone();

        handle.press(Key::Letter('A')).unwrap();
        clone.press(Key::Letter('B')).unwrap();

        assert_eq!(keypad.poll().unwrap(), Some(Key::Letter('A')));
        assert_eq!(keypad.poll().unwrap(), Some(Key::Letter('B')));
    }

    #[test]
    fn test_closed_channel() {
        let (mut keypad, handle) = MockKeypad::new();
        drop(handle);
        assert!(keypad.poll().is_err());
    }

    #[test]
    fn test_queue_full() {
        let (_keypad, handle) = MockKeypad::new();
        for _ in 0..KEY_QUEUE_CAPACITY {
            handle.press(Key::Digit(0)).unwrap();
        }
        assert!(handle.press(Key::Digit(0)).is_err());
    }

    #[test]
    fn test_info() {
        let (keypad, handle) = MockKeypad::with_name("Test Keypad".to_string());
        assert_eq!(keypad.info().name, "Test Keypad");
        assert_eq!(handle.name(), "Test Keypad");
    }
}
