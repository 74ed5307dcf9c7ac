//! Mock character display.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use locker_core::constants::LCD_I2C_ADDRESS;
use tokio::sync::watch;

use crate::{HardwareError, Result, traits::TextDisplay, types::DeviceInfo};

/// Display that keeps the last two lines written to it.
#[derive(Debug)]
pub struct MockDisplay {
    lines_tx: watch::Sender<[String; 2]>,
    writes: Arc<AtomicUsize>,
    clears: Arc<AtomicUsize>,

    /// Simulates an LCD missing from the I2C bus.
    present: bool,
}

impl MockDisplay {
    pub fn new() -> (Self, MockDisplayHandle) {
        Self::build(true)
    }

    /// A display whose initialization fails.
    pub fn unplugged() -> (Self, MockDisplayHandle) {
        Self::build(false)
    }

    fn build(present: bool) -> (Self, MockDisplayHandle) {
        let (lines_tx, lines_rx) = watch::channel([String::new(), String::new()]);
        let writes = Arc::new(AtomicUsize::new(0));
        let clears = Arc::new(AtomicUsize::new(0));

        let display = Self {
            lines_tx,
            writes: Arc::clone(&writes),
            clears: Arc::clone(&clears),
            present,
        };
        let handle = MockDisplayHandle {
            lines_rx,
            writes,
            clears,
        };
        (display, handle)
    }
}

impl TextDisplay for MockDisplay {
    fn init(&mut self) -> Result<()> {
        if !self.present {
            return Err(HardwareError::initialization_failed(format!(
                "LCD not found at {LCD_I2C_ADDRESS:#04x}"
            )));
        }
        Ok(())
    }

    fn print_lines(&mut self, line1: &str, line2: &str) -> Result<()> {
        self.lines_tx.send_replace([line1.to_string(), line2.to_string()]);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        self.lines_tx.send_replace([String::new(), String::new()]);
        self.clears.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn info(&self) -> DeviceInfo {
        DeviceInfo::new("Mock LCD", "Mock LCD 16x2").with_pin(LCD_I2C_ADDRESS)
    }
}

/// Read side of a [`MockDisplay`].
#[derive(Debug, Clone)]
pub struct MockDisplayHandle {
    lines_rx: watch::Receiver<[String; 2]>,
    writes: Arc<AtomicUsize>,
    clears: Arc<AtomicUsize>,
}

impl MockDisplayHandle {
    /// Lines as last written.
    pub fn lines(&self) -> [String; 2] {
        self.lines_rx.borrow().clone()
    }

    /// Whether the display changed since the last call.
    pub fn changed(&mut self) -> bool {
        if !self.lines_rx.has_changed().unwrap_or(false) {
            return false;
        }
        self.lines_rx.mark_unchanged();
        true
    }

    /// Wait for the next write or clear and return the new lines.
    ///
    /// Returns `None` once the display has been dropped.
    pub async fn next_lines(&mut self) -> Option<[String; 2]> {
        self.lines_rx.changed().await.ok()?;
        Some(self.lines_rx.borrow_and_update().clone())
    }

    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn clear_count(&self) -> usize {
        self.clears.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_print_and_clear() {
        let (mut display, handle) = MockDisplay::new();
        display.init().unwrap();

        display.print_lines("Enter ID:", "1234").unwrap();
        assert_eq!(handle.lines(), ["Enter ID:".to_string(), "1234".to_string()]);

        display.clear().unwrap();
        assert_eq!(handle.lines(), [String::new(), String::new()]);
        assert_eq!(handle.write_count(), 1);
        assert_eq!(handle.clear_count(), 1);
    }

    #[test]
    fn test_changed_tracks_writes() {
        let (mut display, mut handle) = MockDisplay::new();
        assert!(!handle.changed());

        display.print_lines("a", "b").unwrap();
        assert!(handle.changed());
        assert!(!handle.changed());
    }

    #[tokio::test]
    async fn test_next_lines_waits_for_write() {
        let (mut display, mut handle) = MockDisplay::new();
        display.print_lines("Door unlocked", "Take the box").unwrap();

        let lines = handle.next_lines().await.unwrap();
        assert_eq!(lines[1], "Take the box");

        drop(display);
        assert_eq!(handle.next_lines().await, None);
    }

    #[test]
    fn test_unplugged_fails_init() {
        let (mut display, _handle) = MockDisplay::unplugged();
        assert!(matches!(
            display.init(),
            Err(HardwareError::InitializationFailed { .. })
        ));
    }
}
