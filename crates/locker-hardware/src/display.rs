//! Text formatting for the 16x2 character LCD.
//!
//! The LCD keeps whatever characters were last written to a cell, so every
//! line is padded to the full width to erase stale text. Characters the
//! controller cannot render are removed before padding.

use locker_core::constants::LCD_COLUMNS;

/// Truncate text to a maximum number of characters.
///
/// # Examples
///
/// ```
/// use locker_hardware::display::truncate_text;
///
/// assert_eq!(truncate_text("Enter student ID", 5), "Enter");
/// assert_eq!(truncate_text("OK", 5), "OK");
/// ```
pub fn truncate_text(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

/// Keep only printable ASCII (0x20-0x7E).
pub fn sanitize_text(text: &str) -> String {
    text.chars().filter(|c| matches!(c, ' '..='~')).collect()
}

/// Produce exactly `width` printable characters, left-aligned.
///
/// # Examples
///
/// ```
/// use locker_hardware::display::fit_line;
///
/// assert_eq!(fit_line("Borrow", 8), "Borrow  ");
/// assert_eq!(fit_line("Door relocked\t!", 8), "Door rel");
/// ```
pub fn fit_line(text: &str, width: usize) -> String {
    let text = truncate_text(&sanitize_text(text), width);
    format!("{text:<width$}")
}

/// [`fit_line`] at the LCD's column count.
pub fn lcd_line(text: &str) -> String {
    fit_line(text, LCD_COLUMNS)
}
