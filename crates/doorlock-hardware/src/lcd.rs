//! Virtual character LCD.
//!
//! A 16x2 character buffer driven the way an HD44780 controller is driven:
//! a cursor, `print` at the cursor, and `clear`. Text that runs past the last
//! column is clipped, it never wraps onto the next row.
//!
//! # Character Encoding - ASCII Only
//!
//! The physical module has no extended character set. Printable ASCII is
//! stored as-is, control characters are dropped, and anything else is shown
//! as `?`.
//!
//! # Examples
//!
//! ```
//! use doorlock_hardware::lcd::VirtualLcd;
//!
//! let mut lcd = VirtualLcd::default();
//! lcd.print("Wrong pin!");
//! lcd.set_cursor(0, 1).unwrap();
//! lcd.write_char('*');
//!
//! assert_eq!(lcd.line(0).unwrap().trim_end(), "Wrong pin!");
//! assert_eq!(lcd.line(1).unwrap().trim_end(), "*");
//! assert_eq!(lcd.cursor(), (1, 1));
//! ```

use std::collections::VecDeque;

use crate::error::{HardwareError, Result};

/// Columns on the door display.
pub const LCD_COLUMNS: usize = 16;

/// Rows on the door display.
pub const LCD_ROWS: usize = 2;

/// Printed messages kept for inspection.
const MAX_PRINTED: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VirtualLcd {
    columns: usize,
    rows: Vec<Vec<char>>,
    cursor: (usize, usize),
    printed: VecDeque<String>,
}

impl Default for VirtualLcd {
    fn default() -> Self {
        Self::new(LCD_COLUMNS, LCD_ROWS)
    }
}

impl VirtualLcd {
    /// Create a blank display.
    ///
    /// # Panics
    ///
    /// Panics in debug builds if either dimension is zero.
    pub fn new(columns: usize, rows: usize) -> Self {
        debug_assert!(columns > 0 && rows > 0, "LCD dimensions must be non-zero");

        Self {
            columns,
            rows: vec![vec![' '; columns]; rows],
            cursor: (0, 0),
            printed: VecDeque::new(),
        }
    }

    /// Blank every cell and move the cursor home.
    pub fn clear(&mut self) {
        for row in &mut self.rows {
            row.fill(' ');
        }
        self.cursor = (0, 0);
    }

    /// Move the cursor.
    ///
    /// # Errors
    ///
    /// Returns an error if the position is off screen.
    pub fn set_cursor(&mut self, col: usize, row: usize) -> Result<()> {
        if col >= self.columns || row >= self.rows.len() {
            return Err(HardwareError::invalid_data(format!(
                "Cursor ({}, {}) outside {}x{} display",
                col,
                row,
                self.columns,
                self.rows.len()
            )));
        }
        self.cursor = (col, row);
        Ok(())
    }

    /// Print text at the cursor, clipping at the end of the row.
    pub fn print(&mut self, text: &str) {
        let text = sanitize_text(text);
        for c in text.chars() {
            self.put(c);
        }
        if self.printed.len() == MAX_PRINTED {
            self.printed.pop_front();
        }
        self.printed.push_back(text);
    }

    /// Write one character at the cursor.
    pub fn write_char(&mut self, c: char) {
        if let Some(c) = sanitize_char(c) {
            self.put(c);
        }
    }

    fn put(&mut self, c: char) {
        let (col, row) = self.cursor;
        if col < self.columns {
            self.rows[row][col] = c;
            self.cursor.0 = col + 1;
        }
    }

    /// Contents of a row, padded to the full width.
    ///
    /// # Errors
    ///
    /// Returns an error if the row does not exist.
    pub fn line(&self, row: usize) -> Result<String> {
        self.rows
            .get(row)
            .map(|cells| cells.iter().collect())
            .ok_or_else(|| HardwareError::invalid_data(format!("No display row {}", row)))
    }

    /// All rows, padded to the full width.
    pub fn lines(&self) -> Vec<String> {
        self.rows.iter().map(|cells| cells.iter().collect()).collect()
    }

    /// Current cursor as `(col, row)`.
    pub fn cursor(&self) -> (usize, usize) {
        self.cursor
    }

    /// Every string printed since creation, oldest first, bounded.
    pub fn printed(&self) -> impl Iterator<Item = &str> {
        self.printed.iter().map(String::as_str)
    }

    /// The most recent printed string.
    pub fn last_printed(&self) -> Option<&str> {
        self.printed.back().map(String::as_str)
    }

    /// Draw the screen inside a frame.
    ///
    /// ```text
    /// +----------------+
    /// |Enter your pin: |
    /// |****            |
    /// +----------------+
    /// ```
    pub fn render(&self) -> String {
        let border = format!("+{}+", "-".repeat(self.columns));
        let mut out = border.clone();
        for line in self.lines() {
            out.push_str(&format!("\n|{}|", line));
        }
        out.push('\n');
        out.push_str(&border);
        out
    }
}

fn sanitize_char(c: char) -> Option<char> {
    if c.is_control() {
        None
    } else if c.is_ascii() {
        Some(c)
    } else {
        Some('?')
    }
}

fn sanitize_text(text: &str) -> String {
    text.chars().filter_map(sanitize_char).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_display_is_blank() {
        let lcd = VirtualLcd::default();
        assert_eq!(lcd.lines(), vec![" ".repeat(16), " ".repeat(16)]);
        assert_eq!(lcd.cursor(), (0, 0));
    }

    #[test]
    fn test_print_advances_cursor() {
        let mut lcd = VirtualLcd::default();
        lcd.print("Scan your card:");
        assert_eq!(lcd.cursor(), (15, 0));
        assert_eq!(lcd.line(0).unwrap(), "Scan your card: ");
    }

    #[test]
    fn test_print_clips_at_row_end() {
        let mut lcd = VirtualLcd::default();
        lcd.print("0123456789ABCDEFGHIJ");
        assert_eq!(lcd.line(0).unwrap(), "0123456789ABCDEF");
        assert_eq!(lcd.line(1).unwrap().trim(), "");
        assert_eq!(lcd.cursor(), (16, 0));
    }

    #[test]
    fn test_clear_homes_cursor() {
        let mut lcd = VirtualLcd::default();
        lcd.print("Welcome Home!");
        lcd.set_cursor(3, 1).unwrap();
        lcd.clear();

        assert_eq!(lcd.cursor(), (0, 0));
        assert!(lcd.lines().iter().all(|l| l.trim().is_empty()));
        assert_eq!(lcd.last_printed(), Some("Welcome Home!"));
    }

    #[test]
    fn test_set_cursor_out_of_bounds() {
        let mut lcd = VirtualLcd::default();
        assert!(lcd.set_cursor(16, 0).is_err());
        assert!(lcd.set_cursor(0, 2).is_err());
        assert!(lcd.set_cursor(15, 1).is_ok());
    }

    #[test]
    fn test_write_char_on_second_row() {
        let mut lcd = VirtualLcd::default();
        lcd.set_cursor(0, 1).unwrap();
        for _ in 0..4 {
            lcd.write_char('*');
        }
        assert_eq!(lcd.line(1).unwrap().trim_end(), "****");
    }

    #[test]
    fn test_control_and_non_ascii_characters() {
        let mut lcd = VirtualLcd::default();
        lcd.print("Ol\u{e1}\n!");
        assert_eq!(lcd.line(0).unwrap().trim_end(), "Ol?!");
    }

    #[test]
    fn test_printed_history_is_bounded() {
        let mut lcd = VirtualLcd::default();
        for i in 0..(MAX_PRINTED + 10) {
            lcd.print(&i.to_string());
        }
        assert_eq!(lcd.printed().count(), MAX_PRINTED);
        assert_eq!(lcd.printed().next(), Some("10"));
    }

    #[test]
    fn test_render_frame() {
        let mut lcd = VirtualLcd::new(4, 1);
        lcd.print("ab");
        assert_eq!(lcd.render(), "+----+\n|ab  |\n+----+");
    }
}
