//! Mock character display backed by a [`VirtualLcd`].
//!
//! Every operation is applied to a private screen and then published on a
//! watch channel, so handles always observe a complete frame.

use crate::{Result, lcd::VirtualLcd, traits::DisplayDevice};
use tokio::sync::watch;

/// Mock 16x2 display.
///
/// # Examples
///
/// ```
/// use doorlock_hardware::mock::MockDisplay;
/// use doorlock_hardware::traits::DisplayDevice;
///
/// #[tokio::main]
/// async fn main() -> doorlock_hardware::Result<()> {
///     let (mut display, handle) = MockDisplay::new();
///
///     display.print("Please wait...").await?;
///     assert_eq!(handle.line(0).trim_end(), "Please wait...");
///
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct MockDisplay {
    lcd: VirtualLcd,
    screen_tx: watch::Sender<VirtualLcd>,
}

impl MockDisplay {
    /// Create a blank 16x2 display and its observer handle.
    pub fn new() -> (Self, MockDisplayHandle) {
        Self::with_lcd(VirtualLcd::default())
    }

    /// Create a display around an existing screen, e.g. a different size.
    pub fn with_lcd(lcd: VirtualLcd) -> (Self, MockDisplayHandle) {
        let (screen_tx, screen_rx) = watch::channel(lcd.clone());
        (Self { lcd, screen_tx }, MockDisplayHandle { screen_rx })
    }

    fn publish(&self) {
        self.screen_tx.send_replace(self.lcd.clone());
    }
}

impl Default for MockDisplay {
    fn default() -> Self {
        Self::new().0
    }
}

impl DisplayDevice for MockDisplay {
    async fn clear(&mut self) -> Result<()> {
        self.lcd.clear();
        self.publish();
        Ok(())
    }

    async fn print(&mut self, text: &str) -> Result<()> {
        self.lcd.print(text);
        self.publish();
        Ok(())
    }

    async fn set_cursor(&mut self, col: u8, row: u8) -> Result<()> {
        self.lcd.set_cursor(usize::from(col), usize::from(row))?;
        self.publish();
        Ok(())
    }

    async fn write_char(&mut self, c: char) -> Result<()> {
        self.lcd.write_char(c);
        self.publish();
        Ok(())
    }
}

/// Read side of a [`MockDisplay`].
#[derive(Debug, Clone)]
pub struct MockDisplayHandle {
    screen_rx: watch::Receiver<VirtualLcd>,
}

impl MockDisplayHandle {
    /// Copy of the current screen.
    pub fn snapshot(&self) -> VirtualLcd {
        self.screen_rx.borrow().clone()
    }

    /// Contents of a row, padded to the full width. Empty if the row does
    /// not exist.
    pub fn line(&self, row: usize) -> String {
        self.screen_rx.borrow().line(row).unwrap_or_default()
    }

    /// Every string printed so far, oldest first.
    pub fn printed(&self) -> Vec<String> {
        self.screen_rx
            .borrow()
            .printed()
            .map(str::to_string)
            .collect()
    }

    /// The most recent printed string.
    pub fn last_printed(&self) -> Option<String> {
        self.screen_rx.borrow().last_printed().map(str::to_string)
    }

    /// Current cursor as `(col, row)`.
    pub fn cursor(&self) -> (usize, usize) {
        self.screen_rx.borrow().cursor()
    }

    /// Wait until the screen changes.
    ///
    /// # Errors
    ///
    /// Returns an error if the display has been dropped.
    pub async fn changed(&mut self) -> Result<()> {
        self.screen_rx
            .changed()
            .await
            .map_err(|_| crate::HardwareError::disconnected("Display dropped"))
    }
}
