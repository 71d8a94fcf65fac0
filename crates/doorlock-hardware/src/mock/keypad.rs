//! Mock keypad implementation for testing and development.
//!
//! Key presses are queued through a [`MockKeypadHandle`] and handed out one
//! per [`poll_key`](KeypadDevice::poll_key) call, the way a scanned matrix
//! keypad reports at most one key per scan.

use crate::{
    Result,
    traits::{Key, KeypadDevice},
};
use tokio::sync::mpsc;

/// Mock keypad device for testing and development.
///
/// # Examples
///
/// ```
/// use doorlock_hardware::mock::MockKeypad;
/// use doorlock_hardware::traits::{Key, KeypadDevice};
///
/// #[tokio::main]
/// async fn main() -> doorlock_hardware::Result<()> {
///     let (mut keypad, handle) = MockKeypad::new();
///
///     assert_eq!(keypad.poll_key().await?, None);
///
///     handle.type_str("12#")?;
///     assert_eq!(keypad.poll_key().await?, Some(Key::Digit(1)));
///     assert_eq!(keypad.poll_key().await?, Some(Key::Digit(2)));
///     assert_eq!(keypad.poll_key().await?, Some(Key::Hash));
///     assert_eq!(keypad.poll_key().await?, None);
///
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct MockKeypad {
    key_rx: mpsc::UnboundedReceiver<Key>,
}

impl MockKeypad {
    /// Create a new mock keypad and the handle that presses its keys.
    pub fn new() -> (Self, MockKeypadHandle) {
        let (key_tx, key_rx) = mpsc::unbounded_channel();
        (Self { key_rx }, MockKeypadHandle { key_tx })
    }
}

impl Default for MockKeypad {
    fn default() -> Self {
        Self::new().0
    }
}

impl KeypadDevice for MockKeypad {
    async fn poll_key(&mut self) -> Result<Option<Key>> {
        match self.key_rx.try_recv() {
            Ok(key) => Ok(Some(key)),
            Err(mpsc::error::TryRecvError::Empty) => Ok(None),
            Err(mpsc::error::TryRecvError::Disconnected) => Err(
                crate::HardwareError::disconnected("Keypad input channel closed"),
            ),
        }
    }
}

/// Handle for pressing keys on a mock keypad.
///
/// Cloneable and usable from any task.
#[derive(Debug, Clone)]
pub struct MockKeypadHandle {
    key_tx: mpsc::UnboundedSender<Key>,
}

impl MockKeypadHandle {
    /// Press a single key.
    ///
    /// # Errors
    ///
    /// Returns an error if the keypad has been dropped.
    pub fn press(&self, key: Key) -> Result<()> {
        self.key_tx
            .send(key)
            .map_err(|_| crate::HardwareError::disconnected("Keypad input channel closed"))
    }

    /// Press every key whose legend appears in `keys`, in order.
    ///
    /// # Errors
    ///
    /// Returns an error if a character is not on the keypad (nothing is
    /// pressed in that case) or the keypad has been dropped.
    pub fn type_str(&self, keys: &str) -> Result<()> {
        let keys = keys
            .chars()
            .map(Key::from_char)
            .collect::<Result<Vec<_>>>()?;

        for key in keys {
            self.press(key)?;
        }
        Ok(())
    }
}
