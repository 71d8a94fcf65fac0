//! Mock RFID reader implementation for testing and development.
//!
//! Cards presented through a [`MockRfidHandle`] wait in the field until the
//! reader selects one. A selected card stays selected, and keeps being
//! reported as present, until it is halted.

use crate::{
    Result,
    traits::{CardData, RfidDevice, UID_LENGTH},
};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::mpsc;

/// Mock RFID reader for testing and development.
///
/// # Examples
///
/// ```
/// use doorlock_hardware::mock::MockRfid;
/// use doorlock_hardware::traits::RfidDevice;
///
/// #[tokio::main]
/// async fn main() -> doorlock_hardware::Result<()> {
///     let (mut reader, handle) = MockRfid::new();
///
///     handle.present_tag("025c5e28")?;
///
///     assert!(reader.is_new_card_present().await?);
///     let card = reader.read_card().await?;
///     reader.halt().await?;
///
///     assert_eq!(card.uid_hex(), "025c5e28");
///     assert!(!reader.is_new_card_present().await?);
///
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct MockRfid {
    /// Cards waiting to enter the field
    card_rx: mpsc::UnboundedReceiver<[u8; UID_LENGTH]>,

    /// Card currently selected by the reader
    selected: Option<[u8; UID_LENGTH]>,

    halts: Arc<AtomicUsize>,

    fault: Arc<AtomicBool>,

    /// Number of upcoming UID reads that fail
    read_faults: Arc<AtomicUsize>,
}

impl MockRfid {
    /// Create a new mock reader and its control handle.
    pub fn new() -> (Self, MockRfidHandle) {
        let (card_tx, card_rx) = mpsc::unbounded_channel();
        let halts = Arc::new(AtomicUsize::new(0));
        let fault = Arc::new(AtomicBool::new(false));
        let read_faults = Arc::new(AtomicUsize::new(0));

        let reader = Self {
            card_rx,
            selected: None,
            halts: Arc::clone(&halts),
            fault: Arc::clone(&fault),
            read_faults: Arc::clone(&read_faults),
        };

        let handle = MockRfidHandle {
            card_tx,
            halts,
            fault,
            read_faults,
        };

        (reader, handle)
    }

    fn check_fault(&self) -> Result<()> {
        if self.fault.swap(false, Ordering::SeqCst) {
            return Err(crate::HardwareError::communication(
                "RFID reader did not answer",
            ));
        }
        Ok(())
    }
}

impl Default for MockRfid {
    fn default() -> Self {
        Self::new().0
    }
}

impl RfidDevice for MockRfid {
    async fn is_new_card_present(&mut self) -> Result<bool> {
        self.check_fault()?;

        if self.selected.is_none() {
            self.selected = self.card_rx.try_recv().ok();
        }
        Ok(self.selected.is_some())
    }

    async fn read_card(&mut self) -> Result<CardData> {
        self.check_fault()?;

        let uid = self
            .selected
            .ok_or_else(|| crate::HardwareError::card_read("No card selected"))?;

        let failing = self
            .read_faults
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(crate::HardwareError::card_read("CRC error"));
        }
        CardData::new(&uid)
    }

    async fn halt(&mut self) -> Result<()> {
        self.selected = None;
        self.halts.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Handle for presenting cards to a mock reader.
#[derive(Debug, Clone)]
pub struct MockRfidHandle {
    card_tx: mpsc::UnboundedSender<[u8; UID_LENGTH]>,
    halts: Arc<AtomicUsize>,
    fault: Arc<AtomicBool>,
    read_faults: Arc<AtomicUsize>,
}

impl MockRfidHandle {
    /// Bring a card with this UID into the field.
    ///
    /// # Errors
    ///
    /// Returns an error if the reader has been dropped.
    pub fn present_uid(&self, uid: [u8; UID_LENGTH]) -> Result<()> {
        self.card_tx
            .send(uid)
            .map_err(|_| crate::HardwareError::disconnected("RFID card channel closed"))
    }

    /// Bring a card into the field by its hex UID, e.g. `"c976133f"`.
    ///
    /// Either case is accepted; the reader always reports raw bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if `hex` is not exactly four hex-encoded bytes.
    pub fn present_tag(&self, hex: &str) -> Result<()> {
        self.present_uid(parse_uid(hex)?)
    }

    /// How many times the reader has halted a card.
    pub fn halt_count(&self) -> usize {
        self.halts.load(Ordering::SeqCst)
    }

    /// Make the next reader operation fail with a communication error.
    pub fn inject_fault(&self) {
        self.fault.store(true, Ordering::SeqCst);
    }

    /// Make the next `count` UID reads of a selected card fail. The card
    /// stays selected.
    pub fn fail_reads(&self, count: usize) {
        self.read_faults.store(count, Ordering::SeqCst);
    }
}

fn parse_uid(hex: &str) -> Result<[u8; UID_LENGTH]> {
    if hex.len() != UID_LENGTH * 2 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(crate::HardwareError::invalid_data(format!(
            "Card UID must be {} hex digits, got '{}'",
            UID_LENGTH * 2,
            hex
        )));
    }

    let mut uid = [0u8; UID_LENGTH];
    for (i, byte) in uid.iter_mut().enumerate() {
        *byte = u8::from_str_radix(&hex[i * 2..i * 2 + 2], 16).map_err(|_| {
            crate::HardwareError::invalid_data(format!("Card UID is not hex: '{}'", hex))
        })?;
    }
    Ok(uid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[tokio::test]
    async fn test_empty_field() {
        let (mut reader, _handle) = MockRfid::new();
        assert!(!reader.is_new_card_present().await.unwrap());
        assert!(reader.read_card().await.is_err());
    }

    #[tokio::test]
    async fn test_selected_card_stays_until_halt() {
        let (mut reader, handle) = MockRfid::new();
        handle.present_uid([1, 2, 3, 4]).unwrap();
        handle.present_uid([5, 6, 7, 8]).unwrap();

        assert!(reader.is_new_card_present().await.unwrap());
        assert!(reader.is_new_card_present().await.unwrap());
        assert_eq!(reader.read_card().await.unwrap().uid, [1, 2, 3, 4]);

        reader.halt().await.unwrap();
        assert!(reader.is_new_card_present().await.unwrap());
        assert_eq!(reader.read_card().await.unwrap().uid, [5, 6, 7, 8]);
        assert_eq!(handle.halt_count(), 1);
    }

    #[rstest]
    #[case("C976133F", [0xc9, 0x76, 0x13, 0x3f])]
    #[case("025c5e28", [0x02, 0x5c, 0x5e, 0x28])]
    fn test_parse_uid(#[case] hex: &str, #[case] expected: [u8; 4]) {
        assert_eq!(parse_uid(hex).unwrap(), expected);
    }

    #[rstest]
    #[case("")]
    #[case("c976133")]
    #[case("c976133f00")]
    #[case("zz76133f")]
    #[case("+1020304")]
    fn test_parse_uid_invalid(#[case] hex: &str) {
        assert!(parse_uid(hex).is_err());
    }

    #[tokio::test]
    async fn test_failed_read_keeps_card_selected() {
        let (mut reader, handle) = MockRfid::new();
        handle.present_tag("c976133f").unwrap();
        handle.fail_reads(1);

        assert!(reader.is_new_card_present().await.unwrap());
        let err = reader.read_card().await.unwrap_err();
        assert!(err.is_transient());

        assert!(reader.is_new_card_present().await.unwrap());
        assert_eq!(reader.read_card().await.unwrap().uid_hex(), "c976133f");
    }

    #[tokio::test]
    async fn test_injected_fault_fails_once() {
        let (mut reader, handle) = MockRfid::new();
        handle.inject_fault();

        assert!(matches!(
            reader.is_new_card_present().await,
            Err(crate::HardwareError::CommunicationError { .. })
        ));
        assert!(!reader.is_new_card_present().await.unwrap());
    }
}
