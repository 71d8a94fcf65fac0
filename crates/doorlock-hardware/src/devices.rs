//! The assembled door and its single control surface.
//!
//! The controller talks to one [`DoorGateway`] instead of seven devices.
//! [`DoorPeripherals`] is the concrete assembly: one keypad, one reader, one
//! motion sensor, one display, one lock, two indicator lines, an alarm line
//! and the companion notifier, each a generic parameter so the whole door
//! monomorphizes with no dynamic dispatch.
//!
//! # Examples
//!
//! ```
//! use doorlock_hardware::devices::DoorGateway;
//! use doorlock_hardware::mock::mock_door;
//! use doorlock_hardware::types::LockPosition;
//!
//! #[tokio::main]
//! async fn main() -> doorlock_hardware::Result<()> {
//!     let (mut door, handle) = mock_door();
//!
//!     door.set_lock(LockPosition::Open).await?;
//!     assert_eq!(handle.lock.position(), Some(LockPosition::Open));
//!
//!     Ok(())
//! }
//! ```

#![allow(async_fn_in_trait)]

use crate::error::Result;
use crate::traits::{
    CardData, DisplayDevice, Key, KeypadDevice, LockActuator, MotionSensor, Notifier, RfidDevice,
    SignalLine,
};
use crate::types::{Indicator, LockPosition, SignalLevel};

/// Everything the access controller can sense or drive.
pub trait DoorGateway: Send + Sync {
    async fn poll_key(&mut self) -> Result<Option<Key>>;

    async fn is_new_card_present(&mut self) -> Result<bool>;

    async fn read_card(&mut self) -> Result<CardData>;

    async fn halt_card(&mut self) -> Result<()>;

    async fn motion_detected(&mut self) -> Result<bool>;

    async fn clear_display(&mut self) -> Result<()>;

    async fn print(&mut self, text: &str) -> Result<()>;

    async fn set_cursor(&mut self, col: u8, row: u8) -> Result<()>;

    async fn write_char(&mut self, c: char) -> Result<()>;

    async fn set_lock(&mut self, position: LockPosition) -> Result<()>;

    async fn set_indicator(&mut self, indicator: Indicator, level: SignalLevel) -> Result<()>;

    async fn set_alarm(&mut self, level: SignalLevel) -> Result<()>;

    /// Send a payload to the companion module.
    async fn notify(&mut self, payload: &[u8]) -> Result<()>;

    /// Whether the companion module has reported ready.
    async fn companion_ready(&mut self) -> Result<bool>;
}

/// A door assembled from individual devices.
#[derive(Debug)]
pub struct DoorPeripherals<K, R, M, D, A, S, N> {
    pub keypad: K,
    pub rfid: R,
    pub motion: M,
    pub display: D,
    pub lock: A,
    pub granted_led: S,
    pub denied_led: S,
    pub alarm: S,
    pub notifier: N,
}

impl<K, R, M, D, A, S, N> DoorGateway for DoorPeripherals<K, R, M, D, A, S, N>
where
    K: KeypadDevice,
    R: RfidDevice,
    M: MotionSensor,
    D: DisplayDevice,
    A: LockActuator,
    S: SignalLine,
    N: Notifier,
{
    async fn poll_key(&mut self) -> Result<Option<Key>> {
        self.keypad.poll_key().await
    }

    async fn is_new_card_present(&mut self) -> Result<bool> {
        self.rfid.is_new_card_present().await
    }

    async fn read_card(&mut self) -> Result<CardData> {
        self.rfid.read_card().await
    }

    async fn halt_card(&mut self) -> Result<()> {
        self.rfid.halt().await
    }

    async fn motion_detected(&mut self) -> Result<bool> {
        self.motion.motion_detected().await
    }

    async fn clear_display(&mut self) -> Result<()> {
        self.display.clear().await
    }

    async fn print(&mut self, text: &str) -> Result<()> {
        self.display.print(text).await
    }

    async fn set_cursor(&mut self, col: u8, row: u8) -> Result<()> {
        self.display.set_cursor(col, row).await
    }

    async fn write_char(&mut self, c: char) -> Result<()> {
        self.display.write_char(c).await
    }

    async fn set_lock(&mut self, position: LockPosition) -> Result<()> {
        self.lock.set_position(position).await
    }

    async fn set_indicator(&mut self, indicator: Indicator, level: SignalLevel) -> Result<()> {
        match indicator {
            Indicator::Granted => self.granted_led.set_level(level).await,
            Indicator::Denied => self.denied_led.set_level(level).await,
        }
    }

    async fn set_alarm(&mut self, level: SignalLevel) -> Result<()> {
        self.alarm.set_level(level).await
    }

    async fn notify(&mut self, payload: &[u8]) -> Result<()> {
        self.notifier.send(payload).await
    }

    async fn companion_ready(&mut self) -> Result<bool> {
        self.notifier.is_ready().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::mock_door;

    #[tokio::test]
    async fn test_indicators_are_routed_to_their_lines() {
        let (mut door, handle) = mock_door();

        door.set_indicator(Indicator::Granted, SignalLevel::High)
            .await
            .unwrap();
        door.set_indicator(Indicator::Denied, SignalLevel::Low)
            .await
            .unwrap();
        door.set_alarm(SignalLevel::High).await.unwrap();

        assert_eq!(handle.granted_led.level(), SignalLevel::High);
        assert_eq!(handle.denied_led.history(), vec![SignalLevel::Low]);
        assert_eq!(handle.alarm.level(), SignalLevel::High);
    }

    #[tokio::test]
    async fn test_card_flow_through_gateway() {
        let (mut door, handle) = mock_door();

        assert!(!door.is_new_card_present().await.unwrap());
        handle.rfid.present_uid([0xde, 0xa9, 0x54, 0x15]).unwrap();

        assert!(door.is_new_card_present().await.unwrap());
        let card = door.read_card().await.unwrap();
        door.halt_card().await.unwrap();

        assert_eq!(card.uid_hex(), "dea95415");
        assert_eq!(handle.rfid.halt_count(), 1);
        assert!(!door.is_new_card_present().await.unwrap());
    }

    #[tokio::test]
    async fn test_display_through_gateway() {
        let (mut door, handle) = mock_door();

        door.print("Enter your pin:").await.unwrap();
        door.set_cursor(0, 1).await.unwrap();
        door.write_char('*').await.unwrap();

        assert_eq!(handle.display.line(0).trim_end(), "Enter your pin:");
        assert_eq!(handle.display.line(1).trim_end(), "*");
    }

    #[tokio::test]
    async fn test_notify_and_ready() {
        let (mut door, handle) = mock_door();

        assert!(door.companion_ready().await.unwrap());
        door.notify(b"Pedro").await.unwrap();
        assert_eq!(handle.notifier.sent_text(), vec!["Pedro".to_string()]);
    }
}
