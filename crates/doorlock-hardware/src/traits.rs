//! Hardware device trait definitions.
//!
//! This module defines the contract between the access controller and the
//! door peripherals: keypad, RFID reader, motion sensor, character display,
//! lock actuator, digital output lines and the notification transport.
//!
//! Every input trait is poll-shaped: a call returns immediately with what the
//! device has right now. The controller runs one step per poll and must never
//! be parked inside a driver.
//!
//! All traits use native `async fn` methods (Rust 1.90 + Edition 2024 RPITIT),
//! eliminating the need for the `async_trait` macro.

#![allow(async_fn_in_trait)]

use crate::error::{HardwareError, Result};
use crate::types::{LockPosition, SignalLevel};

/// Terminator key that ends PIN entry.
pub const TERMINATOR_KEY: char = '#';

/// Number of UID bytes the reader delivers per card.
pub const UID_LENGTH: usize = 4;

/// A key on the 4x4 door keypad.
///
/// Layout:
///
/// ```text
/// 1 2 3 A
/// 4 5 6 B
/// 7 8 9 C
/// * 0 # D
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    /// Numeric digit (0-9).
    Digit(u8),

    /// Letter key (A-D).
    Letter(char),

    /// Star key (*).
    Star,

    /// Hash key (#), the PIN terminator.
    Hash,
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
    /// use doorlock_hardware::traits::Key;
    ///
    /// assert_eq!(Key::digit(5).unwrap().as_char(), '5');
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

    /// Create a letter key.
    ///
    /// # Errors
    ///
    /// Returns an error unless the letter is one of `A`-`D`.
    pub fn letter(c: char) -> Result<Self> {
        if !('A'..='D').contains(&c) {
            return Err(HardwareError::invalid_data(format!(
                "Letter key must be A-D, got '{}'",
                c
            )));
        }
        Ok(Self::Letter(c))
    }

    /// Map a keypad legend to a key.
    ///
    /// # Errors
    ///
    /// Returns an error if no key carries that legend.
    ///
    /// # Examples
    ///
    /// ```
    /// use doorlock_hardware::traits::Key;
    ///
    /// assert_eq!(Key::from_char('#').unwrap(), Key::Hash);
    /// assert_eq!(Key::from_char('B').unwrap(), Key::Letter('B'));
    /// assert!(Key::from_char('b').is_err());
    /// ```
    pub fn from_char(c: char) -> Result<Self> {
        match c {
            '0'..='9' => Self::digit(c as u8 - b'0'),
            'A'..='D' => Self::letter(c),
            '*' => Ok(Self::Star),
            '#' => Ok(Self::Hash),
            other => Err(HardwareError::invalid_data(format!(
                "No keypad key for '{}'",
                other
            ))),
        }
    }

    /// The legend printed on the key.
    pub fn as_char(&self) -> char {
        match self {
            Self::Digit(d) => char::from(b'0' + d),
            Self::Letter(c) => *c,
            Self::Star => '*',
            Self::Hash => TERMINATOR_KEY,
        }
    }

    /// Check if this key ends PIN entry.
    pub fn is_terminator(&self) -> bool {
        matches!(self, Self::Hash)
    }
}

/// Data read from a card presented to the RFID reader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardData {
    /// Card unique identifier.
    pub uid: [u8; UID_LENGTH],

    /// When the UID was read.
    pub read_at: chrono::DateTime<chrono::Utc>,
}

impl CardData {
    /// Create card data from raw UID bytes with the current timestamp.
    ///
    /// # Errors
    ///
    /// Returns an error unless exactly four bytes are given.
    ///
    /// # Examples
    ///
    /// ```
    /// use doorlock_hardware::traits::CardData;
    ///
    /// let card = CardData::new(&[0xc9, 0x76, 0x13, 0x3f]).unwrap();
    /// assert_eq!(card.uid_hex(), "c976133f");
    ///
    /// assert!(CardData::new(&[0x01, 0x02, 0x03]).is_err());
    /// ```
    pub fn new(uid: &[u8]) -> Result<Self> {
        let uid: [u8; UID_LENGTH] = uid.try_into().map_err(|_| {
            HardwareError::invalid_data(format!(
                "Card UID must be {} bytes, got {}",
                UID_LENGTH,
                uid.len()
            ))
        })?;

        Ok(Self {
            uid,
            read_at: chrono::Utc::now(),
        })
    }

    /// Override the read timestamp, for replaying recorded scans.
    pub fn with_read_at(mut self, read_at: chrono::DateTime<chrono::Utc>) -> Self {
        self.read_at = read_at;
        self
    }

    /// Get the UID as a lowercase hexadecimal string.
    pub fn uid_hex(&self) -> String {
        self.uid.iter().map(|b| format!("{:02x}", b)).collect()
    }
}

/// Keypad device abstraction.
///
/// # Object Safety and Dynamic Dispatch
///
/// **NOTE**: This trait is NOT object-safe because `async fn` methods return
/// `impl Future`. Use generic type parameters:
///
/// ```no_run
/// use doorlock_hardware::traits::KeypadDevice;
/// use doorlock_hardware::error::Result;
///
/// async fn next_char<K: KeypadDevice>(keypad: &mut K) -> Result<Option<char>> {
///     Ok(keypad.poll_key().await?.map(|key| key.as_char()))
/// }
/// ```
pub trait KeypadDevice: Send + Sync {
    /// Return the key pressed since the last poll, if any.
    ///
    /// At most one key is returned per call. Never waits for a key.
    ///
    /// # Errors
    ///
    /// Returns an error if the device is disconnected.
    async fn poll_key(&mut self) -> Result<Option<Key>>;
}

/// RFID reader abstraction (MFRC522-class reader).
pub trait RfidDevice: Send + Sync {
    /// Check whether a new card has entered the field.
    ///
    /// # Errors
    ///
    /// Returns an error if a communication error occurs.
    async fn is_new_card_present(&mut self) -> Result<bool>;

    /// Read the UID of the card detected by
    /// [`is_new_card_present`](Self::is_new_card_present).
    ///
    /// # Errors
    ///
    /// Returns an error if no card is selected or the read fails.
    async fn read_card(&mut self) -> Result<CardData>;

    /// Put the current card into HALT so it is not reported again.
    ///
    /// # Errors
    ///
    /// Returns an error if a communication error occurs.
    async fn halt(&mut self) -> Result<()>;
}

/// Presence sensor watching the doorway.
pub trait MotionSensor: Send + Sync {
    /// Check whether something is currently moving in the doorway.
    ///
    /// # Errors
    ///
    /// Returns an error if the sensor cannot be read.
    async fn motion_detected(&mut self) -> Result<bool>;
}

/// Character display (16x2 LCD).
pub trait DisplayDevice: Send + Sync {
    /// Clear the screen and move the cursor home.
    async fn clear(&mut self) -> Result<()>;

    /// Print text at the cursor.
    async fn print(&mut self, text: &str) -> Result<()>;

    /// Move the cursor.
    ///
    /// # Errors
    ///
    /// Returns an error if the position is outside the screen.
    async fn set_cursor(&mut self, col: u8, row: u8) -> Result<()>;

    /// Write a single character at the cursor.
    async fn write_char(&mut self, c: char) -> Result<()>;
}

/// Door lock actuator (servo driven bolt).
pub trait LockActuator: Send + Sync {
    /// Drive the bolt to `position`.
    ///
    /// # Errors
    ///
    /// Returns an error if the actuator cannot be driven.
    async fn set_position(&mut self, position: LockPosition) -> Result<()>;
}

/// A digital output line: status LED or buzzer.
pub trait SignalLine: Send + Sync {
    /// Drive the line to `level`.
    async fn set_level(&mut self, level: SignalLevel) -> Result<()>;
}

/// Transport to the companion notification module.
pub trait Notifier: Send + Sync {
    /// Check whether the companion module is ready to receive.
    async fn is_ready(&mut self) -> Result<bool>;

    /// Send a payload to the companion module.
    ///
    /// # Errors
    ///
    /// Returns an error if the transport is down.
    async fn send(&mut self, payload: &[u8]) -> Result<()>;
}
