//! Core constants for the door lock access controller.
//!
//! Timing values are expressed in milliseconds and mirror the behavior of the
//! deployed lock: a 50 ms poll cadence, a 10 second card window (200 polls),
//! 2 second notices and a 5 second motion recheck while the door is open.
//!
//! # Usage
//!
//! ```
//! use doorlock_core::constants::*;
//!
//! assert_eq!(CARD_SCAN_WINDOW_MS / POLL_INTERVAL_MS, 200);
//! assert_eq!(DEFAULT_MAX_PIN_TRIALS, 3);
//! ```

// ============================================================================
// Credential Format
// ============================================================================

/// Default hard capacity of the PIN entry buffer.
pub const DEFAULT_MAX_PIN_LENGTH: usize = 16;

/// Length of a normalized RFID tag: two lowercase hex digits for each of
/// the four UID bytes.
pub const RFID_TAG_LENGTH: usize = 8;

/// Letters a PIN may contain besides digits.
pub const PIN_LETTERS: [char; 4] = ['A', 'B', 'C', 'D'];

// ============================================================================
// Retry Policy
// ============================================================================

/// Failed PIN submissions allowed before the lock enters lockout.
pub const DEFAULT_MAX_PIN_TRIALS: u8 = 3;

// ============================================================================
// Timing (milliseconds)
// ============================================================================

/// Cadence of the controller poll loop.
pub const POLL_INTERVAL_MS: u64 = 50;

/// How long the controller waits for a card after a PIN match.
pub const CARD_SCAN_WINDOW_MS: u64 = 10_000;

/// How long "Time out!" and "Wrong Card!" stay on the display.
pub const NOTICE_DURATION_MS: u64 = 2_000;

/// Hold after unlocking, before the motion sensor is first consulted.
pub const GRANT_SETTLE_MS: u64 = 2_000;

/// Interval between motion sensor checks while the door is held open.
pub const MOTION_RECHECK_MS: u64 = 5_000;

/// How long the lockout alarm message stays before "System locked!".
pub const LOCKOUT_NOTICE_MS: u64 = 2_000;

// ============================================================================
// Display Text
// ============================================================================

/// Shown while waiting for the notification module at startup.
pub const MSG_PLEASE_WAIT: &str = "Please wait...";

/// PIN entry prompt.
pub const MSG_ENTER_PIN: &str = "Enter your pin:";

/// Shown after a PIN match.
pub const MSG_SCAN_CARD: &str = "Scan your card:";

/// Shown after an unknown PIN.
pub const MSG_WRONG_PIN: &str = "Wrong pin!";

/// Shown when the card window elapses.
pub const MSG_TIMEOUT: &str = "Time out!";

/// Shown when the card does not belong to the PIN owner.
pub const MSG_WRONG_CARD: &str = "Wrong Card!";

/// Shown when the door opens.
pub const MSG_WELCOME: &str = "Welcome Home!";

/// Shown on lockout entry.
pub const MSG_TOO_MANY_FAILS: &str = "Too many fails!";

/// Shown once the lockout alarm notice has elapsed.
pub const MSG_SYSTEM_LOCKED: &str = "System locked!";

/// Shown after a controlled shutdown.
pub const MSG_SYSTEM_HALTED: &str = "System halted";
