//! Common types shared across door peripherals.
//!
//! Output levels for the lock actuator, the two status indicators and the
//! alarm line.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Servo angle that keeps the bolt engaged.
pub const SERVO_LOCK_ANGLE: u8 = 0;

/// Servo angle that retracts the bolt.
pub const SERVO_OPEN_ANGLE: u8 = 180;

/// The two discrete positions of the lock actuator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LockPosition {
    /// Bolt engaged, door locked.
    Lock,

    /// Bolt retracted, door can be opened.
    Open,
}

impl LockPosition {
    /// Servo angle in degrees for this position.
    ///
    /// # Examples
    ///
    /// ```
    /// use doorlock_hardware::types::LockPosition;
    ///
    /// assert_eq!(LockPosition::Lock.servo_angle(), 0);
    /// assert_eq!(LockPosition::Open.servo_angle(), 180);
    /// ```
    pub fn servo_angle(&self) -> u8 {
        match self {
            Self::Lock => SERVO_LOCK_ANGLE,
            Self::Open => SERVO_OPEN_ANGLE,
        }
    }
}

impl fmt::Display for LockPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lock => write!(f, "LOCK"),
            Self::Open => write!(f, "OPEN"),
        }
    }
}

/// Digital output level of an indicator or alarm line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalLevel {
    #[default]
    Low,
    High,
}

impl SignalLevel {
    pub fn is_high(&self) -> bool {
        matches!(self, Self::High)
    }
}

impl From<bool> for SignalLevel {
    fn from(high: bool) -> Self {
        if high { Self::High } else { Self::Low }
    }
}

impl fmt::Display for SignalLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => write!(f, "LOW"),
            Self::High => write!(f, "HIGH"),
        }
    }
}

/// Which status indicator an output refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Indicator {
    /// Green light, lit while the door is open.
    Granted,

    /// Red light, lit during lockout.
    Denied,
}

impl fmt::Display for Indicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Granted => write!(f, "granted"),
            Self::Denied => write!(f, "denied"),
        }
    }
}
