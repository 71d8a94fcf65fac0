//! Error types for the access controller.
//!
//! Two families live here. [`AccessError`] describes why a credential or an
//! attempt was refused; it is part of normal operation and is reported in a
//! [`PollOutcome`](crate::PollOutcome), never returned as `Err`.
//! [`ControllerError`] is a real failure: a peripheral stopped answering, the
//! configuration is unusable, or the phase bookkeeping was asked to do
//! something impossible.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::state_machine::Phase;

/// Which of the two factors was presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Factor {
    Pin,
    Card,
}

impl fmt::Display for Factor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Factor::Pin => write!(f, "PIN"),
            Factor::Card => write!(f, "card"),
        }
    }
}

/// Reasons an access attempt was refused.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessError {
    #[error("Invalid {factor}")]
    InvalidCredential { factor: Factor },

    #[error("No card presented within the scan window")]
    Timeout,

    #[error("PIN trials exhausted")]
    TrialsExhausted,

    #[error("PIN entry is full ({capacity} characters)")]
    CapacityExceeded { capacity: usize },
}

/// Failures that stop a poll from completing.
#[derive(Error, Debug)]
pub enum ControllerError {
    #[error("Hardware error: {0}")]
    Hardware(#[from] doorlock_hardware::HardwareError),

    #[error("Configuration error: {0}")]
    Core(#[from] doorlock_core::Error),

    #[error("Invalid phase transition from {from} to {to}")]
    InvalidTransition { from: Phase, to: Phase },
}

pub type Result<T> = std::result::Result<T, ControllerError>;
