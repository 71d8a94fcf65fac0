//! Two-factor door lock access controller.
//!
//! This crate contains the access state machine: it collects a PIN from the
//! keypad, resolves it to an identity, requires that same identity's RFID
//! card, then opens the door until the doorway is clear. Repeated wrong PINs
//! raise an alarm lockout. Everything it senses or drives goes through a
//! [`DoorGateway`](doorlock_hardware::DoorGateway).
//!
//! - [`AccessController`]: the poll-driven state machine
//! - [`PhaseMachine`]: phase validation and transition history
//! - [`EntrySession`]: per-attempt buffer, trial counter and identity
//! - [`Runner`]: tokio driver with cancellation

pub mod controller;
pub mod error;
pub mod runner;
pub mod session;
pub mod state_machine;

pub use controller::{
    AccessController, AccessControllerBuilder, AccessOutcome, AccessRecord, ControllerStatus,
    PollOutcome,
};
pub use error::{AccessError, ControllerError, Factor, Result};
pub use runner::{RunSummary, Runner};
pub use session::{EntrySession, PinBuffer};
pub use state_machine::{Phase, PhaseMachine, PhaseTransition};
