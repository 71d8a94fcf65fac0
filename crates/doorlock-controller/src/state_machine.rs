//! Access phase bookkeeping.
//!
//! [`PhaseMachine`] tracks which of the four phases the door is in, refuses
//! impossible phase changes and keeps a bounded history of the changes it
//! made. It knows nothing about keys, cards or outputs; that is the job of
//! [`AccessController`](crate::AccessController).
//!
//! # Phases
//!
//! - `AwaitingPin`: collecting the first factor
//! - `AwaitingCard`: PIN matched, waiting for the card of the same identity
//! - `Granted`: door open, waiting for the doorway to clear
//! - `Lockout`: too many wrong PINs, alarm on until a card is presented
//!
//! # Valid Transitions
//!
//! - AwaitingPin → AwaitingCard | Lockout
//! - AwaitingCard → Granted | AwaitingPin
//! - Granted → AwaitingPin
//! - Lockout → AwaitingPin
//!
//! # Examples
//!
//! ```
//! use doorlock_controller::{Phase, PhaseMachine};
//!
//! let mut machine = PhaseMachine::new();
//! assert_eq!(machine.current_phase(), Phase::AwaitingPin);
//!
//! machine.transition_to(Phase::AwaitingCard).unwrap();
//! assert!(machine.transition_to(Phase::Lockout).is_err());
//! ```

use std::collections::VecDeque;
use std::fmt;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::error::{ControllerError, Result};

/// Maximum number of phase transitions kept in history.
///
/// A complete granted cycle is three transitions, so this covers the last
/// thirty-odd visitors.
pub const MAX_HISTORY_SIZE: usize = 100;

/// The four phases of an access attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Waiting for a PIN followed by the terminator.
    AwaitingPin,

    /// PIN accepted, waiting for the matching card.
    AwaitingCard,

    /// Door unlocked.
    Granted,

    /// Alarm raised after repeated PIN failures.
    Lockout,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::AwaitingPin => write!(f, "AWAITING_PIN"),
            Phase::AwaitingCard => write!(f, "AWAITING_CARD"),
            Phase::Granted => write!(f, "GRANTED"),
            Phase::Lockout => write!(f, "LOCKOUT"),
        }
    }
}

impl Phase {
    /// Check if a change to `target` is allowed from this phase.
    ///
    /// # Examples
    ///
    /// ```
    /// use doorlock_controller::Phase;
    ///
    /// assert!(Phase::AwaitingCard.can_transition_to(&Phase::Granted));
    /// assert!(!Phase::AwaitingPin.can_transition_to(&Phase::Granted));
    /// ```
    pub fn can_transition_to(&self, target: &Phase) -> bool {
        matches!(
            (self, target),
            (Phase::AwaitingPin, Phase::AwaitingCard | Phase::Lockout)
                | (Phase::AwaitingCard, Phase::Granted | Phase::AwaitingPin)
                | (Phase::Granted, Phase::AwaitingPin)
                | (Phase::Lockout, Phase::AwaitingPin)
        )
    }

    /// Whether an identity is established while in this phase.
    pub fn holds_identity(&self) -> bool {
        matches!(self, Phase::AwaitingCard | Phase::Granted)
    }
}

/// Record of a single phase change.
///
/// The timestamp is process-local and is not serialized.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseTransition {
    pub from: Phase,

    pub to: Phase,

    #[serde(skip, default = "Instant::now")]
    pub timestamp: Instant,
}

impl PhaseTransition {
    pub fn new(from: Phase, to: Phase) -> Self {
        Self {
            from,
            to,
            timestamp: Instant::now(),
        }
    }

    /// Time since this transition happened.
    pub fn elapsed(&self) -> Duration {
        self.timestamp.elapsed()
    }
}

/// Current phase plus bounded transition history.
///
/// # Thread Safety
///
/// Not synchronized; owned by a single controller.
#[derive(Debug)]
pub struct PhaseMachine {
    current_phase: Phase,
    phase_entered_at: Instant,
    history: VecDeque<PhaseTransition>,
}

impl PhaseMachine {
    /// Create a machine in `AwaitingPin` with empty history.
    pub fn new() -> Self {
        Self {
            current_phase: Phase::AwaitingPin,
            phase_entered_at: Instant::now(),
            history: VecDeque::with_capacity(MAX_HISTORY_SIZE),
        }
    }

    pub fn current_phase(&self) -> Phase {
        self.current_phase
    }

    pub fn time_in_current_phase(&self) -> Duration {
        self.phase_entered_at.elapsed()
    }

    /// Transition history, oldest first.
    pub fn history(&self) -> &VecDeque<PhaseTransition> {
        &self.history
    }

    /// Up to `count` most recent transitions, oldest first.
    pub fn last_transitions(&self, count: usize) -> Vec<PhaseTransition> {
        let skip = self.history.len().saturating_sub(count);
        self.history.iter().skip(skip).cloned().collect()
    }

    /// Change phase.
    ///
    /// # Errors
    /// Returns `ControllerError::InvalidTransition` if the change is not
    /// allowed; the machine is left untouched.
    pub fn transition_to(&mut self, new_phase: Phase) -> Result<PhaseTransition> {
        if !self.current_phase.can_transition_to(&new_phase) {
            return Err(ControllerError::InvalidTransition {
                from: self.current_phase,
                to: new_phase,
            });
        }

        let transition = PhaseTransition::new(self.current_phase, new_phase);
        self.perform_phase_change(new_phase, transition.clone());
        Ok(transition)
    }

    /// Force the machine back to `AwaitingPin` from any phase.
    ///
    /// Returns `None` if it was already there.
    pub fn reset(&mut self) -> Option<PhaseTransition> {
        if self.current_phase == Phase::AwaitingPin {
            return None;
        }

        let transition = PhaseTransition::new(self.current_phase, Phase::AwaitingPin);
        self.perform_phase_change(Phase::AwaitingPin, transition.clone());
        Some(transition)
    }

    fn perform_phase_change(&mut self, new_phase: Phase, transition: PhaseTransition) {
        self.current_phase = new_phase;
        self.phase_entered_at = Instant::now();

        self.history.push_back(transition);
        if self.history.len() > MAX_HISTORY_SIZE {
            self.history.pop_front();
        }
    }
}

impl Default for PhaseMachine {
    fn default() -> Self {
        Self::new()
    }
}
