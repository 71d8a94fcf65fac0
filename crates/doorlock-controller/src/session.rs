//! Per-attempt entry state.
//!
//! An [`EntrySession`] holds what the controller has learned about the person
//! at the door so far: the characters typed, how many PINs they got wrong and,
//! once the PIN matched, who they claim to be. It is owned by the controller,
//! reset after every completed cycle and never persisted.

use std::fmt;

use doorlock_core::IdentityId;

use crate::error::AccessError;

/// Bounded buffer of typed PIN characters.
///
/// The terminator never enters the buffer. Once full, further characters are
/// refused until the buffer is taken or cleared.
#[derive(Clone, PartialEq, Eq)]
pub struct PinBuffer {
    chars: String,
    capacity: usize,
}

impl PinBuffer {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            chars: String::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a character.
    ///
    /// # Errors
    /// Returns `AccessError::CapacityExceeded` if the buffer is full; the
    /// character is dropped.
    pub fn push(&mut self, c: char) -> Result<(), AccessError> {
        if self.is_full() {
            return Err(AccessError::CapacityExceeded {
                capacity: self.capacity,
            });
        }
        self.chars.push(c);
        Ok(())
    }

    /// Remove and return the typed characters.
    pub fn take(&mut self) -> String {
        std::mem::take(&mut self.chars)
    }

    pub fn clear(&mut self) {
        self.chars.clear();
    }

    pub fn len(&self) -> usize {
        self.chars.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.len() >= self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl fmt::Debug for PinBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PinBuffer({}/{})", self.len(), self.capacity)
    }
}

/// Transient state of one access attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntrySession {
    buffer: PinBuffer,
    trials: u8,
    resolved: Option<IdentityId>,
}

impl EntrySession {
    pub fn new(max_pin_length: usize) -> Self {
        Self {
            buffer: PinBuffer::with_capacity(max_pin_length),
            trials: 0,
            resolved: None,
        }
    }

    pub fn buffer(&self) -> &PinBuffer {
        &self.buffer
    }

    pub fn buffer_mut(&mut self) -> &mut PinBuffer {
        &mut self.buffer
    }

    /// Failed PIN submissions since the last reset.
    pub fn trials(&self) -> u8 {
        self.trials
    }

    /// Count one more failed PIN submission.
    pub fn record_failure(&mut self) -> u8 {
        self.trials = self.trials.saturating_add(1);
        self.trials
    }

    /// Identity established by the first factor, if any.
    pub fn resolved_identity(&self) -> Option<IdentityId> {
        self.resolved
    }

    pub fn resolve(&mut self, id: IdentityId) {
        self.resolved = Some(id);
    }

    /// Forget everything: typed characters, failures and identity.
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.trials = 0;
        self.resolved = None;
    }
}
