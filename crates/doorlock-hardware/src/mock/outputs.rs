//! Mock lock actuator and output lines.
//!
//! Each mock records the levels it was driven to, up to [`MAX_HISTORY`]
//! entries. Handles read the record; the last entry is the current state.

use crate::{
    Result,
    traits::{LockActuator, SignalLine},
    types::{LockPosition, SignalLevel},
};
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::watch;

/// Output changes kept per mock; older ones are dropped first.
pub const MAX_HISTORY: usize = 256;

pub(crate) fn push_bounded<T>(history: &mut VecDeque<T>, value: T) {
    if history.len() == MAX_HISTORY {
        history.pop_front();
    }
    history.push_back(value);
}

/// Mock servo lock.
///
/// # Examples
///
/// ```
/// use doorlock_hardware::mock::MockLock;
/// use doorlock_hardware::traits::LockActuator;
/// use doorlock_hardware::types::LockPosition;
///
/// #[tokio::main]
/// async fn main() -> doorlock_hardware::Result<()> {
///     let (mut lock, handle) = MockLock::new();
///
///     lock.set_position(LockPosition::Open).await?;
///     lock.set_position(LockPosition::Lock).await?;
///
///     assert_eq!(handle.position(), Some(LockPosition::Lock));
///     assert_eq!(handle.history(), vec![LockPosition::Open, LockPosition::Lock]);
///
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct MockLock {
    history_tx: watch::Sender<VecDeque<LockPosition>>,
    jammed: Arc<AtomicBool>,
}

impl MockLock {
    pub fn new() -> (Self, MockLockHandle) {
        let (history_tx, history_rx) = watch::channel(VecDeque::new());
        let jammed = Arc::new(AtomicBool::new(false));
        let handle = MockLockHandle {
            history_rx,
            jammed: Arc::clone(&jammed),
        };
        (Self { history_tx, jammed }, handle)
    }
}

impl Default for MockLock {
    fn default() -> Self {
        Self::new().0
    }
}

impl LockActuator for MockLock {
    async fn set_position(&mut self, position: LockPosition) -> Result<()> {
        if self.jammed.load(Ordering::SeqCst) {
            return Err(crate::HardwareError::actuation(format!(
                "Servo jammed, cannot move to {} ({} deg)",
                position,
                position.servo_angle()
            )));
        }
        self.history_tx
            .send_modify(|history| push_bounded(history, position));
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct MockLockHandle {
    history_rx: watch::Receiver<VecDeque<LockPosition>>,
    jammed: Arc<AtomicBool>,
}

impl MockLockHandle {
    /// Last commanded position, `None` if the lock was never driven.
    pub fn position(&self) -> Option<LockPosition> {
        self.history_rx.borrow().back().copied()
    }

    /// Recorded positions, oldest first.
    pub fn history(&self) -> Vec<LockPosition> {
        self.history_rx.borrow().iter().copied().collect()
    }

    /// Number of recorded moves to `position`.
    pub fn count(&self, position: LockPosition) -> usize {
        self.history_rx
            .borrow()
            .iter()
            .filter(|p| **p == position)
            .count()
    }

    /// Make every following command fail until cleared.
    pub fn set_jammed(&self, jammed: bool) {
        self.jammed.store(jammed, Ordering::SeqCst);
    }
}

/// Mock digital output line (LED or buzzer).
#[derive(Debug)]
pub struct MockSignal {
    history_tx: watch::Sender<VecDeque<SignalLevel>>,
}

impl MockSignal {
    pub fn new() -> (Self, MockSignalHandle) {
        let (history_tx, history_rx) = watch::channel(VecDeque::new());
        (Self { history_tx }, MockSignalHandle { history_rx })
    }
}

impl Default for MockSignal {
    fn default() -> Self {
        Self::new().0
    }
}

impl SignalLine for MockSignal {
    async fn set_level(&mut self, level: SignalLevel) -> Result<()> {
        self.history_tx
            .send_modify(|history| push_bounded(history, level));
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct MockSignalHandle {
    history_rx: watch::Receiver<VecDeque<SignalLevel>>,
}

impl MockSignalHandle {
    /// Current level; a line never driven reads low.
    pub fn level(&self) -> SignalLevel {
        self.history_rx.borrow().back().copied().unwrap_or_default()
    }

    pub fn is_high(&self) -> bool {
        self.level().is_high()
    }

    /// Recorded levels, oldest first.
    pub fn history(&self) -> Vec<SignalLevel> {
        self.history_rx.borrow().iter().copied().collect()
    }
}
