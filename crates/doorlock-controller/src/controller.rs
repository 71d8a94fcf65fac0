//! The two-factor access controller.
//!
//! [`AccessController`] owns the entry session and the phase machine and
//! drives a [`DoorGateway`]. It is strictly poll-driven: every call to
//! [`poll`](AccessController::poll) is one tick of the configured poll
//! interval. Waits that a blocking firmware would sleep through (the card
//! window, notices, the open-door settle and motion hold, the lockout alarm)
//! are counted in ticks, so a poll never parks inside the controller and the
//! runner can stop it between any two ticks.
//!
//! Keys pressed while the controller is not collecting a PIN are read and
//! discarded, so they cannot leak into the next attempt.
//!
//! # Examples
//!
//! ```
//! use doorlock_controller::{AccessController, Phase};
//! use doorlock_hardware::mock::mock_door;
//!
//! #[tokio::main]
//! async fn main() -> doorlock_controller::Result<()> {
//!     let (door, handle) = mock_door();
//!     let mut controller = AccessController::builder(door).build()?;
//!
//!     handle.keypad.type_str("5555#")?;
//!     for _ in 0..5 {
//!         controller.poll().await?;
//!     }
//!     assert_eq!(controller.phase(), Phase::AwaitingCard);
//!
//!     handle.rfid.present_tag("c976133f")?;
//!     controller.poll().await?;
//!     assert_eq!(controller.phase(), Phase::Granted);
//!
//!     Ok(())
//! }
//! ```

use std::collections::VecDeque;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, trace, warn};

use doorlock_core::constants::{
    MSG_ENTER_PIN, MSG_PLEASE_WAIT, MSG_SCAN_CARD, MSG_SYSTEM_HALTED, MSG_SYSTEM_LOCKED,
    MSG_TIMEOUT, MSG_TOO_MANY_FAILS, MSG_WELCOME, MSG_WRONG_CARD, MSG_WRONG_PIN,
};
use doorlock_core::{AccessConfig, IdentityId, IdentityRegistry, RfidTag};
use doorlock_hardware::{DoorGateway, Indicator, Key, LockPosition, SignalLevel};

use crate::error::{AccessError, ControllerError, Factor, Result};
use crate::session::EntrySession;
use crate::state_machine::{Phase, PhaseMachine, PhaseTransition};

/// Access decisions kept for inspection.
pub const MAX_ACCESS_LOG_SIZE: usize = 100;

/// Result of a single card decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessOutcome {
    Granted,
    WrongCard,
}

/// Audit entry for a card presented after an accepted PIN.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessRecord {
    /// Name of the identity the PIN resolved to.
    pub identity: String,

    pub tag: RfidTag,

    pub outcome: AccessOutcome,

    /// When the card was read.
    pub read_at: DateTime<Utc>,
}

/// What a single poll did.
#[derive(Debug, Clone)]
pub struct PollOutcome {
    /// Phase after the poll.
    pub phase: Phase,

    /// Phase change made during the poll, if any.
    pub transition: Option<PhaseTransition>,

    /// Why an input or attempt was refused, if one was.
    pub rejection: Option<AccessError>,
}

impl PollOutcome {
    fn new(phase: Phase) -> Self {
        Self {
            phase,
            transition: None,
            rejection: None,
        }
    }

    pub fn is_rejected(&self) -> bool {
        self.rejection.is_some()
    }
}

/// Snapshot of the controller for observers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControllerStatus {
    pub phase: Phase,
    pub trials: u8,
    pub buffered: usize,
    pub resolved_identity: Option<IdentityId>,
    pub showing_notice: bool,
}

impl Default for ControllerStatus {
    fn default() -> Self {
        Self {
            phase: Phase::AwaitingPin,
            trials: 0,
            buffered: 0,
            resolved_identity: None,
            showing_notice: false,
        }
    }
}

/// Wait lengths in poll ticks, fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Ticks {
    card_window: u32,
    notice: u32,
    settle: u32,
    motion_recheck: u32,
    lockout_notice: u32,
}

impl Ticks {
    fn from_config(config: &AccessConfig) -> Self {
        Self {
            card_window: config.ticks(config.card_scan_window()),
            notice: config.ticks(config.notice()),
            settle: config.ticks(config.grant_settle()),
            motion_recheck: config.ticks(config.motion_recheck()),
            lockout_notice: config.ticks(config.lockout_notice()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GrantStage {
    /// Door just opened; motion is not checked yet.
    Settling(u32),

    /// Motion was seen; check again when this runs out.
    Holding(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LockoutStage {
    /// "Too many fails!" on screen.
    Alarm(u32),

    /// "System locked!" on screen, waiting for any card.
    Sealed,
}

/// Phase plus the countdown the phase is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Activity {
    /// Non-zero `notice` means a rejection message is still on screen.
    AwaitingPin { notice: u32 },
    AwaitingCard { polls: u32 },
    Granted(GrantStage),
    Lockout(LockoutStage),
}

/// Two-factor access controller over a door.
pub struct AccessController<G: DoorGateway> {
    door: G,
    registry: IdentityRegistry,
    config: AccessConfig,
    ticks: Ticks,
    session: EntrySession,
    machine: PhaseMachine,
    activity: Activity,
    access_log: VecDeque<AccessRecord>,
}

impl<G: DoorGateway> AccessController<G> {
    /// Start building a controller for `door`.
    pub fn builder(door: G) -> AccessControllerBuilder<G> {
        AccessControllerBuilder::new(door)
    }

    pub fn phase(&self) -> Phase {
        self.machine.current_phase()
    }

    /// Failed PIN submissions in the current attempt.
    pub fn trials(&self) -> u8 {
        self.session.trials()
    }

    /// Characters typed so far.
    pub fn buffered_len(&self) -> usize {
        self.session.buffer().len()
    }

    /// Identity established by the PIN, while waiting for the card or open.
    pub fn resolved_identity(&self) -> Option<IdentityId> {
        self.session.resolved_identity()
    }

    /// Whether a rejection notice is still being shown.
    pub fn is_showing_notice(&self) -> bool {
        matches!(self.activity, Activity::AwaitingPin { notice } if notice > 0)
    }

    pub fn status(&self) -> ControllerStatus {
        ControllerStatus {
            phase: self.phase(),
            trials: self.trials(),
            buffered: self.buffered_len(),
            resolved_identity: self.resolved_identity(),
            showing_notice: self.is_showing_notice(),
        }
    }

    pub fn time_in_phase(&self) -> Duration {
        self.machine.time_in_current_phase()
    }

    /// Phase transitions, oldest first.
    pub fn history(&self) -> &VecDeque<PhaseTransition> {
        self.machine.history()
    }

    /// Card decisions, oldest first.
    pub fn access_log(&self) -> &VecDeque<AccessRecord> {
        &self.access_log
    }

    pub fn config(&self) -> &AccessConfig {
        &self.config
    }

    pub fn registry(&self) -> &IdentityRegistry {
        &self.registry
    }

    pub fn door(&self) -> &G {
        &self.door
    }

    pub fn door_mut(&mut self) -> &mut G {
        &mut self.door
    }

    /// Put the door in its safe power-on state.
    ///
    /// Locks, drops every indicator and the alarm, and shows "Please wait..."
    /// until the companion module is ready.
    ///
    /// # Errors
    /// Returns an error if any output cannot be driven.
    pub async fn initialize(&mut self) -> Result<()> {
        for hazard in self.registry.hazards() {
            warn!("Registry hazard: {}", hazard);
        }

        self.door.set_lock(LockPosition::Lock).await?;
        self.set_outputs(SignalLevel::Low, SignalLevel::Low, SignalLevel::Low)
            .await?;
        self.show(MSG_PLEASE_WAIT).await?;

        info!(
            "Door initialized with {} identities, {} PIN trials",
            self.registry.len(),
            self.config.max_trials
        );
        Ok(())
    }

    /// Whether the companion module reports ready.
    pub async fn companion_ready(&mut self) -> Result<bool> {
        Ok(self.door.companion_ready().await?)
    }

    /// Show the PIN prompt with the cursor on the second row.
    pub async fn show_prompt(&mut self) -> Result<()> {
        self.show(MSG_ENTER_PIN).await?;
        self.door.set_cursor(0, 1).await?;
        Ok(())
    }

    /// Leave the door locked and quiet.
    ///
    /// Every output is driven even if an earlier one fails, and the session
    /// and phase are always reset to `AwaitingPin`.
    ///
    /// # Errors
    /// Returns the first output failure, after all outputs were attempted.
    pub async fn shutdown(&mut self) -> Result<()> {
        let outputs = [
            self.door.set_lock(LockPosition::Lock).await,
            self.door
                .set_indicator(Indicator::Granted, SignalLevel::Low)
                .await,
            self.door
                .set_indicator(Indicator::Denied, SignalLevel::Low)
                .await,
            self.door.set_alarm(SignalLevel::Low).await,
        ];

        self.session.reset();
        if let Some(transition) = self.machine.reset() {
            info!("Phase {} -> {} (shutdown)", transition.from, transition.to);
        }
        self.activity = Activity::AwaitingPin { notice: 0 };

        let mut first_error: Option<ControllerError> = None;
        for result in outputs {
            if let Err(e) = result {
                error!("Output failed during shutdown: {}", e);
                if first_error.is_none() {
                    first_error = Some(e.into());
                }
            }
        }
        if let Err(e) = self.show(MSG_SYSTEM_HALTED).await {
            error!("Display failed during shutdown: {}", e);
            if first_error.is_none() {
                first_error = Some(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => {
                info!("Door controller halted");
                Ok(())
            }
        }
    }

    /// Run one tick.
    ///
    /// # Errors
    /// Returns an error only if a peripheral fails or the bookkeeping is
    /// inconsistent. Refused credentials are reported in the outcome.
    pub async fn poll(&mut self) -> Result<PollOutcome> {
        match self.activity {
            Activity::AwaitingPin { notice } if notice > 0 => self.poll_notice(notice).await,
            Activity::AwaitingPin { .. } => self.poll_pin().await,
            Activity::AwaitingCard { polls } => self.poll_card(polls).await,
            Activity::Granted(stage) => self.poll_granted(stage).await,
            Activity::Lockout(stage) => self.poll_lockout(stage).await,
        }
    }

    async fn poll_notice(&mut self, remaining: u32) -> Result<PollOutcome> {
        self.discard_keys().await?;

        let remaining = remaining - 1;
        self.activity = Activity::AwaitingPin { notice: remaining };
        if remaining == 0 {
            self.show_prompt().await?;
        }
        Ok(self.outcome())
    }

    async fn poll_pin(&mut self) -> Result<PollOutcome> {
        let Some(key) = self.door.poll_key().await? else {
            if self.session.trials() >= self.config.max_trials {
                return self.enter_lockout().await;
            }
            return Ok(self.outcome());
        };

        if key.is_terminator() {
            return self.submit_pin().await;
        }

        let mut outcome = self.outcome();
        match self.session.buffer_mut().push(key.as_char()) {
            Ok(()) => {
                trace!("Key accepted ({} buffered)", self.session.buffer().len());
                self.door.write_char(key.as_char()).await?;
            }
            Err(rejection) => {
                warn!("Key dropped: {}", rejection);
                outcome.rejection = Some(rejection);
            }
        }
        Ok(outcome)
    }

    async fn submit_pin(&mut self) -> Result<PollOutcome> {
        let candidate = self.session.buffer_mut().take();

        if let Some(id) = self.registry.match_pin(&candidate) {
            self.session.resolve(id);
            info!("PIN accepted for identity {}", id);

            self.show(MSG_SCAN_CARD).await?;
            let transition = self.transition(Phase::AwaitingCard)?;
            self.activity = Activity::AwaitingCard { polls: 0 };

            let mut outcome = self.outcome();
            outcome.transition = Some(transition);
            return Ok(outcome);
        }

        if self.session.trials() < self.config.max_trials {
            let trials = self.session.record_failure();
            warn!("Wrong PIN ({}/{})", trials, self.config.max_trials);

            self.show(MSG_WRONG_PIN).await?;
            self.door.set_cursor(0, 1).await?;
        } else {
            debug!("PIN refused with trials already exhausted");
        }

        let mut outcome = self.outcome();
        outcome.rejection = Some(AccessError::InvalidCredential {
            factor: Factor::Pin,
        });
        Ok(outcome)
    }

    async fn poll_card(&mut self, polls: u32) -> Result<PollOutcome> {
        self.discard_keys().await?;

        if !self.door.is_new_card_present().await? {
            return self.card_window_tick(polls).await;
        }

        // The card stays selected, so the next tick reads it again.
        let card = match self.door.read_card().await {
            Ok(card) => card,
            Err(e) if e.is_transient() => {
                warn!("Card read failed, retrying: {}", e);
                return self.card_window_tick(polls).await;
            }
            Err(e) => return Err(e.into()),
        };
        self.door.halt_card().await?;

        let tag = RfidTag::from_uid(&card.uid);
        let Some(id) = self.session.resolved_identity() else {
            warn!("Card {} presented with no identity resolved", tag);
            return self
                .abort_attempt(
                    MSG_WRONG_CARD,
                    AccessError::InvalidCredential {
                        factor: Factor::Card,
                    },
                )
                .await;
        };

        let identity = self.registry.require(id)?.name().to_string();
        let granted = self.registry.match_rfid(id, &tag);
        self.record_access(AccessRecord {
            identity: identity.clone(),
            tag: tag.clone(),
            outcome: if granted {
                AccessOutcome::Granted
            } else {
                AccessOutcome::WrongCard
            },
            read_at: card.read_at,
        });

        if granted {
            info!("Card {} accepted for {}", tag, identity);
            self.enter_granted(&identity).await
        } else {
            warn!("Card {} does not belong to {}", tag, identity);
            self.abort_attempt(
                MSG_WRONG_CARD,
                AccessError::InvalidCredential {
                    factor: Factor::Card,
                },
            )
            .await
        }
    }

    /// Count one tick of the card window without a usable card.
    async fn card_window_tick(&mut self, polls: u32) -> Result<PollOutcome> {
        let polls = polls + 1;
        if polls >= self.ticks.card_window {
            warn!("No card within {} polls", polls);
            return self.abort_attempt(MSG_TIMEOUT, AccessError::Timeout).await;
        }
        self.activity = Activity::AwaitingCard { polls };
        Ok(self.outcome())
    }

    async fn enter_granted(&mut self, name: &str) -> Result<PollOutcome> {
        self.door.notify(name.as_bytes()).await?;
        self.show(MSG_WELCOME).await?;
        self.door.set_lock(LockPosition::Open).await?;
        self.door
            .set_indicator(Indicator::Granted, SignalLevel::High)
            .await?;
        self.door
            .set_indicator(Indicator::Denied, SignalLevel::Low)
            .await?;

        let transition = self.transition(Phase::Granted)?;
        self.activity = Activity::Granted(GrantStage::Settling(self.ticks.settle));

        let mut outcome = self.outcome();
        outcome.transition = Some(transition);
        Ok(outcome)
    }

    async fn poll_granted(&mut self, stage: GrantStage) -> Result<PollOutcome> {
        self.discard_keys().await?;

        let remaining = match stage {
            GrantStage::Settling(n) | GrantStage::Holding(n) => n - 1,
        };
        if remaining > 0 {
            self.activity = Activity::Granted(match stage {
                GrantStage::Settling(_) => GrantStage::Settling(remaining),
                GrantStage::Holding(_) => GrantStage::Holding(remaining),
            });
            return Ok(self.outcome());
        }

        if self.door.motion_detected().await? {
            debug!("Doorway occupied, holding the door open");
            self.activity = Activity::Granted(GrantStage::Holding(self.ticks.motion_recheck));
            return Ok(self.outcome());
        }

        self.door.set_lock(LockPosition::Lock).await?;
        self.door
            .set_indicator(Indicator::Granted, SignalLevel::Low)
            .await?;
        info!("Doorway clear, door locked");

        self.return_to_prompt().await
    }

    async fn enter_lockout(&mut self) -> Result<PollOutcome> {
        warn!(
            "{} wrong PINs, locking out until a card is presented",
            self.session.trials()
        );

        self.show(MSG_TOO_MANY_FAILS).await?;
        self.door.set_lock(LockPosition::Lock).await?;
        self.set_outputs(SignalLevel::Low, SignalLevel::High, SignalLevel::High)
            .await?;

        let transition = self.transition(Phase::Lockout)?;
        self.activity = Activity::Lockout(LockoutStage::Alarm(self.ticks.lockout_notice));

        let mut outcome = self.outcome();
        outcome.transition = Some(transition);
        outcome.rejection = Some(AccessError::TrialsExhausted);
        Ok(outcome)
    }

    async fn poll_lockout(&mut self, stage: LockoutStage) -> Result<PollOutcome> {
        self.discard_keys().await?;

        match stage {
            LockoutStage::Alarm(n) => {
                let remaining = n - 1;
                if remaining > 0 {
                    self.activity = Activity::Lockout(LockoutStage::Alarm(remaining));
                } else {
                    self.show(MSG_SYSTEM_LOCKED).await?;
                    self.session.reset();
                    self.activity = Activity::Lockout(LockoutStage::Sealed);
                }
                Ok(self.outcome())
            }
            LockoutStage::Sealed => {
                if !self.door.is_new_card_present().await? {
                    return Ok(self.outcome());
                }

                // Any card clears the lockout; it is not matched.
                self.door.halt_card().await?;
                self.door.set_alarm(SignalLevel::Low).await?;
                self.door
                    .set_indicator(Indicator::Denied, SignalLevel::Low)
                    .await?;
                info!("Card presented, lockout cleared");

                self.return_to_prompt().await
            }
        }
    }

    /// Show a rejection notice and start over once it expires.
    async fn abort_attempt(&mut self, message: &str, rejection: AccessError) -> Result<PollOutcome> {
        self.show(message).await?;
        self.session.reset();

        let transition = self.transition(Phase::AwaitingPin)?;
        self.activity = Activity::AwaitingPin {
            notice: self.ticks.notice,
        };

        let mut outcome = self.outcome();
        outcome.transition = Some(transition);
        outcome.rejection = Some(rejection);
        Ok(outcome)
    }

    async fn return_to_prompt(&mut self) -> Result<PollOutcome> {
        self.session.reset();
        self.show_prompt().await?;

        let transition = self.transition(Phase::AwaitingPin)?;
        self.activity = Activity::AwaitingPin { notice: 0 };

        let mut outcome = self.outcome();
        outcome.transition = Some(transition);
        Ok(outcome)
    }

    fn transition(&mut self, to: Phase) -> Result<PhaseTransition> {
        let transition = self.machine.transition_to(to)?;
        info!("Phase {} -> {}", transition.from, transition.to);
        Ok(transition)
    }

    async fn discard_keys(&mut self) -> Result<()> {
        if let Some(key) = self.door.poll_key().await? {
            trace!("Ignoring {} key in phase {}", discarded(key), self.phase());
        }
        Ok(())
    }

    async fn show(&mut self, message: &str) -> Result<()> {
        self.door.clear_display().await?;
        self.door.print(message).await?;
        Ok(())
    }

    async fn set_outputs(
        &mut self,
        granted: SignalLevel,
        denied: SignalLevel,
        alarm: SignalLevel,
    ) -> Result<()> {
        self.door.set_indicator(Indicator::Granted, granted).await?;
        self.door.set_indicator(Indicator::Denied, denied).await?;
        self.door.set_alarm(alarm).await?;
        Ok(())
    }

    fn record_access(&mut self, record: AccessRecord) {
        self.access_log.push_back(record);
        if self.access_log.len() > MAX_ACCESS_LOG_SIZE {
            self.access_log.pop_front();
        }
    }

    fn outcome(&self) -> PollOutcome {
        PollOutcome::new(self.phase())
    }
}

/// Keys are PIN material; only their class is logged.
fn discarded(key: Key) -> &'static str {
    match key {
        Key::Digit(_) => "digit",
        Key::Letter(_) => "letter",
        Key::Star => "star",
        Key::Hash => "hash",
    }
}

/// Builder for [`AccessController`].
///
/// Defaults to the built-in registry and the default [`AccessConfig`].
///
/// # Examples
///
/// ```
/// use doorlock_controller::AccessController;
/// use doorlock_core::{AccessConfig, Identity, IdentityRegistry};
/// use doorlock_hardware::mock::mock_door;
///
/// let (door, _handle) = mock_door();
/// let registry = IdentityRegistry::new(vec![
///     Identity::new("Ana", "4321", "0a0b0c0d").unwrap(),
/// ]);
///
/// let controller = AccessController::builder(door)
///     .with_registry(registry)
///     .with_config(AccessConfig { max_trials: 5, ..AccessConfig::default() })
///     .build()
///     .unwrap();
///
/// assert_eq!(controller.config().max_trials, 5);
/// ```
pub struct AccessControllerBuilder<G: DoorGateway> {
    door: G,
    registry: IdentityRegistry,
    config: AccessConfig,
}

impl<G: DoorGateway> AccessControllerBuilder<G> {
    pub fn new(door: G) -> Self {
        Self {
            door,
            registry: IdentityRegistry::builtin(),
            config: AccessConfig::default(),
        }
    }

    pub fn with_registry(mut self, registry: IdentityRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_config(mut self, config: AccessConfig) -> Self {
        self.config = config;
        self
    }

    /// Validate the configuration against the registry and build the
    /// controller.
    ///
    /// # Errors
    /// Returns `ControllerError::Core` if the configuration is unusable or a
    /// registered PIN does not fit in the entry buffer.
    pub fn build(self) -> Result<AccessController<G>> {
        self.config.validate()?;
        self.config.validate_registry(&self.registry)?;

        Ok(AccessController {
            door: self.door,
            registry: self.registry,
            ticks: Ticks::from_config(&self.config),
            session: EntrySession::new(self.config.max_pin_length),
            config: self.config,
            machine: PhaseMachine::new(),
            activity: Activity::AwaitingPin { notice: 0 },
            access_log: VecDeque::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use doorlock_core::Identity;
    use doorlock_hardware::lcd::LCD_COLUMNS;
    use doorlock_hardware::mock::{MockDoor, MockDoorHandle, mock_door};

    fn controller() -> (AccessController<MockDoor>, MockDoorHandle) {
        let (door, handle) = mock_door();
        let controller = AccessController::builder(door).build().unwrap();
        (controller, handle)
    }

    async fn poll_n(controller: &mut AccessController<MockDoor>, n: usize) -> PollOutcome {
        let mut last = None;
        for _ in 0..n {
            last = Some(controller.poll().await.unwrap());
        }
        last.unwrap()
    }

    #[test]
    fn test_default_ticks() {
        let ticks = Ticks::from_config(&AccessConfig::default());
        assert_eq!(ticks.card_window, 200);
        assert_eq!(ticks.notice, 40);
        assert_eq!(ticks.settle, 40);
        assert_eq!(ticks.motion_recheck, 100);
        assert_eq!(ticks.lockout_notice, 40);
    }

    #[test]
    fn test_builder_rejects_invalid_config() {
        let (door, _handle) = mock_door();
        let result = AccessController::builder(door)
            .with_config(AccessConfig {
                max_trials: 0,
                ..AccessConfig::default()
            })
            .build();
        assert!(matches!(
            result,
            Err(crate::error::ControllerError::Core(_))
        ));
    }

    #[test]
    fn test_builder_rejects_pins_longer_than_buffer() {
        let (door, _handle) = mock_door();
        let result = AccessController::builder(door)
            .with_config(AccessConfig {
                max_pin_length: 3,
                ..AccessConfig::default()
            })
            .build();

        let Err(crate::error::ControllerError::Core(err)) = result else {
            panic!("expected a configuration error");
        };
        assert!(err.to_string().contains("max_pin_length"));
    }

    #[test]
    fn test_messages_fit_display() {
        for msg in [
            MSG_PLEASE_WAIT,
            MSG_ENTER_PIN,
            MSG_SCAN_CARD,
            MSG_WRONG_PIN,
            MSG_TIMEOUT,
            MSG_WRONG_CARD,
            MSG_WELCOME,
            MSG_TOO_MANY_FAILS,
            MSG_SYSTEM_LOCKED,
            MSG_SYSTEM_HALTED,
        ] {
            assert!(msg.len() <= LCD_COLUMNS, "{msg} is too wide");
        }
    }

    #[tokio::test]
    async fn test_initial_state() {
        let (controller, _handle) = controller();
        assert_eq!(controller.phase(), Phase::AwaitingPin);
        assert_eq!(controller.trials(), 0);
        assert_eq!(controller.buffered_len(), 0);
        assert_eq!(controller.resolved_identity(), None);
    }

    #[tokio::test]
    async fn test_keys_are_echoed() {
        let (mut controller, handle) = controller();
        controller.show_prompt().await.unwrap();

        handle.keypad.type_str("12*").unwrap();
        poll_n(&mut controller, 3).await;

        assert_eq!(controller.buffered_len(), 3);
        assert_eq!(handle.display.line(0).trim_end(), "Enter your pin:");
        assert_eq!(handle.display.line(1).trim_end(), "12*");
    }

    #[tokio::test]
    async fn test_matching_pin_asks_for_card() {
        let (mut controller, handle) = controller();

        handle.keypad.type_str("1234#").unwrap();
        let outcome = poll_n(&mut controller, 5).await;

        assert_eq!(outcome.phase, Phase::AwaitingCard);
        assert!(outcome.transition.is_some());
        assert_eq!(controller.resolved_identity(), Some(IdentityId::new(1)));
        assert_eq!(controller.buffered_len(), 0);
        assert_eq!(handle.display.line(0).trim_end(), MSG_SCAN_CARD);
    }

    #[tokio::test]
    async fn test_wrong_pin_counts_a_trial() {
        let (mut controller, handle) = controller();

        handle.keypad.type_str("9999#").unwrap();
        let outcome = poll_n(&mut controller, 5).await;

        assert_eq!(outcome.phase, Phase::AwaitingPin);
        assert_eq!(
            outcome.rejection,
            Some(AccessError::InvalidCredential {
                factor: Factor::Pin
            })
        );
        assert_eq!(controller.trials(), 1);
        assert_eq!(controller.buffered_len(), 0);
        assert_eq!(handle.display.line(0).trim_end(), MSG_WRONG_PIN);
        assert_eq!(handle.display.cursor(), (0, 1));
    }

    #[tokio::test]
    async fn test_empty_submission_is_a_failure() {
        let (mut controller, handle) = controller();

        handle.keypad.type_str("#").unwrap();
        let outcome = controller.poll().await.unwrap();

        assert!(outcome.is_rejected());
        assert_eq!(controller.trials(), 1);
    }

    #[tokio::test]
    async fn test_capacity_exceeded() {
        let (door, handle) = mock_door();
        let mut controller = AccessController::builder(door)
            .with_config(AccessConfig {
                max_pin_length: 4,
                ..AccessConfig::default()
            })
            .build()
            .unwrap();
        controller.show_prompt().await.unwrap();

        handle.keypad.type_str("12345").unwrap();
        let outcome = poll_n(&mut controller, 5).await;

        assert_eq!(
            outcome.rejection,
            Some(AccessError::CapacityExceeded { capacity: 4 })
        );
        assert_eq!(controller.buffered_len(), 4);
        assert_eq!(handle.display.line(1).trim_end(), "1234");
    }

    #[tokio::test]
    async fn test_matching_pin_at_trial_limit_still_succeeds() {
        let (mut controller, handle) = controller();

        handle.keypad.type_str("0000#1111#2222#5555#").unwrap();
        let outcome = poll_n(&mut controller, 20).await;

        assert_eq!(outcome.phase, Phase::AwaitingCard);
        assert_eq!(controller.resolved_identity(), Some(IdentityId::new(0)));
    }

    #[tokio::test]
    async fn test_failure_at_limit_does_not_count() {
        let (mut controller, handle) = controller();

        handle.keypad.type_str("0000#1111#2222#").unwrap();
        poll_n(&mut controller, 15).await;
        assert_eq!(controller.trials(), 3);
        assert_eq!(handle.display.line(0).trim_end(), MSG_WRONG_PIN);

        handle.keypad.type_str("3#").unwrap();
        let outcome = poll_n(&mut controller, 2).await;

        assert!(outcome.is_rejected());
        assert_eq!(outcome.phase, Phase::AwaitingPin);
        assert_eq!(controller.trials(), 3);
        assert_eq!(controller.buffered_len(), 0);
    }

    #[tokio::test]
    async fn test_lockout_on_idle_poll_after_limit() {
        let (mut controller, handle) = controller();

        handle.keypad.type_str("0000#1111#2222#").unwrap();
        poll_n(&mut controller, 15).await;
        assert_eq!(controller.phase(), Phase::AwaitingPin);

        let outcome = controller.poll().await.unwrap();
        assert_eq!(outcome.phase, Phase::Lockout);
        assert_eq!(outcome.rejection, Some(AccessError::TrialsExhausted));
        assert_eq!(handle.display.line(0).trim_end(), MSG_TOO_MANY_FAILS);
        assert!(handle.alarm.is_high());
        assert!(handle.denied_led.is_high());
        assert_eq!(handle.lock.position(), Some(LockPosition::Lock));
    }

    #[tokio::test]
    async fn test_lockout_seals_then_clears_on_any_card() {
        let (mut controller, handle) = controller();

        handle.keypad.type_str("0000#1111#2222#").unwrap();
        poll_n(&mut controller, 16).await;
        assert_eq!(controller.phase(), Phase::Lockout);

        poll_n(&mut controller, 40).await;
        assert_eq!(handle.display.line(0).trim_end(), MSG_SYSTEM_LOCKED);
        assert_eq!(controller.trials(), 0);

        // Unregistered card.
        handle.rfid.present_uid([0x01, 0x02, 0x03, 0x04]).unwrap();
        let outcome = controller.poll().await.unwrap();

        assert_eq!(outcome.phase, Phase::AwaitingPin);
        assert!(!handle.alarm.is_high());
        assert!(!handle.denied_led.is_high());
        assert_eq!(handle.rfid.halt_count(), 1);
        assert_eq!(handle.display.line(0).trim_end(), MSG_ENTER_PIN);
        assert_eq!(handle.display.cursor(), (0, 1));
    }

    #[tokio::test]
    async fn test_card_during_alarm_waits_for_seal() {
        let (mut controller, handle) = controller();

        handle.keypad.type_str("0000#1111#2222#").unwrap();
        poll_n(&mut controller, 16).await;
        handle.rfid.present_tag("c976133f").unwrap();

        poll_n(&mut controller, 39).await;
        assert_eq!(controller.phase(), Phase::Lockout);
        assert!(handle.alarm.is_high());

        // Last alarm tick seals, the next one sees the card.
        controller.poll().await.unwrap();
        assert_eq!(controller.phase(), Phase::Lockout);
        controller.poll().await.unwrap();
        assert_eq!(controller.phase(), Phase::AwaitingPin);
    }

    #[tokio::test]
    async fn test_keys_ignored_while_waiting_for_card() {
        let (mut controller, handle) = controller();

        handle.keypad.type_str("5555#").unwrap();
        poll_n(&mut controller, 5).await;

        handle.keypad.type_str("99").unwrap();
        poll_n(&mut controller, 2).await;

        assert_eq!(controller.phase(), Phase::AwaitingCard);
        assert_eq!(controller.buffered_len(), 0);
        assert_eq!(handle.display.line(1).trim_end(), "");
    }

    #[tokio::test]
    async fn test_card_window_timeout() {
        let (mut controller, handle) = controller();

        handle.keypad.type_str("8888#").unwrap();
        poll_n(&mut controller, 5).await;

        poll_n(&mut controller, 199).await;
        assert_eq!(controller.phase(), Phase::AwaitingCard);

        let outcome = controller.poll().await.unwrap();
        assert_eq!(outcome.phase, Phase::AwaitingPin);
        assert_eq!(outcome.rejection, Some(AccessError::Timeout));
        assert_eq!(controller.resolved_identity(), None);
        assert!(controller.is_showing_notice());
        assert_eq!(handle.display.line(0).trim_end(), MSG_TIMEOUT);
    }

    #[tokio::test]
    async fn test_notice_discards_keys_then_prompts() {
        let (mut controller, handle) = controller();

        handle.keypad.type_str("5555#").unwrap();
        poll_n(&mut controller, 5).await;
        handle.rfid.present_tag("025c5e28").unwrap();
        controller.poll().await.unwrap();
        assert!(controller.is_showing_notice());

        handle.keypad.type_str("12").unwrap();
        poll_n(&mut controller, 39).await;
        assert_eq!(handle.display.line(0).trim_end(), MSG_WRONG_CARD);

        controller.poll().await.unwrap();
        assert!(!controller.is_showing_notice());
        assert_eq!(controller.buffered_len(), 0);
        assert_eq!(handle.display.line(0).trim_end(), MSG_ENTER_PIN);
        assert_eq!(handle.display.cursor(), (0, 1));
    }

    #[tokio::test]
    async fn test_failed_card_read_is_retried() {
        let (mut controller, handle) = controller();

        handle.keypad.type_str("5555#").unwrap();
        poll_n(&mut controller, 5).await;
        handle.rfid.fail_reads(1);
        handle.rfid.present_tag("c976133f").unwrap();

        let outcome = controller.poll().await.unwrap();
        assert_eq!(outcome.phase, Phase::AwaitingCard);
        assert!(!outcome.is_rejected());
        assert_eq!(handle.rfid.halt_count(), 0);

        let outcome = controller.poll().await.unwrap();
        assert_eq!(outcome.phase, Phase::Granted);
        assert_eq!(handle.lock.position(), Some(LockPosition::Open));
        assert_eq!(handle.rfid.halt_count(), 1);
    }

    #[tokio::test]
    async fn test_failed_reads_count_toward_card_window() {
        let (mut controller, handle) = controller();

        handle.keypad.type_str("5555#").unwrap();
        poll_n(&mut controller, 5).await;
        handle.rfid.fail_reads(usize::MAX);
        handle.rfid.present_tag("c976133f").unwrap();

        poll_n(&mut controller, 199).await;
        assert_eq!(controller.phase(), Phase::AwaitingCard);

        let outcome = controller.poll().await.unwrap();
        assert_eq!(outcome.rejection, Some(AccessError::Timeout));
        assert_eq!(handle.lock.count(LockPosition::Open), 0);
    }

    #[tokio::test]
    async fn test_granted_and_relocked() {
        let (mut controller, handle) = controller();

        handle.keypad.type_str("8888#").unwrap();
        poll_n(&mut controller, 5).await;
        handle.rfid.present_tag("dea95415").unwrap();

        let outcome = controller.poll().await.unwrap();
        assert_eq!(outcome.phase, Phase::Granted);
        assert_eq!(handle.lock.position(), Some(LockPosition::Open));
        assert!(handle.granted_led.is_high());
        assert_eq!(handle.notifier.sent_text(), vec!["Silva".to_string()]);
        assert_eq!(handle.display.line(0).trim_end(), MSG_WELCOME);

        poll_n(&mut controller, 39).await;
        assert_eq!(controller.phase(), Phase::Granted);
        assert_eq!(handle.motion.reads(), 0);

        let outcome = controller.poll().await.unwrap();
        assert_eq!(outcome.phase, Phase::AwaitingPin);
        assert_eq!(handle.lock.position(), Some(LockPosition::Lock));
        assert!(!handle.granted_led.is_high());
        assert_eq!(controller.resolved_identity(), None);
        assert_eq!(
            controller.access_log().back().map(|r| r.outcome),
            Some(AccessOutcome::Granted)
        );
    }

    #[tokio::test]
    async fn test_motion_extends_hold_without_reopening() {
        let (mut controller, handle) = controller();

        handle.keypad.type_str("5555#").unwrap();
        poll_n(&mut controller, 5).await;
        handle.rfid.present_tag("c976133f").unwrap();
        controller.poll().await.unwrap();

        handle.motion.set_motion(true);
        poll_n(&mut controller, 40).await;
        poll_n(&mut controller, 100).await;
        assert_eq!(controller.phase(), Phase::Granted);
        assert_eq!(handle.motion.reads(), 2);

        handle.motion.set_motion(false);
        let outcome = poll_n(&mut controller, 100).await;

        assert_eq!(outcome.phase, Phase::AwaitingPin);
        assert_eq!(handle.motion.reads(), 3);
        assert_eq!(
            handle.lock.history(),
            vec![LockPosition::Open, LockPosition::Lock]
        );
    }

    #[tokio::test]
    async fn test_unknown_resolved_identity_is_an_error() {
        let (door, handle) = mock_door();
        let registry = IdentityRegistry::new(vec![
            Identity::new("Ana", "4321", "0a0b0c0d").unwrap(),
        ]);
        let mut controller = AccessController::builder(door)
            .with_registry(registry)
            .build()
            .unwrap();

        handle.keypad.type_str("4321#").unwrap();
        poll_n(&mut controller, 5).await;

        // Swap in a registry that no longer holds the identity.
        controller.registry = IdentityRegistry::new(Vec::new());
        handle.rfid.present_tag("0a0b0c0d").unwrap();

        let err = controller.poll().await.unwrap_err();
        assert!(matches!(err, crate::error::ControllerError::Core(_)));
    }

    #[tokio::test]
    async fn test_shutdown_from_granted() {
        let (mut controller, handle) = controller();

        handle.keypad.type_str("5555#").unwrap();
        poll_n(&mut controller, 5).await;
        handle.rfid.present_tag("c976133f").unwrap();
        controller.poll().await.unwrap();

        controller.shutdown().await.unwrap();

        assert_eq!(controller.phase(), Phase::AwaitingPin);
        assert_eq!(controller.resolved_identity(), None);
        assert_eq!(handle.lock.position(), Some(LockPosition::Lock));
        assert!(!handle.granted_led.is_high());
        assert_eq!(handle.display.line(0).trim_end(), MSG_SYSTEM_HALTED);
    }

    #[tokio::test]
    async fn test_shutdown_with_jammed_lock_still_resets() {
        let (mut controller, handle) = controller();

        handle.keypad.type_str("5555#").unwrap();
        poll_n(&mut controller, 5).await;
        handle.rfid.present_tag("c976133f").unwrap();
        controller.poll().await.unwrap();
        assert!(handle.granted_led.is_high());

        handle.lock.set_jammed(true);
        let err = controller.shutdown().await.unwrap_err();

        assert!(matches!(
            err,
            crate::error::ControllerError::Hardware(
                doorlock_hardware::HardwareError::ActuationFailed { .. }
            )
        ));
        assert_eq!(handle.lock.position(), Some(LockPosition::Open));
        assert!(!handle.granted_led.is_high());
        assert!(!handle.denied_led.is_high());
        assert!(!handle.alarm.is_high());
        assert_eq!(controller.phase(), Phase::AwaitingPin);
        assert_eq!(controller.resolved_identity(), None);
        assert_eq!(handle.display.line(0).trim_end(), MSG_SYSTEM_HALTED);
    }

    #[test]
    fn test_discarded_key_class() {
        assert_eq!(discarded(Key::Digit(4)), "digit");
        assert_eq!(discarded(Key::Hash), "hash");
    }
}
