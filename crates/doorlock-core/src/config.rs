//! Access controller configuration.
//!
//! Timing values are stored in milliseconds so configuration files stay
//! readable; accessors return [`Duration`]. The controller itself works in
//! poll ticks, see [`AccessConfig::ticks`].
//!
//! # Examples
//!
//! ```
//! use doorlock_core::AccessConfig;
//!
//! let config = AccessConfig::default();
//! assert_eq!(config.max_trials, 3);
//! assert_eq!(config.ticks(config.card_scan_window()), 200);
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{
    Result,
    constants::{
        CARD_SCAN_WINDOW_MS, DEFAULT_MAX_PIN_LENGTH, DEFAULT_MAX_PIN_TRIALS, GRANT_SETTLE_MS,
        LOCKOUT_NOTICE_MS, MOTION_RECHECK_MS, NOTICE_DURATION_MS, POLL_INTERVAL_MS,
    },
    error::Error,
    registry::IdentityRegistry,
};

/// Retry, capacity and timing policy of the access controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccessConfig {
    /// Failed PIN submissions before lockout.
    pub max_trials: u8,

    /// Hard capacity of the PIN entry buffer.
    pub max_pin_length: usize,

    pub poll_interval_ms: u64,

    pub card_scan_window_ms: u64,

    pub notice_ms: u64,

    pub grant_settle_ms: u64,

    pub motion_recheck_ms: u64,

    pub lockout_notice_ms: u64,
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            max_trials: DEFAULT_MAX_PIN_TRIALS,
            max_pin_length: DEFAULT_MAX_PIN_LENGTH,
            poll_interval_ms: POLL_INTERVAL_MS,
            card_scan_window_ms: CARD_SCAN_WINDOW_MS,
            notice_ms: NOTICE_DURATION_MS,
            grant_settle_ms: GRANT_SETTLE_MS,
            motion_recheck_ms: MOTION_RECHECK_MS,
            lockout_notice_ms: LOCKOUT_NOTICE_MS,
        }
    }
}

impl AccessConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn card_scan_window(&self) -> Duration {
        Duration::from_millis(self.card_scan_window_ms)
    }

    pub fn notice(&self) -> Duration {
        Duration::from_millis(self.notice_ms)
    }

    pub fn grant_settle(&self) -> Duration {
        Duration::from_millis(self.grant_settle_ms)
    }

    pub fn motion_recheck(&self) -> Duration {
        Duration::from_millis(self.motion_recheck_ms)
    }

    pub fn lockout_notice(&self) -> Duration {
        Duration::from_millis(self.lockout_notice_ms)
    }

    /// Number of poll ticks covering `duration`, rounded up, at least one.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::time::Duration;
    /// use doorlock_core::AccessConfig;
    ///
    /// let config = AccessConfig::default();
    /// assert_eq!(config.ticks(Duration::from_secs(2)), 40);
    /// assert_eq!(config.ticks(Duration::from_millis(60)), 2);
    /// assert_eq!(config.ticks(Duration::ZERO), 1);
    /// ```
    pub fn ticks(&self, duration: Duration) -> u32 {
        let poll = self.poll_interval_ms.max(1);
        let ticks = (duration.as_millis() as u64).div_ceil(poll).max(1);
        u32::try_from(ticks).unwrap_or(u32::MAX)
    }

    /// Validate the policy.
    ///
    /// # Errors
    /// Returns `Error::Config` if any value would make the controller
    /// unusable.
    pub fn validate(&self) -> Result<()> {
        if self.max_trials == 0 {
            return Err(Error::Config("max_trials must be at least 1".to_string()));
        }

        if self.max_pin_length == 0 {
            return Err(Error::Config(
                "max_pin_length must be at least 1".to_string(),
            ));
        }

        if self.poll_interval_ms == 0 {
            return Err(Error::Config(
                "poll_interval_ms must be greater than zero".to_string(),
            ));
        }

        for (name, value) in [
            ("card_scan_window_ms", self.card_scan_window_ms),
            ("notice_ms", self.notice_ms),
            ("grant_settle_ms", self.grant_settle_ms),
            ("motion_recheck_ms", self.motion_recheck_ms),
            ("lockout_notice_ms", self.lockout_notice_ms),
        ] {
            if value < self.poll_interval_ms {
                return Err(Error::Config(format!(
                    "{name} ({value} ms) is shorter than one poll interval ({} ms)",
                    self.poll_interval_ms
                )));
            }
        }

        Ok(())
    }

    /// Check that every PIN in `registry` can be typed into the entry buffer.
    ///
    /// # Errors
    /// Returns `Error::Config` naming the first identity whose PIN is longer
    /// than `max_pin_length`.
    pub fn validate_registry(&self, registry: &IdentityRegistry) -> Result<()> {
        for (id, identity) in registry.iter() {
            if identity.pin().len() > self.max_pin_length {
                return Err(Error::Config(format!(
                    "identity {id} ({}) has a PIN longer than max_pin_length ({})",
                    identity.name(),
                    self.max_pin_length
                )));
            }
        }
        Ok(())
    }
}

/// Complete configuration file: policy plus enrolled identities.
///
/// ```json
/// {
///   "access": { "max_trials": 3, "card_scan_window_ms": 10000 },
///   "identities": [
///     { "name": "Pedro", "pin": "1234", "rfid_tag": "025c5e28" }
///   ]
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DoorlockConfig {
    pub access: AccessConfig,

    /// Enrolled identities. Empty means the built-in registry.
    pub identities: IdentityRegistry,
}

impl DoorlockConfig {
    /// Parse and validate a JSON configuration.
    ///
    /// # Errors
    /// Returns an error if the JSON is malformed, a credential is invalid, or
    /// the policy fails validation.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: DoorlockConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON configuration file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or fails
    /// [`from_json_str`](Self::from_json_str).
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// The configured registry, or the built-in one when none is configured.
    pub fn registry(&self) -> IdentityRegistry {
        if self.identities.is_empty() {
            IdentityRegistry::builtin()
        } else {
            self.identities.clone()
        }
    }

    /// Validate the policy and every identity against it.
    ///
    /// # Errors
    /// Returns `Error::Config` if a PIN cannot fit in the entry buffer, or
    /// `Error::InvalidName` for an unusable display name.
    pub fn validate(&self) -> Result<()> {
        self.access.validate()?;

        let registry = self.registry();
        for (id, identity) in registry.iter() {
            let name = identity.name();
            if name.trim().is_empty() || !name.is_ascii() {
                return Err(Error::InvalidName(format!(
                    "identity {id} name must be non-empty ASCII"
                )));
            }
        }

        self.access.validate_registry(&registry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(AccessConfig::default().validate().is_ok());
        assert!(DoorlockConfig::default().validate().is_ok());
    }

    #[test]
    fn test_default_ticks() {
        let config = AccessConfig::default();
        assert_eq!(config.ticks(config.card_scan_window()), 200);
        assert_eq!(config.ticks(config.notice()), 40);
        assert_eq!(config.ticks(config.grant_settle()), 40);
        assert_eq!(config.ticks(config.motion_recheck()), 100);
        assert_eq!(config.ticks(config.lockout_notice()), 40);
    }

    #[test]
    fn test_zero_trials_rejected() {
        let config = AccessConfig {
            max_trials: 0,
            ..AccessConfig::default()
        };
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_window_shorter_than_poll_rejected() {
        let config = AccessConfig {
            card_scan_window_ms: 10,
            ..AccessConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("card_scan_window_ms"));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = DoorlockConfig::from_json_str(r#"{"access": {"max_trials": 5}}"#).unwrap();
        assert_eq!(config.access.max_trials, 5);
        assert_eq!(config.access.poll_interval_ms, POLL_INTERVAL_MS);
        assert_eq!(config.registry().len(), 3);
    }

    #[test]
    fn test_pin_longer_than_buffer_rejected() {
        let json = r#"{
            "access": {"max_pin_length": 4},
            "identities": [{"name": "Long", "pin": "123456", "rfid_tag": "01020304"}]
        }"#;
        assert!(matches!(
            DoorlockConfig::from_json_str(json),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_builtin_pins_checked_against_buffer() {
        let result = DoorlockConfig::from_json_str(r#"{"access": {"max_pin_length": 3}}"#);
        let err = result.unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().contains("Lewandowski"));

        assert!(DoorlockConfig::from_json_str(r#"{"access": {"max_pin_length": 4}}"#).is_ok());
    }

    #[test]
    fn test_validate_registry() {
        let config = AccessConfig {
            max_pin_length: 3,
            ..AccessConfig::default()
        };
        assert!(config.validate_registry(&IdentityRegistry::builtin()).is_err());
        assert!(config.validate_registry(&IdentityRegistry::new(Vec::new())).is_ok());
        assert!(
            AccessConfig::default()
                .validate_registry(&IdentityRegistry::builtin())
                .is_ok()
        );
    }

    #[test]
    fn test_configured_identities_replace_builtin() {
        let json = r#"{"identities": [{"name": "Ana", "pin": "4321", "rfid_tag": "0a0b0c0d"}]}"#;
        let registry = DoorlockConfig::from_json_str(json).unwrap().registry();

        assert_eq!(registry.len(), 1);
        assert!(registry.match_pin("5555").is_none());
        assert!(registry.match_pin("4321").is_some());
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            DoorlockConfig::from_json_str("{"),
            Err(Error::ConfigParse(_))
        ));
    }
}
