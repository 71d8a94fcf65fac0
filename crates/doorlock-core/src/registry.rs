//! Identity registry and credential matcher.
//!
//! The registry is a small, read-only list of people allowed through the
//! door. Each identity holds a PIN (first factor) and an RFID tag (second
//! factor). Matching is a linear scan in registry order.
//!
//! # Duplicate credentials
//!
//! Two identities sharing a PIN, or sharing a tag, is a configuration
//! hazard. The registry does not reject or repair it: the lowest-indexed
//! identity wins every PIN match, so the later identity can never get past
//! the first factor. [`IdentityRegistry::hazards`] lists every such clash so
//! callers can surface it at startup.
//!
//! # Examples
//!
//! ```
//! use doorlock_core::{IdentityRegistry, RfidTag};
//!
//! let registry = IdentityRegistry::builtin();
//!
//! let id = registry.match_pin("5555").unwrap();
//! assert_eq!(registry.get(id).unwrap().name(), "Lewandowski");
//!
//! let card = RfidTag::from_uid(&[0xc9, 0x76, 0x13, 0x3f]);
//! assert!(registry.match_rfid(id, &card));
//!
//! // Pedro's card is valid, but not for Lewandowski's PIN.
//! let other = RfidTag::from_uid(&[0x02, 0x5c, 0x5e, 0x28]);
//! assert!(!registry.match_rfid(id, &other));
//! ```

use crate::{
    Result,
    error::Error,
    types::{IdentityId, Pin, RfidTag},
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A person allowed through the door.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    name: String,
    pin: Pin,
    rfid_tag: RfidTag,
}

impl Identity {
    /// Create a new identity.
    ///
    /// # Errors
    /// Returns an error if the name is empty or not ASCII (it is shown on a
    /// character LCD and sent to the notification module), or if the PIN or
    /// tag are malformed.
    pub fn new(name: &str, pin: &str, rfid_tag: &str) -> Result<Self> {
        let name = name.trim();
        if name.is_empty() || !name.is_ascii() {
            return Err(Error::InvalidName(format!(
                "Identity name must be non-empty ASCII, got '{name}'"
            )));
        }

        Ok(Self {
            name: name.to_string(),
            pin: Pin::new(pin)?,
            rfid_tag: RfidTag::new(rfid_tag)?,
        })
    }

    /// Display label, also the payload sent to the notification module.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn pin(&self) -> &Pin {
        &self.pin
    }

    pub fn rfid_tag(&self) -> &RfidTag {
        &self.rfid_tag
    }
}

/// Duplicate credential found in the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigHazard {
    /// `shadowed` can never match a PIN because `first` holds the same one.
    DuplicatePin {
        first: IdentityId,
        shadowed: IdentityId,
    },

    /// Both identities accept the same card.
    DuplicateTag {
        first: IdentityId,
        shadowed: IdentityId,
    },
}

impl fmt::Display for ConfigHazard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigHazard::DuplicatePin { first, shadowed } => write!(
                f,
                "identity {shadowed} shares its PIN with {first}; {first} wins every match"
            ),
            ConfigHazard::DuplicateTag { first, shadowed } => {
                write!(f, "identity {shadowed} shares its RFID tag with {first}")
            }
        }
    }
}

/// Read-only registry of identities.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdentityRegistry {
    identities: Vec<Identity>,
}

impl IdentityRegistry {
    /// Create a registry from identities in match-priority order.
    pub fn new(identities: Vec<Identity>) -> Self {
        Self { identities }
    }

    /// The identities enrolled on the deployed lock.
    pub fn builtin() -> Self {
        let identities = [
            ("Lewandowski", "5555", "c976133f"),
            ("Pedro", "1234", "025c5e28"),
            ("Silva", "8888", "dea95415"),
        ]
        .into_iter()
        .filter_map(|(name, pin, tag)| Identity::new(name, pin, tag).ok())
        .collect();

        Self::new(identities)
    }

    /// Find the identity whose PIN equals `candidate` exactly.
    ///
    /// Returns the first match in registry order. See the module docs for
    /// what that means when PINs are duplicated.
    pub fn match_pin(&self, candidate: &str) -> Option<IdentityId> {
        self.identities
            .iter()
            .position(|identity| identity.pin.matches(candidate))
            .map(IdentityId::new)
    }

    /// Check a scanned tag against one specific identity.
    ///
    /// Only the identity already established by PIN is consulted. A tag
    /// belonging to any other registered identity is a mismatch.
    pub fn match_rfid(&self, identity: IdentityId, candidate: &RfidTag) -> bool {
        self.identities
            .get(identity.index())
            .is_some_and(|registered| registered.rfid_tag == *candidate)
    }

    /// Look up an identity.
    pub fn get(&self, id: IdentityId) -> Option<&Identity> {
        self.identities.get(id.index())
    }

    /// Look up an identity, failing if the id is stale.
    ///
    /// # Errors
    /// Returns `Error::UnknownIdentity` if the id is out of range.
    pub fn require(&self, id: IdentityId) -> Result<&Identity> {
        self.get(id).ok_or(Error::UnknownIdentity(id.index()))
    }

    pub fn len(&self) -> usize {
        self.identities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.identities.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (IdentityId, &Identity)> {
        self.identities
            .iter()
            .enumerate()
            .map(|(index, identity)| (IdentityId::new(index), identity))
    }

    /// List every duplicated PIN and tag, in registry order.
    pub fn hazards(&self) -> Vec<ConfigHazard> {
        let mut hazards = Vec::new();

        for (later, identity) in self.identities.iter().enumerate() {
            let earlier = &self.identities[..later];

            if let Some(first) = earlier.iter().position(|e| e.pin == identity.pin) {
                hazards.push(ConfigHazard::DuplicatePin {
                    first: IdentityId::new(first),
                    shadowed: IdentityId::new(later),
                });
            }

            if let Some(first) = earlier.iter().position(|e| e.rfid_tag == identity.rfid_tag) {
                hazards.push(ConfigHazard::DuplicateTag {
                    first: IdentityId::new(first),
                    shadowed: IdentityId::new(later),
                });
            }
        }

        hazards
    }
}
