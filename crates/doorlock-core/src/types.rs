use crate::{
    Result,
    constants::{PIN_LETTERS, RFID_TAG_LENGTH},
    error::Error,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use subtle::ConstantTimeEq;

/// Index of an identity inside an [`IdentityRegistry`](crate::IdentityRegistry).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct IdentityId(usize);

impl IdentityId {
    #[must_use]
    pub fn new(index: usize) -> Self {
        IdentityId(index)
    }

    /// Position of the identity in registry order.
    #[must_use]
    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for IdentityId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Registered PIN (digits 0-9 and uppercase letters A-D).
///
/// # Security
/// Comparison against an entered candidate is constant-time, and the
/// `Debug` output never reveals the digits.
#[derive(Clone, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Pin(String);

impl Pin {
    /// Create a new PIN with validation.
    ///
    /// No normalization is applied: lowercase letters are rejected rather
    /// than uppercased, because entered PINs are compared exactly.
    ///
    /// # Errors
    /// Returns `Error::InvalidPinFormat` if the PIN is empty or contains a
    /// character outside `0-9` and `A-D`.
    pub fn new(pin: &str) -> Result<Self> {
        if pin.is_empty() {
            return Err(Error::InvalidPinFormat("PIN cannot be empty".to_string()));
        }

        if let Some(bad) = pin.chars().find(|c| !is_pin_char(*c)) {
            return Err(Error::InvalidPinFormat(format!(
                "PIN may only contain 0-9 and A-D, got '{bad}'"
            )));
        }

        Ok(Pin(pin.to_string()))
    }

    /// Number of characters in the PIN.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Exact, case-sensitive comparison against an entered candidate.
    #[must_use]
    pub fn matches(&self, candidate: &str) -> bool {
        self.0.as_bytes().ct_eq(candidate.as_bytes()).into()
    }

    /// Get the PIN as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl PartialEq for Pin {
    fn eq(&self, other: &Self) -> bool {
        self.matches(&other.0)
    }
}

impl fmt::Debug for Pin {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Pin({})", "*".repeat(self.0.len()))
    }
}

impl TryFrom<String> for Pin {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Pin::new(&value)
    }
}

impl From<Pin> for String {
    fn from(pin: Pin) -> Self {
        pin.0
    }
}

impl std::str::FromStr for Pin {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Pin::new(s)
    }
}

/// Normalized RFID tag: four UID bytes as eight lowercase hex digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RfidTag(String);

impl RfidTag {
    /// Create a tag from its configured textual form.
    ///
    /// The text must already be normalized. Uppercase or short forms are
    /// rejected so that the registry never holds a tag a reader could not
    /// produce.
    ///
    /// # Errors
    /// Returns `Error::InvalidTagFormat` if the tag is not exactly eight
    /// lowercase hexadecimal digits.
    pub fn new(tag: &str) -> Result<Self> {
        if tag.len() != RFID_TAG_LENGTH {
            return Err(Error::InvalidTagFormat(format!(
                "RFID tag must be {RFID_TAG_LENGTH} hex digits, got {}",
                tag.len()
            )));
        }

        if !tag
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
        {
            return Err(Error::InvalidTagFormat(format!(
                "RFID tag must be lowercase hexadecimal, got '{tag}'"
            )));
        }

        Ok(RfidTag(tag.to_string()))
    }

    /// Normalize UID bytes read from a card.
    ///
    /// Every byte becomes exactly two lowercase hex digits, zero-padded.
    ///
    /// # Examples
    ///
    /// ```
    /// use doorlock_core::RfidTag;
    ///
    /// let tag = RfidTag::from_uid(&[0x02, 0x5c, 0x5e, 0x28]);
    /// assert_eq!(tag.as_str(), "025c5e28");
    /// ```
    #[must_use]
    pub fn from_uid(uid: &[u8; 4]) -> Self {
        RfidTag(uid.iter().map(|b| format!("{b:02x}")).collect())
    }

    /// Get the tag as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RfidTag {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for RfidTag {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        RfidTag::new(&value)
    }
}

impl From<RfidTag> for String {
    fn from(tag: RfidTag) -> Self {
        tag.0
    }
}

impl std::str::FromStr for RfidTag {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        RfidTag::new(s)
    }
}

/// Returns `true` if `c` may appear in a registered PIN.
#[inline]
#[must_use]
pub fn is_pin_char(c: char) -> bool {
    c.is_ascii_digit() || PIN_LETTERS.contains(&c)
}
