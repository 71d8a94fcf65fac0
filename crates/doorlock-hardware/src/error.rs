//! Errors raised by door peripherals.
//!
//! Inputs fail by going away ([`HardwareError::Disconnected`]), by garbling
//! the link ([`HardwareError::CommunicationError`]) or by handing back
//! something unusable ([`HardwareError::InvalidData`],
//! [`HardwareError::CardReadError`]). Outputs fail by not moving
//! ([`HardwareError::ActuationFailed`]).

pub type Result<T> = std::result::Result<T, HardwareError>;

#[derive(Debug, thiserror::Error)]
pub enum HardwareError {
    /// The device or its input channel is gone.
    #[error("Device disconnected: {device}")]
    Disconnected { device: String },

    /// The bus to the device returned garbage or nothing.
    #[error("Communication error: {message}")]
    CommunicationError { message: String },

    /// A value from or for the device is malformed (bad key legend, bad UID,
    /// cursor off the display).
    #[error("Invalid data: {message}")]
    InvalidData { message: String },

    /// A card was reported present but its UID could not be read.
    #[error("Card read error: {message}")]
    CardReadError { message: String },

    /// The lock or an output line did not switch.
    #[error("Actuation failed: {message}")]
    ActuationFailed { message: String },
}

impl HardwareError {
    pub fn disconnected(device: impl Into<String>) -> Self {
        Self::Disconnected {
            device: device.into(),
        }
    }

    pub fn communication(message: impl Into<String>) -> Self {
        Self::CommunicationError {
            message: message.into(),
        }
    }

    pub fn invalid_data(message: impl Into<String>) -> Self {
        Self::InvalidData {
            message: message.into(),
        }
    }

    pub fn card_read(message: impl Into<String>) -> Self {
        Self::CardReadError {
            message: message.into(),
        }
    }

    pub fn actuation(message: impl Into<String>) -> Self {
        Self::ActuationFailed {
            message: message.into(),
        }
    }

    /// Whether retrying the same read on a later poll may succeed.
    ///
    /// A garbled transfer or a failed UID read usually clears once the card
    /// settles in the field; a missing device or bad data does not.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::CommunicationError { .. } | Self::CardReadError { .. }
        )
    }
}
