use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    // Credential format errors
    #[error("Invalid PIN format: {0}")]
    InvalidPinFormat(String),

    #[error("Invalid RFID tag format: {0}")]
    InvalidTagFormat(String),

    #[error("Invalid identity name: {0}")]
    InvalidName(String),

    #[error("Unknown identity: {0}")]
    UnknownIdentity(usize),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Configuration parse error: {0}")]
    ConfigParse(#[from] serde_json::Error),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
