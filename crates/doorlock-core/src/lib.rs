//! Core types for the two-factor door lock.
//!
//! Credential types, the identity registry with its credential matcher,
//! access configuration and the shared error type. This crate has no
//! hardware or async dependencies.

pub mod config;
pub mod constants;
pub mod error;
pub mod registry;
pub mod types;

pub use config::{AccessConfig, DoorlockConfig};
pub use error::{Error, Result};
pub use registry::{ConfigHazard, Identity, IdentityRegistry};
pub use types::*;
