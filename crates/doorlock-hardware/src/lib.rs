//! Hardware device abstraction layer for the door lock controller.
//!
//! This crate provides trait-based abstractions for the peripherals of a
//! two-factor door: a 4x4 keypad, an MFRC522-class RFID reader, a motion
//! sensor, a 16x2 character LCD, a servo lock, two indicator LEDs, an alarm
//! buzzer and a companion notification module. Mock implementations make the
//! whole door drivable from tests and from the CLI.
//!
//! # Design Philosophy
//!
//! - **Async-first**: All I/O operations use native `async fn` in traits
//!   (Rust 1.90 + Edition 2024 RPITIT).
//! - **Poll-shaped inputs**: Keypad, reader and sensor calls return what the
//!   device has right now and never wait for the user.
//! - **Thread-safe**: All traits require `Send + Sync`.
//! - **Error-aware**: All operations return `Result<T>` with a
//!   [`HardwareError`].
//!
//! # The Door
//!
//! The controller drives a single [`DoorGateway`]. [`DoorPeripherals`]
//! assembles one from individual devices:
//!
//! ```no_run
//! use doorlock_hardware::devices::DoorGateway;
//! use doorlock_hardware::error::Result;
//! use doorlock_hardware::types::{Indicator, LockPosition, SignalLevel};
//!
//! async fn open_door<G: DoorGateway>(door: &mut G, name: &str) -> Result<()> {
//!     door.notify(name.as_bytes()).await?;
//!     door.set_lock(LockPosition::Open).await?;
//!     door.set_indicator(Indicator::Granted, SignalLevel::High).await
//! }
//! ```
//!
//! # Mock Implementations
//!
//! [`mock::mock_door`] returns a fully mocked door and a
//! [`MockDoorHandle`](mock::MockDoorHandle) that presses keys, presents
//! cards, sets motion, and reads back the display and every output.
//!
//! [`DoorGateway`]: devices::DoorGateway
//! [`DoorPeripherals`]: devices::DoorPeripherals

pub mod devices;
pub mod error;
pub mod lcd;
pub mod mock;
pub mod traits;
pub mod types;

// Re-export commonly used types for convenience
pub use devices::{DoorGateway, DoorPeripherals};
pub use error::{HardwareError, Result};
pub use lcd::VirtualLcd;
pub use traits::{
    CardData, DisplayDevice, Key, KeypadDevice, LockActuator, MotionSensor, Notifier, RfidDevice,
    SignalLine, TERMINATOR_KEY, UID_LENGTH,
};
pub use types::{Indicator, LockPosition, SignalLevel};
