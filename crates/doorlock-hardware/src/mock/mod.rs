//! Mock device implementations for testing and development.
//!
//! Every mock comes paired with a handle. The device half is moved into the
//! door; the handle stays with the test or the CLI to drive inputs and
//! observe outputs.

pub mod display;
pub mod keypad;
pub mod motion;
pub mod notifier;
pub mod outputs;
pub mod rfid;

// Re-export commonly used types
pub use display::{MockDisplay, MockDisplayHandle};
pub use keypad::{MockKeypad, MockKeypadHandle};
pub use motion::{MockMotionHandle, MockMotionSensor};
pub use notifier::{MockNotifier, MockNotifierHandle};
pub use outputs::{MockLock, MockLockHandle, MockSignal, MockSignalHandle};
pub use rfid::{MockRfid, MockRfidHandle};

use crate::devices::DoorPeripherals;

/// A door built entirely from mocks.
pub type MockDoor = DoorPeripherals<
    MockKeypad,
    MockRfid,
    MockMotionSensor,
    MockDisplay,
    MockLock,
    MockSignal,
    MockNotifier,
>;

/// Handles for every device of a [`MockDoor`].
#[derive(Debug, Clone)]
pub struct MockDoorHandle {
    pub keypad: MockKeypadHandle,
    pub rfid: MockRfidHandle,
    pub motion: MockMotionHandle,
    pub display: MockDisplayHandle,
    pub lock: MockLockHandle,
    pub granted_led: MockSignalHandle,
    pub denied_led: MockSignalHandle,
    pub alarm: MockSignalHandle,
    pub notifier: MockNotifierHandle,
}

/// Build a mock door whose companion module is already ready.
pub fn mock_door() -> (MockDoor, MockDoorHandle) {
    mock_door_with_notifier(MockNotifier::new())
}

/// Build a mock door around a specific notifier, e.g.
/// [`MockNotifier::offline`].
pub fn mock_door_with_notifier(
    (notifier, notifier_handle): (MockNotifier, MockNotifierHandle),
) -> (MockDoor, MockDoorHandle) {
    let (keypad, keypad_handle) = MockKeypad::new();
    let (rfid, rfid_handle) = MockRfid::new();
    let (motion, motion_handle) = MockMotionSensor::new();
    let (display, display_handle) = MockDisplay::new();
    let (lock, lock_handle) = MockLock::new();
    let (granted_led, granted_handle) = MockSignal::new();
    let (denied_led, denied_handle) = MockSignal::new();
    let (alarm, alarm_handle) = MockSignal::new();

    let door = DoorPeripherals {
        keypad,
        rfid,
        motion,
        display,
        lock,
        granted_led,
        denied_led,
        alarm,
        notifier,
    };

    let handle = MockDoorHandle {
        keypad: keypad_handle,
        rfid: rfid_handle,
        motion: motion_handle,
        display: display_handle,
        lock: lock_handle,
        granted_led: granted_handle,
        denied_led: denied_handle,
        alarm: alarm_handle,
        notifier: notifier_handle,
    };

    (door, handle)
}
