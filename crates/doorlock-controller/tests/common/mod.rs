//! Shared helpers for controller integration tests.
//!
//! Tests drive the controller one poll at a time, so no real or paused clock
//! is involved: a poll is one tick of the configured interval.

use doorlock_controller::{AccessController, PollOutcome};
use doorlock_core::{Identity, IdentityRegistry};
use doorlock_hardware::mock::{MockDoor, MockDoorHandle, mock_door};

/// Lewandowski and Pedro only.
pub fn two_identities() -> IdentityRegistry {
    IdentityRegistry::new(vec![
        Identity::new("Lewandowski", "5555", "c976133f").unwrap(),
        Identity::new("Pedro", "1234", "025c5e28").unwrap(),
    ])
}

pub fn controller_with(registry: IdentityRegistry) -> (AccessController<MockDoor>, MockDoorHandle) {
    let (door, handle) = mock_door();
    let controller = AccessController::builder(door)
        .with_registry(registry)
        .build()
        .unwrap();
    (controller, handle)
}

/// Poll `n` times and return the last outcome.
pub async fn poll_n(controller: &mut AccessController<MockDoor>, n: usize) -> PollOutcome {
    assert!(n > 0);
    let mut last = controller.poll().await.unwrap();
    for _ in 1..n {
        last = controller.poll().await.unwrap();
    }
    last
}

/// Type `keys` and poll once per key.
pub async fn enter(
    controller: &mut AccessController<MockDoor>,
    handle: &MockDoorHandle,
    keys: &str,
) -> PollOutcome {
    handle.keypad.type_str(keys).unwrap();
    poll_n(controller, keys.chars().count()).await
}

/// First line of the display without padding.
pub fn headline(handle: &MockDoorHandle) -> String {
    handle.display.line(0).trim_end().to_string()
}
