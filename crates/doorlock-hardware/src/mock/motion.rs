//! Mock motion sensor.

use crate::{Result, traits::MotionSensor};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Presence sensor whose reading is set through a [`MockMotionHandle`].
///
/// # Examples
///
/// ```
/// use doorlock_hardware::mock::MockMotionSensor;
/// use doorlock_hardware::traits::MotionSensor;
///
/// #[tokio::main]
/// async fn main() -> doorlock_hardware::Result<()> {
///     let (mut sensor, handle) = MockMotionSensor::new();
///
///     assert!(!sensor.motion_detected().await?);
///     handle.set_motion(true);
///     assert!(sensor.motion_detected().await?);
///     assert_eq!(handle.reads(), 2);
///
///     Ok(())
/// }
/// ```
#[derive(Debug, Default)]
pub struct MockMotionSensor {
    present: Arc<AtomicBool>,
    reads: Arc<AtomicUsize>,
}

impl MockMotionSensor {
    /// Create a sensor that starts with an empty doorway.
    pub fn new() -> (Self, MockMotionHandle) {
        let sensor = Self::default();
        let handle = MockMotionHandle {
            present: Arc::clone(&sensor.present),
            reads: Arc::clone(&sensor.reads),
        };
        (sensor, handle)
    }
}

impl MotionSensor for MockMotionSensor {
    async fn motion_detected(&mut self) -> Result<bool> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        Ok(self.present.load(Ordering::SeqCst))
    }
}

#[derive(Debug, Clone)]
pub struct MockMotionHandle {
    present: Arc<AtomicBool>,
    reads: Arc<AtomicUsize>,
}

impl MockMotionHandle {
    /// Set what the sensor reports from now on.
    pub fn set_motion(&self, present: bool) {
        self.present.store(present, Ordering::SeqCst);
    }

    /// Number of times the sensor has been read.
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}
