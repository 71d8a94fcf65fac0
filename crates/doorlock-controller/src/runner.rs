//! Async driver for the access controller.
//!
//! [`Runner::run`] brings the door up, waits for the companion module, then
//! polls the controller once per poll interval until the cancellation token
//! fires. Cancellation is only observed between polls, so a poll is never cut
//! in half, and the door is always left locked with every output low.
//!
//! The runner borrows the controller instead of spawning it: device futures
//! are not required to be `Send`, and the caller keeps the controller for
//! inspection afterwards.
//!
//! # Examples
//!
//! ```
//! use std::time::Duration;
//! use doorlock_controller::{AccessController, Runner};
//! use doorlock_hardware::mock::mock_door;
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> doorlock_controller::Result<()> {
//!     let (door, handle) = mock_door();
//!     let mut controller = AccessController::builder(door).build()?;
//!     let cancel = CancellationToken::new();
//!
//!     let stop = cancel.clone();
//!     let runner = Runner::new(cancel);
//!     let (summary, _) = tokio::join!(runner.run(&mut controller), async move {
//!         tokio::time::sleep(Duration::from_millis(120)).await;
//!         stop.cancel();
//!     });
//!
//!     assert!(summary?.polls > 0);
//!     assert_eq!(handle.display.line(0).trim_end(), "System halted");
//!     Ok(())
//! }
//! ```

use tokio::sync::watch;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use doorlock_hardware::DoorGateway;

use crate::controller::{AccessController, ControllerStatus};
use crate::error::Result;

/// Counters from one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub polls: u64,
    pub transitions: u64,
    pub rejections: u64,
}

/// Drives an [`AccessController`] at its configured poll interval.
#[derive(Debug)]
pub struct Runner {
    cancel: CancellationToken,
    status_tx: Option<watch::Sender<ControllerStatus>>,
}

impl Runner {
    pub fn new(cancel: CancellationToken) -> Self {
        Self {
            cancel,
            status_tx: None,
        }
    }

    /// Publish a [`ControllerStatus`] after every poll.
    pub fn with_status(mut self, status_tx: watch::Sender<ControllerStatus>) -> Self {
        self.status_tx = Some(status_tx);
        self
    }

    /// Run until cancelled.
    ///
    /// # Errors
    /// Returns the first peripheral or bookkeeping failure. Before returning
    /// it, the runner tries once to leave the door locked.
    pub async fn run<G: DoorGateway>(
        &self,
        controller: &mut AccessController<G>,
    ) -> Result<RunSummary> {
        let mut summary = RunSummary::default();
        let mut interval = time::interval(controller.config().poll_interval());
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        controller.initialize().await?;

        info!("Waiting for companion module");
        loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    controller.shutdown().await?;
                    return Ok(summary);
                }
                _ = interval.tick() => {
                    if controller.companion_ready().await? {
                        break;
                    }
                }
            }
        }

        controller.show_prompt().await?;
        self.publish(controller);
        info!(
            "Door ready, polling every {} ms",
            controller.config().poll_interval_ms
        );

        loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                _ = interval.tick() => {
                    let outcome = match controller.poll().await {
                        Ok(outcome) => outcome,
                        Err(e) => {
                            error!("Poll failed: {}", e);
                            if let Err(shutdown_err) = controller.shutdown().await {
                                error!("Shutdown after failure also failed: {}", shutdown_err);
                            }
                            return Err(e);
                        }
                    };

                    summary.polls += 1;
                    if outcome.transition.is_some() {
                        summary.transitions += 1;
                    }
                    if outcome.is_rejected() {
                        summary.rejections += 1;
                    }
                    self.publish(controller);
                }
            }
        }

        debug!("Cancellation requested after {} polls", summary.polls);
        controller.shutdown().await?;
        self.publish(controller);
        Ok(summary)
    }

    fn publish<G: DoorGateway>(&self, controller: &AccessController<G>) {
        if let Some(tx) = &self.status_tx {
            tx.send_replace(controller.status());
        }
    }
}
