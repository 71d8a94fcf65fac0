//! Mock companion notification module.

use crate::{Result, mock::outputs::push_bounded, traits::Notifier};
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::watch;

/// Records payloads sent to the companion module, up to
/// [`MAX_HISTORY`](crate::mock::outputs::MAX_HISTORY).
///
/// # Examples
///
/// ```
/// use doorlock_hardware::mock::MockNotifier;
/// use doorlock_hardware::traits::Notifier;
///
/// #[tokio::main]
/// async fn main() -> doorlock_hardware::Result<()> {
///     let (mut notifier, handle) = MockNotifier::offline();
///
///     assert!(!notifier.is_ready().await?);
///     handle.set_ready(true);
///     assert!(notifier.is_ready().await?);
///
///     notifier.send(b"Silva").await?;
///     assert_eq!(handle.sent_text(), vec!["Silva".to_string()]);
///
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct MockNotifier {
    ready: Arc<AtomicBool>,
    sent_tx: watch::Sender<VecDeque<Vec<u8>>>,
}

impl MockNotifier {
    /// A companion module that is already up.
    pub fn new() -> (Self, MockNotifierHandle) {
        Self::with_ready(true)
    }

    /// A companion module that has not reported ready yet.
    pub fn offline() -> (Self, MockNotifierHandle) {
        Self::with_ready(false)
    }

    fn with_ready(ready: bool) -> (Self, MockNotifierHandle) {
        let ready = Arc::new(AtomicBool::new(ready));
        let (sent_tx, sent_rx) = watch::channel(VecDeque::new());
        let handle = MockNotifierHandle {
            ready: Arc::clone(&ready),
            sent_rx,
        };
        (Self { ready, sent_tx }, handle)
    }
}

impl Default for MockNotifier {
    fn default() -> Self {
        Self::new().0
    }
}

impl Notifier for MockNotifier {
    async fn is_ready(&mut self) -> Result<bool> {
        Ok(self.ready.load(Ordering::SeqCst))
    }

    async fn send(&mut self, payload: &[u8]) -> Result<()> {
        self.sent_tx
            .send_modify(|sent| push_bounded(sent, payload.to_vec()));
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct MockNotifierHandle {
    ready: Arc<AtomicBool>,
    sent_rx: watch::Receiver<VecDeque<Vec<u8>>>,
}

impl MockNotifierHandle {
    pub fn set_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::SeqCst);
    }

    /// Raw payloads, oldest first.
    pub fn sent(&self) -> Vec<Vec<u8>> {
        self.sent_rx.borrow().iter().cloned().collect()
    }

    /// Payloads decoded as text, oldest first.
    pub fn sent_text(&self) -> Vec<String> {
        self.sent_rx
            .borrow()
            .iter()
            .map(|payload| String::from_utf8_lossy(payload).into_owned())
            .collect()
    }
}
