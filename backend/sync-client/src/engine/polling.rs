//! Status polling timer.

use std::time::Duration;

use log::debug;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};

/// A cancellable background task that emits a tick every `period`.
///
/// Ticks are delivered over a capacity-1 channel, so a busy event loop sees
/// at most one pending tick rather than a backlog.
#[derive(Debug, Default)]
pub struct PollingTask {
    task: Option<JoinHandle<()>>,
}

impl PollingTask {
    /// Spawn the timer. The returned receiver yields one `()` per tick.
    pub fn start(period: Duration) -> (Self, mpsc::Receiver<()>) {
        let (tick_tx, tick_rx) = mpsc::channel(1);

        let task = tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // First tick completes immediately; the handshake already asks for status.
            ticker.tick().await;

            loop {
                ticker.tick().await;
                if tick_tx.send(()).await.is_err() {
                    break;
                }
            }
        });

        (Self { task: Some(task) }, tick_rx)
    }

    pub fn is_running(&self) -> bool {
        self.task.is_some()
    }

    /// Stop the timer. Safe to call more than once; only the first call
    /// does anything.
    pub fn cancel(&mut self) -> bool {
        match self.task.take() {
            Some(task) => {
                task.abort();
                debug!("Status polling cancelled");
                true
            }
            None => false,
        }
    }
}

impl Drop for PollingTask {
    fn drop(&mut self) {
        self.cancel();
    }
}
