//! Tokio driver for a shared deck
//!
//! Feeds the engine's status channel into the deck and runs the periodic
//! tick (sound effects, load timeout, checkpoints, session retries). The
//! deck lock is never held across an await point.

use crate::deck::Deck;
use cassette_core::StatusUpdate;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Handle to a running driver
pub struct DriverHandle {
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl DriverHandle {
    /// Stop the driver and shut the deck down
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Err(e) = self.task.await {
            warn!(error = %e, "deck driver task failed");
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

/// Spawn the driver loop on the current runtime
///
/// Dropping the returned handle also stops the loop.
pub fn spawn(
    deck: Arc<Mutex<Deck>>,
    mut status_rx: mpsc::UnboundedReceiver<StatusUpdate>,
    tick_interval: Duration,
) -> DriverHandle {
    let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();

    let task = tokio::spawn(async move {
        let mut ticker = time::interval(tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut feed_open = true;

        info!(tick_ms = tick_interval.as_millis() as u64, "deck driver started");

        loop {
            tokio::select! {
                _ = &mut shutdown_rx => break,
                update = status_rx.recv(), if feed_open => match update {
                    Some(update) => {
                        deck.lock().await.handle_status(update);
                    }
                    None => {
                        debug!("engine status feed closed");
                        feed_open = false;
                    }
                },
                _ = ticker.tick() => {
                    deck.lock().await.tick(Instant::now().into_std());
                }
            }
        }

        deck.lock().await.shutdown();
        info!("deck driver stopped");
    });

    DriverHandle {
        shutdown_tx: Some(shutdown_tx),
        task,
    }
}
