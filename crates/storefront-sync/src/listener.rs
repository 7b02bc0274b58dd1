//! # Change Listener
//!
//! Background task that turns product change events into full re-pulls.
//!
//! ## Event Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  RecordService ── INSERT/UPDATE/DELETE ──► ChangeSubscription           │
//! │                                                  │                      │
//! │                                                  ▼                      │
//! │                                  ┌───────────────────────────────┐      │
//! │                                  │ ChangeListener::run           │      │
//! │                                  │                               │      │
//! │                                  │ 1. wait for an event          │      │
//! │                                  │ 2. drain the rest of a burst  │      │
//! │                                  │ 3. coordinator.refresh()      │      │
//! │                                  └───────────────────────────────┘      │
//! │                                                                         │
//! │  The task stops on shutdown, when the feed closes, when the             │
//! │  coordinator is dropped, or when a detach moved the generation on.      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Events are only a trigger: their payloads are never merged into the
//! store, so a missed or reordered event can't corrupt it.

use std::sync::Weak;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::coordinator::{CoordinatorInner, SyncCoordinator};
use crate::service::ChangeSubscription;

// =============================================================================
// Change Listener
// =============================================================================

/// Re-pulls the product list whenever the change feed reports activity.
pub struct ChangeListener {
    /// Weak so an abandoned coordinator is not kept alive by its listener.
    coordinator: Weak<CoordinatorInner>,

    subscription: ChangeSubscription,

    /// Generation at attach time.
    generation: u64,

    shutdown_rx: mpsc::Receiver<()>,
}

/// Handle for controlling the change listener.
pub struct ChangeListenerHandle {
    shutdown_tx: mpsc::Sender<()>,
    task: JoinHandle<()>,
}

impl ChangeListenerHandle {
    /// Signals the listener to stop and waits until it has closed its
    /// subscription.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
        if let Err(e) = self.task.await {
            warn!(error = %e, "Change listener task failed");
        }
    }
}

impl ChangeListener {
    /// Spawns the listener task.
    pub(crate) fn spawn(
        coordinator: Weak<CoordinatorInner>,
        subscription: ChangeSubscription,
        generation: u64,
    ) -> ChangeListenerHandle {
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        let listener = ChangeListener {
            coordinator,
            subscription,
            generation,
            shutdown_rx,
        };
        let task = tokio::spawn(listener.run());

        ChangeListenerHandle { shutdown_tx, task }
    }

    /// Main listener loop.
    async fn run(mut self) {
        info!(table = %self.subscription.table(), generation = self.generation, "Change listener started");

        loop {
            tokio::select! {
                event = self.subscription.recv() => {
                    let Some(event) = event else {
                        warn!("Change feed closed");
                        break;
                    };

                    let coalesced = self.subscription.drain();
                    debug!(
                        event_type = %event.event_type,
                        coalesced,
                        "Product change received"
                    );

                    let Some(inner) = self.coordinator.upgrade() else {
                        debug!("Coordinator dropped");
                        break;
                    };
                    if inner.generation() != self.generation {
                        debug!("Listener outlived its attach generation");
                        break;
                    }

                    let outcome = SyncCoordinator::from_inner(inner).refresh().await;
                    debug!(?outcome, "Refreshed after change");
                }

                _ = self.shutdown_rx.recv() => {
                    debug!("Change listener received shutdown");
                    break;
                }
            }
        }

        self.subscription.close();
        info!("Change listener stopped");
    }
}
