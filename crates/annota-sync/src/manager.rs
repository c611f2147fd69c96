//! Replay driver for the offline mutation queue.
//!
//! The manager owns retry policy; the queue is a dumb log. A drain reads
//! pending batches oldest-first, applies each item against the backend in
//! enqueue order, removes acknowledged items, and records failures on the
//! item without aborting the rest of the batch.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use annota_core::defaults::{SYNC_BATCH_SIZE, SYNC_MAX_ATTEMPTS};
use annota_core::{
    MutationInput, MutationQueueItem, MutationStatus, OfflineStore, Result, SyncState, SyncTarget,
};

use crate::queue::MutationQueue;

/// Replay policy configuration.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Queue items replayed per batch.
    pub batch_size: usize,
    /// Attempts before an item is left failed for manual retry.
    pub max_attempts: i32,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            batch_size: SYNC_BATCH_SIZE,
            max_attempts: SYNC_MAX_ATTEMPTS,
        }
    }
}

impl SyncConfig {
    /// Create config from environment variables (with defaults).
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `SYNC_BATCH_SIZE` | `10` | Items replayed per batch |
    /// | `SYNC_MAX_ATTEMPTS` | `5` | Attempt ceiling before giving up |
    pub fn from_env() -> Self {
        let batch_size = std::env::var("SYNC_BATCH_SIZE")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(SYNC_BATCH_SIZE)
            .max(1);

        let max_attempts = std::env::var("SYNC_MAX_ATTEMPTS")
            .ok()
            .and_then(|v| v.parse::<i32>().ok())
            .unwrap_or(SYNC_MAX_ATTEMPTS)
            .max(1);

        Self {
            batch_size,
            max_attempts,
        }
    }

    pub fn with_batch_size(mut self, n: usize) -> Self {
        self.batch_size = n.max(1);
        self
    }

    pub fn with_max_attempts(mut self, n: i32) -> Self {
        self.max_attempts = n.max(1);
        self
    }
}

/// Outcome of one drain pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainReport {
    /// Items acknowledged by the backend and removed from the queue.
    pub applied: usize,
    /// Items marked failed during this pass.
    pub failed: usize,
}

/// Keeps the local store and the backend reconciled.
pub struct SyncManager {
    queue: MutationQueue,
    store: Arc<dyn OfflineStore>,
    target: Arc<dyn SyncTarget>,
    config: SyncConfig,
    online: AtomicBool,
    last_sync_at: Mutex<Option<DateTime<Utc>>>,
}

impl SyncManager {
    pub fn new(
        store: Arc<dyn OfflineStore>,
        target: Arc<dyn SyncTarget>,
        config: SyncConfig,
    ) -> Self {
        Self {
            queue: MutationQueue::new(store.clone()),
            store,
            target,
            config,
            online: AtomicBool::new(true),
            last_sync_at: Mutex::new(None),
        }
    }

    /// Record a mutation and, when online, drain opportunistically.
    ///
    /// The drain's per-item failures are recorded on the items themselves;
    /// only store-level failures would surface here, and those are logged
    /// rather than failing the enqueue that already succeeded.
    pub async fn enqueue(&self, input: MutationInput) -> Result<MutationQueueItem> {
        let item = self.queue.enqueue(input).await?;
        if self.is_online() {
            if let Err(e) = self.drain().await {
                warn!(
                    subsystem = "sync",
                    component = "manager",
                    op = "enqueue",
                    error = %e,
                    "Opportunistic drain failed"
                );
            }
        }
        Ok(item)
    }

    pub fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }

    /// Mark the device online and replay everything pending.
    pub async fn handle_online(&self) -> Result<DrainReport> {
        self.online.store(true, Ordering::SeqCst);
        self.drain().await
    }

    /// Mark the device offline; mutations keep queueing locally.
    pub fn handle_offline(&self) {
        self.online.store(false, Ordering::SeqCst);
    }

    /// Replay pending batches until the queue is empty or a pass makes no
    /// progress (everything remaining failed).
    ///
    /// Items are applied strictly in queue order; a failed item is marked
    /// `failed` with its error and does not abort the rest of the batch.
    pub async fn drain(&self) -> Result<DrainReport> {
        let mut report = DrainReport::default();
        if !self.is_online() {
            return Ok(report);
        }

        loop {
            let batch = self.queue.get_pending_batch(self.config.batch_size).await?;
            if batch.is_empty() {
                break;
            }

            debug!(
                subsystem = "sync",
                component = "manager",
                op = "drain",
                batch_size = batch.len(),
                "Replaying batch"
            );

            let mut applied_ids = Vec::new();
            for item in &batch {
                self.queue
                    .mark_status(item.id, MutationStatus::Syncing, None)
                    .await?;

                match self.target.apply(item).await {
                    Ok(()) => {
                        self.queue
                            .mark_status(item.id, MutationStatus::Synced, None)
                            .await?;
                        self.store
                            .mark_synced(item.note_id, item.client_updated_at)
                            .await?;
                        applied_ids.push(item.id);
                    }
                    Err(e) => {
                        warn!(
                            subsystem = "sync",
                            component = "manager",
                            op = "drain",
                            item_id = %item.id,
                            note_id = %item.note_id,
                            error = %e,
                            "Replay failed, item left in queue"
                        );
                        self.queue
                            .mark_status(item.id, MutationStatus::Failed, Some(e.to_string()))
                            .await?;
                        report.failed += 1;
                    }
                }
            }

            if !applied_ids.is_empty() {
                self.queue.remove_items(&applied_ids).await?;
                report.applied += applied_ids.len();
                *self.last_sync_at.lock().expect("sync clock poisoned") = Some(Utc::now());
            } else {
                // No progress; stop instead of spinning on a failed queue.
                break;
            }
        }

        if report.applied > 0 || report.failed > 0 {
            info!(
                subsystem = "sync",
                component = "manager",
                op = "drain",
                applied = report.applied,
                failed = report.failed,
                "Drain finished"
            );
        }
        Ok(report)
    }

    /// Re-mark failed items below the attempt ceiling as pending and drain.
    ///
    /// Items at or above the ceiling stay failed for inspection.
    pub async fn retry_failed(&self) -> Result<DrainReport> {
        let queue = self.queue.get_queue().await?;
        let mut retried = 0usize;
        for item in queue
            .iter()
            .filter(|i| i.status == MutationStatus::Failed && i.attempts < self.config.max_attempts)
        {
            self.queue
                .mark_status(item.id, MutationStatus::Pending, None)
                .await?;
            retried += 1;
        }

        if retried == 0 {
            return Ok(DrainReport::default());
        }
        debug!(
            subsystem = "sync",
            component = "manager",
            op = "retry",
            batch_size = retried,
            "Re-marked failed items pending"
        );
        self.drain().await
    }

    /// Current sync health, suitable for a sync indicator.
    pub async fn state(&self) -> Result<SyncState> {
        let queue = self.queue.get_queue().await?;
        Ok(SyncState {
            last_sync_at: *self.last_sync_at.lock().expect("sync clock poisoned"),
            is_online: self.is_online(),
            queue_size: queue.len(),
        })
    }

    /// Follow a network-status channel, draining on offline→online
    /// transitions. The task ends when the sender side is dropped.
    pub fn spawn_network_watcher(
        self: &Arc<Self>,
        mut network: watch::Receiver<bool>,
    ) -> tokio::task::JoinHandle<()> {
        let manager = self.clone();
        tokio::spawn(async move {
            loop {
                let online = *network.borrow();
                if online {
                    if let Err(e) = manager.handle_online().await {
                        warn!(
                            subsystem = "sync",
                            component = "manager",
                            op = "watch",
                            error = %e,
                            "Drain on reconnect failed"
                        );
                    }
                } else {
                    manager.handle_offline();
                }

                if network.changed().await.is_err() {
                    break;
                }
            }
        })
    }
}
