//! Offline mutation queue service.
//!
//! A thin, order-preserving log over the storage adapter. The queue never
//! reorders, collapses, or drops items on its own — removal and status
//! transitions happen only through explicit calls, so the replay driver
//! stays in full control of retry policy. Items for the same note must be
//! applied in enqueue order; time-ordered v7 ids make that order durable.

use std::sync::Arc;

use uuid::Uuid;

use annota_core::{MutationInput, MutationQueueItem, MutationStatus, OfflineStore, Result};

/// Durable, ordered queue of pending note mutations.
pub struct MutationQueue {
    store: Arc<dyn OfflineStore>,
}

impl MutationQueue {
    pub fn new(store: Arc<dyn OfflineStore>) -> Self {
        Self { store }
    }

    fn build_item(input: MutationInput) -> MutationQueueItem {
        MutationQueueItem {
            id: Uuid::now_v7(),
            note_id: input.note_id,
            operation: input.operation,
            payload: input.payload,
            client_updated_at: input.client_updated_at,
            status: MutationStatus::Pending,
            attempts: 0,
            last_error: None,
        }
    }

    /// Record a mutation as a queued intent. Never blocks on network.
    pub async fn enqueue(&self, input: MutationInput) -> Result<MutationQueueItem> {
        let item = Self::build_item(input);
        self.store.upsert_queue_item(item.clone()).await?;
        Ok(item)
    }

    /// Record many mutations through a single batched upsert — the adapter
    /// treats the batch as one write-set.
    pub async fn enqueue_many(&self, inputs: Vec<MutationInput>) -> Result<Vec<MutationQueueItem>> {
        let items: Vec<MutationQueueItem> = inputs.into_iter().map(Self::build_item).collect();
        self.store.upsert_queue(items.clone()).await?;
        Ok(items)
    }

    /// The full queue, in insertion order.
    pub async fn get_queue(&self) -> Result<Vec<MutationQueueItem>> {
        self.store.get_queue().await
    }

    /// Up to `batch_size` items eligible for replay (pending, oldest first),
    /// without removing them.
    pub async fn get_pending_batch(&self, batch_size: usize) -> Result<Vec<MutationQueueItem>> {
        self.store.get_pending_batch(batch_size).await
    }

    /// Bulk replace/merge, e.g. after compacting the queue.
    pub async fn upsert_queue(&self, items: Vec<MutationQueueItem>) -> Result<()> {
        self.store.upsert_queue(items).await
    }

    /// Delete entries after a batch is confirmed applied to the backend.
    pub async fn remove_items(&self, ids: &[Uuid]) -> Result<()> {
        self.store.remove_queue_items(ids).await
    }

    /// Transition a single item's status (replay bookkeeping).
    pub async fn mark_status(
        &self,
        id: Uuid,
        status: MutationStatus,
        last_error: Option<String>,
    ) -> Result<()> {
        self.store.mark_queue_item_status(id, status, last_error).await
    }
}
