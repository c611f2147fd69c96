//! In-memory offline storage adapter.
//!
//! A complete [`OfflineStore`] implementation backed by process memory:
//! the default adapter for embedders without a durable local database, and
//! the workhorse of the sync test suites. A single `RwLock` serializes
//! writes, satisfying the single-writer assumption the queue components
//! make.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use annota_core::defaults::OFFLINE_CACHE_LIMIT_BYTES;
use annota_core::{
    CachedNote, MutationQueueItem, MutationStatus, NoteSyncStatus, OfflineStore, Result,
};

#[derive(Debug, Default)]
struct Inner {
    notes: HashMap<Uuid, CachedNote>,
    /// Insertion-ordered; replay order depends on it.
    queue: Vec<MutationQueueItem>,
}

/// In-process [`OfflineStore`].
pub struct MemoryStore {
    inner: RwLock<Inner>,
    limit_bytes: usize,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_limit_bytes(OFFLINE_CACHE_LIMIT_BYTES)
    }

    /// Use a custom cache byte budget (eviction threshold).
    pub fn with_limit_bytes(limit_bytes: usize) -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
            limit_bytes,
        }
    }

    fn estimate_bytes(note: &CachedNote) -> usize {
        serde_json::to_vec(note).map(|v| v.len()).unwrap_or(0)
    }
}

#[async_trait]
impl OfflineStore for MemoryStore {
    async fn load_notes(
        &self,
        limit: Option<usize>,
        offset: Option<usize>,
    ) -> Result<Vec<CachedNote>> {
        let inner = self.inner.read().await;
        let mut notes: Vec<CachedNote> = inner.notes.values().cloned().collect();
        notes.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));

        let offset = offset.unwrap_or(0);
        let mut page: Vec<CachedNote> = notes.into_iter().skip(offset).collect();
        if let Some(limit) = limit {
            page.truncate(limit);
        }
        Ok(page)
    }

    async fn save_note(&self, note: CachedNote) -> Result<()> {
        let mut inner = self.inner.write().await;
        inner.notes.insert(note.id, note);
        Ok(())
    }

    async fn save_notes(&self, notes: Vec<CachedNote>) -> Result<()> {
        let mut inner = self.inner.write().await;
        for note in notes {
            inner.notes.insert(note.id, note);
        }
        Ok(())
    }

    async fn delete_note(&self, note_id: Uuid) -> Result<()> {
        let mut inner = self.inner.write().await;
        inner.notes.remove(&note_id);
        Ok(())
    }

    async fn get_queue(&self) -> Result<Vec<MutationQueueItem>> {
        Ok(self.inner.read().await.queue.clone())
    }

    async fn upsert_queue_item(&self, item: MutationQueueItem) -> Result<()> {
        let mut inner = self.inner.write().await;
        match inner.queue.iter().position(|i| i.id == item.id) {
            Some(pos) => inner.queue[pos] = item,
            None => inner.queue.push(item),
        }
        Ok(())
    }

    async fn upsert_queue(&self, items: Vec<MutationQueueItem>) -> Result<()> {
        // One write-set: a single lock acquisition covers the whole batch.
        let mut inner = self.inner.write().await;
        for item in items {
            match inner.queue.iter().position(|i| i.id == item.id) {
                Some(pos) => inner.queue[pos] = item,
                None => inner.queue.push(item),
            }
        }
        Ok(())
    }

    async fn pop_queue_batch(&self, batch_size: usize) -> Result<Vec<MutationQueueItem>> {
        let mut inner = self.inner.write().await;
        let take = batch_size.min(inner.queue.len());
        Ok(inner.queue.drain(..take).collect())
    }

    async fn get_pending_batch(&self, batch_size: usize) -> Result<Vec<MutationQueueItem>> {
        let inner = self.inner.read().await;
        Ok(inner
            .queue
            .iter()
            .filter(|i| i.status == MutationStatus::Pending)
            .take(batch_size)
            .cloned()
            .collect())
    }

    async fn remove_queue_items(&self, ids: &[Uuid]) -> Result<()> {
        let mut inner = self.inner.write().await;
        inner.queue.retain(|i| !ids.contains(&i.id));
        Ok(())
    }

    async fn mark_synced(&self, note_id: Uuid, updated_at: DateTime<Utc>) -> Result<()> {
        let mut inner = self.inner.write().await;
        if let Some(note) = inner.notes.get_mut(&note_id) {
            note.status = NoteSyncStatus::Synced;
            note.updated_at = updated_at;
            note.pending_ops.clear();
        }
        Ok(())
    }

    async fn mark_queue_item_status(
        &self,
        id: Uuid,
        status: MutationStatus,
        last_error: Option<String>,
    ) -> Result<()> {
        let mut inner = self.inner.write().await;
        if let Some(item) = inner.queue.iter_mut().find(|i| i.id == id) {
            item.status = status;
            item.last_error = last_error;
            if status == MutationStatus::Failed {
                // Replay bookkeeping: the driver reads this to decide
                // whether to re-mark pending or give up.
                item.attempts += 1;
            }
        }
        Ok(())
    }

    async fn enforce_limit(&self) -> Result<()> {
        let mut inner = self.inner.write().await;
        let mut total: usize = inner.notes.values().map(Self::estimate_bytes).sum();
        if total <= self.limit_bytes {
            return Ok(());
        }

        // Evict least-recently-updated synced notes first; notes with
        // pending local changes are never dropped.
        let mut evictable: Vec<(Uuid, DateTime<Utc>, usize)> = inner
            .notes
            .values()
            .filter(|n| n.status == NoteSyncStatus::Synced && n.pending_ops.is_empty())
            .map(|n| (n.id, n.updated_at, Self::estimate_bytes(n)))
            .collect();
        evictable.sort_by_key(|(_, updated_at, _)| *updated_at);

        for (id, _, bytes) in evictable {
            if total <= self.limit_bytes {
                break;
            }
            inner.notes.remove(&id);
            total = total.saturating_sub(bytes);
        }
        Ok(())
    }

    async fn clear_all(&self) -> Result<()> {
        let mut inner = self.inner.write().await;
        inner.notes.clear();
        inner.queue.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use annota_core::{MutationOperation, NotePatch};
    use chrono::TimeZone;

    fn ts(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    fn cached(status: NoteSyncStatus, at: DateTime<Utc>, body: &str) -> CachedNote {
        CachedNote {
            id: Uuid::new_v4(),
            status,
            title: Some("note".to_string()),
            description: Some(body.to_string()),
            tags: None,
            updated_at: at,
            pending_ops: Vec::new(),
            user_id: None,
        }
    }

    fn queued(note_id: Uuid, status: MutationStatus) -> MutationQueueItem {
        MutationQueueItem {
            id: Uuid::new_v4(),
            note_id,
            operation: MutationOperation::Update,
            payload: NotePatch::default(),
            client_updated_at: Utc::now(),
            status,
            attempts: 0,
            last_error: None,
        }
    }

    #[tokio::test]
    async fn test_load_notes_newest_first_with_pagination() {
        let store = MemoryStore::new();
        store.save_note(cached(NoteSyncStatus::Synced, ts(1), "a")).await.unwrap();
        store.save_note(cached(NoteSyncStatus::Synced, ts(3), "b")).await.unwrap();
        store.save_note(cached(NoteSyncStatus::Synced, ts(2), "c")).await.unwrap();

        let page = store.load_notes(Some(2), Some(0)).await.unwrap();
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].updated_at, ts(3));
        assert_eq!(page[1].updated_at, ts(2));

        let rest = store.load_notes(Some(2), Some(2)).await.unwrap();
        assert_eq!(rest.len(), 1);
        assert_eq!(rest[0].updated_at, ts(1));
    }

    #[tokio::test]
    async fn test_queue_preserves_insertion_order() {
        let store = MemoryStore::new();
        let first = queued(Uuid::new_v4(), MutationStatus::Pending);
        let second = queued(Uuid::new_v4(), MutationStatus::Pending);
        store.upsert_queue_item(first.clone()).await.unwrap();
        store.upsert_queue_item(second.clone()).await.unwrap();

        let queue = store.get_queue().await.unwrap();
        assert_eq!(queue[0].id, first.id);
        assert_eq!(queue[1].id, second.id);
    }

    #[tokio::test]
    async fn test_upsert_replaces_in_place() {
        let store = MemoryStore::new();
        let mut item = queued(Uuid::new_v4(), MutationStatus::Pending);
        store.upsert_queue_item(item.clone()).await.unwrap();

        item.status = MutationStatus::Failed;
        store.upsert_queue_item(item.clone()).await.unwrap();

        let queue = store.get_queue().await.unwrap();
        assert_eq!(queue.len(), 1);
        assert_eq!(queue[0].status, MutationStatus::Failed);
    }

    #[tokio::test]
    async fn test_pending_batch_skips_failed_items() {
        let store = MemoryStore::new();
        store
            .upsert_queue_item(queued(Uuid::new_v4(), MutationStatus::Failed))
            .await
            .unwrap();
        let pending = queued(Uuid::new_v4(), MutationStatus::Pending);
        store.upsert_queue_item(pending.clone()).await.unwrap();

        let batch = store.get_pending_batch(10).await.unwrap();
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].id, pending.id);
    }

    #[tokio::test]
    async fn test_mark_failed_increments_attempts() {
        let store = MemoryStore::new();
        let item = queued(Uuid::new_v4(), MutationStatus::Pending);
        store.upsert_queue_item(item.clone()).await.unwrap();

        store
            .mark_queue_item_status(item.id, MutationStatus::Failed, Some("boom".to_string()))
            .await
            .unwrap();
        store
            .mark_queue_item_status(item.id, MutationStatus::Failed, Some("boom again".to_string()))
            .await
            .unwrap();

        let queue = store.get_queue().await.unwrap();
        assert_eq!(queue[0].attempts, 2);
        assert_eq!(queue[0].last_error.as_deref(), Some("boom again"));
    }

    #[tokio::test]
    async fn test_enforce_limit_evicts_oldest_synced_only() {
        let store = MemoryStore::with_limit_bytes(600);
        let old_synced = cached(NoteSyncStatus::Synced, ts(1), &"x".repeat(300));
        let new_synced = cached(NoteSyncStatus::Synced, ts(3), &"x".repeat(300));
        let mut pending = cached(NoteSyncStatus::Pending, ts(2), &"x".repeat(300));
        pending.pending_ops.push(MutationOperation::Update);

        store.save_note(old_synced.clone()).await.unwrap();
        store.save_note(new_synced.clone()).await.unwrap();
        store.save_note(pending.clone()).await.unwrap();

        store.enforce_limit().await.unwrap();

        let remaining = store.load_notes(None, None).await.unwrap();
        let ids: Vec<Uuid> = remaining.iter().map(|n| n.id).collect();
        assert!(!ids.contains(&old_synced.id), "oldest synced evicted");
        assert!(ids.contains(&pending.id), "pending never evicted");
    }

    #[tokio::test]
    async fn test_mark_synced_clears_pending_ops() {
        let store = MemoryStore::new();
        let mut note = cached(NoteSyncStatus::Pending, ts(1), "draft");
        note.pending_ops.push(MutationOperation::Update);
        store.save_note(note.clone()).await.unwrap();

        store.mark_synced(note.id, ts(5)).await.unwrap();

        let loaded = store.load_notes(None, None).await.unwrap();
        assert_eq!(loaded[0].status, NoteSyncStatus::Synced);
        assert_eq!(loaded[0].updated_at, ts(5));
        assert!(loaded[0].pending_ops.is_empty());
    }

    #[tokio::test]
    async fn test_clear_all_drops_everything() {
        let store = MemoryStore::new();
        store.save_note(cached(NoteSyncStatus::Synced, ts(1), "a")).await.unwrap();
        store
            .upsert_queue_item(queued(Uuid::new_v4(), MutationStatus::Pending))
            .await
            .unwrap();

        store.clear_all().await.unwrap();

        assert!(store.load_notes(None, None).await.unwrap().is_empty());
        assert!(store.get_queue().await.unwrap().is_empty());
    }
}
