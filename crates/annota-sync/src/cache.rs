//! Offline note cache service.
//!
//! Thin policy layer over the storage adapter: every write is followed by a
//! budget-enforcement pass, and the concrete eviction strategy (LRU by
//! `updated_at`) is the adapter's concern.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use tracing::warn;
use uuid::Uuid;

use annota_core::defaults::OFFLINE_CACHE_LIMIT_BYTES;
use annota_core::{CachedNote, OfflineStore, Result};

/// Cached-note access with byte-budget enforcement.
pub struct OfflineCache {
    store: Arc<dyn OfflineStore>,
}

impl OfflineCache {
    pub fn new(store: Arc<dyn OfflineStore>) -> Self {
        Self { store }
    }

    pub async fn load_notes(
        &self,
        limit: Option<usize>,
        offset: Option<usize>,
    ) -> Result<Vec<CachedNote>> {
        self.store.load_notes(limit, offset).await
    }

    pub async fn save_note(&self, note: CachedNote) -> Result<()> {
        self.store.save_note(note).await?;
        self.enforce_limit().await
    }

    pub async fn save_notes(&self, notes: Vec<CachedNote>) -> Result<()> {
        self.store.save_notes(notes).await?;
        self.enforce_limit().await
    }

    pub async fn delete_note(&self, note_id: Uuid) -> Result<()> {
        self.store.delete_note(note_id).await
    }

    /// Delete many notes, continuing past individual failures.
    ///
    /// Returns the number of successful deletions; failures are logged per
    /// note rather than aborting the rest of the set.
    pub async fn delete_notes(&self, note_ids: &[Uuid]) -> Result<usize> {
        let results = join_all(note_ids.iter().map(|id| self.store.delete_note(*id))).await;

        let mut deleted = 0usize;
        for (id, result) in note_ids.iter().zip(results) {
            match result {
                Ok(()) => deleted += 1,
                Err(e) => warn!(
                    subsystem = "sync",
                    component = "cache",
                    op = "delete_notes",
                    note_id = %id,
                    error = %e,
                    "Cached note deletion failed, continuing"
                ),
            }
        }
        Ok(deleted)
    }

    pub async fn mark_synced(&self, note_id: Uuid, updated_at: DateTime<Utc>) -> Result<()> {
        self.store.mark_synced(note_id, updated_at).await
    }

    pub async fn enforce_limit(&self) -> Result<()> {
        self.store.enforce_limit().await
    }

    pub fn cache_limit_bytes(&self) -> usize {
        OFFLINE_CACHE_LIMIT_BYTES
    }
}
