//! Core traits for annota abstractions.
//!
//! These traits define the seams between the pure components and their
//! external collaborators (the local storage adapter, the Postgres backend,
//! the replay target), enabling pluggable backends and testability.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::Result;
use crate::models::{CachedNote, Note, NotePatch, SearchHit};
use crate::offline::{MutationQueueItem, MutationStatus};

// =============================================================================
// NOTE REPOSITORY
// =============================================================================

/// Request for creating a new note.
#[derive(Debug, Clone)]
pub struct CreateNoteRequest {
    pub title: String,
    /// Sanitized HTML body.
    pub description: String,
    pub tags: Vec<String>,
}

/// Request for listing notes.
#[derive(Debug, Clone, Default)]
pub struct ListNotesRequest {
    /// Maximum results.
    pub limit: Option<i64>,
    /// Pagination offset.
    pub offset: Option<i64>,
}

/// Repository for user-scoped note CRUD operations.
///
/// Every operation is scoped to the owning user; a note belonging to another
/// user behaves as if it did not exist. `updated_at` is assigned by the
/// server on every write and increases monotonically.
#[async_trait]
pub trait NoteRepository: Send + Sync {
    /// Insert a new note and return it with server-assigned timestamps.
    async fn create(&self, user_id: Uuid, req: CreateNoteRequest) -> Result<Note>;

    /// Fetch a note by id.
    async fn fetch(&self, user_id: Uuid, id: Uuid) -> Result<Note>;

    /// List notes, newest-updated first.
    async fn list(&self, user_id: Uuid, req: ListNotesRequest) -> Result<Vec<Note>>;

    /// Apply a partial update; only fields present in the patch change.
    async fn update(&self, user_id: Uuid, id: Uuid, patch: NotePatch) -> Result<Note>;

    /// Delete a note.
    async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<()>;
}

// =============================================================================
// SEARCH BACKEND
// =============================================================================

/// Parameters for the ranking-engine (FTS) call.
///
/// Mirrors the `search_notes_fts` function signature: a tri-state query
/// string, an analyzer configuration name, a minimum rank threshold, and
/// user-scoped pagination.
#[derive(Debug, Clone)]
pub struct FtsQuery {
    pub query: String,
    pub language: String,
    pub min_rank: f32,
    pub limit: i64,
    pub offset: i64,
    pub user_id: Uuid,
}

/// One page of ranking-engine results.
///
/// `total` is the backend-reported total match count when available.
#[derive(Debug, Clone)]
pub struct FtsPage {
    pub hits: Vec<SearchHit>,
    pub total: Option<i64>,
}

/// Parameters for the substring fallback scan.
///
/// `needle` is the raw (not tri-state-transformed) query, already sanitized
/// by the pipeline; the backend is responsible for escaping LIKE wildcards
/// before pattern-wrapping it.
#[derive(Debug, Clone)]
pub struct ScanQuery {
    pub needle: String,
    pub tag: Option<String>,
    pub user_id: Uuid,
    pub limit: i64,
    pub offset: i64,
}

/// Search data source: the FTS ranking engine plus the substring fallback.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Ranked full-text search.
    async fn fts(&self, query: &FtsQuery) -> Result<FtsPage>;

    /// Case-insensitive substring scan over title and description, ordered
    /// by `updated_at` descending.
    async fn scan(&self, query: &ScanQuery) -> Result<Vec<Note>>;
}

// =============================================================================
// OFFLINE STORAGE ADAPTER
// =============================================================================

/// Local persistence for cached notes and the mutation queue.
///
/// The adapter serializes its own writes; the queue components assume a
/// single-writer store and add no locking of their own. Queue accessors
/// preserve insertion order — the adapter must never reorder items.
#[async_trait]
pub trait OfflineStore: Send + Sync {
    /// Load cached notes, optionally paginated.
    async fn load_notes(
        &self,
        limit: Option<usize>,
        offset: Option<usize>,
    ) -> Result<Vec<CachedNote>>;

    /// Upsert a single cached note.
    async fn save_note(&self, note: CachedNote) -> Result<()>;

    /// Upsert many cached notes as one write-set.
    async fn save_notes(&self, notes: Vec<CachedNote>) -> Result<()>;

    /// Remove a cached note.
    async fn delete_note(&self, note_id: Uuid) -> Result<()>;

    /// The full mutation queue, in insertion order.
    async fn get_queue(&self) -> Result<Vec<MutationQueueItem>>;

    /// Upsert a single queue item.
    async fn upsert_queue_item(&self, item: MutationQueueItem) -> Result<()>;

    /// Upsert many queue items as one write-set.
    async fn upsert_queue(&self, items: Vec<MutationQueueItem>) -> Result<()>;

    /// Remove and return up to `batch_size` items from the head of the queue.
    async fn pop_queue_batch(&self, batch_size: usize) -> Result<Vec<MutationQueueItem>>;

    /// Up to `batch_size` pending items, oldest first, without removing them.
    async fn get_pending_batch(&self, batch_size: usize) -> Result<Vec<MutationQueueItem>>;

    /// Delete queue entries by id.
    async fn remove_queue_items(&self, ids: &[Uuid]) -> Result<()>;

    /// Mark a cached note as synced with the given server timestamp.
    async fn mark_synced(&self, note_id: Uuid, updated_at: DateTime<Utc>) -> Result<()>;

    /// Transition a queue item's status, optionally attaching an error.
    async fn mark_queue_item_status(
        &self,
        id: Uuid,
        status: MutationStatus,
        last_error: Option<String>,
    ) -> Result<()>;

    /// Evict cached notes until the store is back under its size budget.
    async fn enforce_limit(&self) -> Result<()>;

    /// Drop all cached notes and queue items.
    async fn clear_all(&self) -> Result<()>;
}

// =============================================================================
// SYNC TARGET
// =============================================================================

/// The backend call a replay batch applies each queued mutation against.
#[async_trait]
pub trait SyncTarget: Send + Sync {
    /// Apply one queued mutation to the backend.
    async fn apply(&self, item: &MutationQueueItem) -> Result<()>;
}
