//! Offline mutation-queue types.
//!
//! A queued mutation is a pending, not-yet-confirmed change to a note,
//! recorded while the device is offline (or speculatively before the backend
//! acknowledges a write) and replayed later by the sync manager.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::NotePatch;

/// Kind of change a queue item represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MutationOperation {
    Create,
    Update,
    Delete,
}

/// Lifecycle state of a queue item.
///
/// `pending` → `syncing` when a replay batch picks the item up; `synced` on
/// backend acknowledgement (after which the item is removed); `failed` with
/// an attached error after a replay attempt throws — the item stays in the
/// queue for inspection and retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MutationStatus {
    Pending,
    Syncing,
    Failed,
    Synced,
}

/// A pending mutation in the offline queue.
///
/// `id` is client-generated and distinct from the note id; multiple items may
/// target the same `note_id` and must be replayed in enqueue order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MutationQueueItem {
    pub id: Uuid,
    pub note_id: Uuid,
    pub operation: MutationOperation,
    pub payload: NotePatch,
    /// Client-side timestamp used for conflict ordering against the server's
    /// `updated_at` (last-write-wins).
    pub client_updated_at: DateTime<Utc>,
    pub status: MutationStatus,
    pub attempts: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

/// Input for enqueueing a mutation; id, status, and attempt counter are
/// assigned by the queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MutationInput {
    pub note_id: Uuid,
    pub operation: MutationOperation,
    pub payload: NotePatch,
    pub client_updated_at: DateTime<Utc>,
}

/// Snapshot of the sync subsystem's health, suitable for a sync indicator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_sync_at: Option<DateTime<Utc>>,
    pub is_online: bool,
    pub queue_size: usize,
}
