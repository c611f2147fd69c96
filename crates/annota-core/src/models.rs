//! Core data models for annota.
//!
//! These types are shared across all annota crates and represent the note
//! domain entities plus the search result shapes derived from them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::defaults::SNIPPET_LENGTH;
use crate::offline::MutationOperation;

// =============================================================================
// NOTE TYPES
// =============================================================================

/// A user-owned note document.
///
/// `updated_at` is server-authoritative and increases monotonically on every
/// successful mutation; `id` never changes after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub id: Uuid,
    pub title: String,
    /// Sanitized HTML body.
    pub description: String,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub user_id: Uuid,
}

/// A partial set of note fields, used as a mutation payload.
///
/// Absent fields mean "leave unchanged" — merging a patch never overwrites a
/// base field with an absent value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NotePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<Uuid>,
}

impl NotePatch {
    /// True when the patch carries no fields at all.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.tags.is_none()
            && self.created_at.is_none()
            && self.updated_at.is_none()
            && self.user_id.is_none()
    }
}

/// Merge explicitly-provided patch fields over a base note.
///
/// Only fields present in the patch are applied; the rest of the base note is
/// carried through untouched. The note `id` is never patched.
pub fn merge_note_fields(base: &Note, patch: &NotePatch) -> Note {
    Note {
        id: base.id,
        title: patch.title.clone().unwrap_or_else(|| base.title.clone()),
        description: patch
            .description
            .clone()
            .unwrap_or_else(|| base.description.clone()),
        tags: patch.tags.clone().unwrap_or_else(|| base.tags.clone()),
        created_at: patch.created_at.unwrap_or(base.created_at),
        updated_at: patch.updated_at.unwrap_or(base.updated_at),
        user_id: patch.user_id.unwrap_or(base.user_id),
    }
}

/// Anything carrying an optional `updated_at` timestamp.
///
/// Used by [`pick_latest`] to select the freshest of several candidate
/// snapshots (e.g. cached vs. server copy of the same note).
pub trait UpdatedAtCarrier {
    fn updated_at(&self) -> Option<DateTime<Utc>>;
}

impl UpdatedAtCarrier for Note {
    fn updated_at(&self) -> Option<DateTime<Utc>> {
        Some(self.updated_at)
    }
}

impl UpdatedAtCarrier for CachedNote {
    fn updated_at(&self) -> Option<DateTime<Utc>> {
        Some(self.updated_at)
    }
}

impl UpdatedAtCarrier for SearchHit {
    fn updated_at(&self) -> Option<DateTime<Utc>> {
        Some(self.updated_at)
    }
}

/// Pick the candidate with the most recent `updated_at`.
///
/// Candidates without a timestamp always lose. Ties keep the earliest
/// candidate in iteration order. Returns `None` for an empty input.
pub fn pick_latest<'a, T, I>(candidates: I) -> Option<&'a T>
where
    T: UpdatedAtCarrier,
    I: IntoIterator<Item = &'a T>,
{
    candidates.into_iter().fold(None, |best, current| {
        match best {
            None => Some(current),
            Some(b) => {
                let best_at = b.updated_at();
                let current_at = current.updated_at();
                if current_at > best_at {
                    Some(current)
                } else {
                    Some(b)
                }
            }
        }
    })
}

// =============================================================================
// OFFLINE CACHE TYPES
// =============================================================================

/// Sync status of a locally cached note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoteSyncStatus {
    Synced,
    Pending,
    Failed,
}

/// A note as held by the offline cache: possibly partial, tagged with its
/// sync status and any operations still awaiting replay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedNote {
    pub id: Uuid,
    pub status: NoteSyncStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pending_ops: Vec<MutationOperation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<Uuid>,
}

impl CachedNote {
    /// Build a synced cache entry from a full note.
    pub fn from_note(note: &Note) -> Self {
        Self {
            id: note.id,
            status: NoteSyncStatus::Synced,
            title: Some(note.title.clone()),
            description: Some(note.description.clone()),
            tags: Some(note.tags.clone()),
            updated_at: note.updated_at,
            pending_ops: Vec::new(),
            user_id: Some(note.user_id),
        }
    }
}

// =============================================================================
// SEARCH RESULT TYPES
// =============================================================================

/// A note extended with relevance metadata, as returned by search.
///
/// `rank` is the FTS relevance score (0 on the fallback path) and `headline`
/// a snippet with highlighted matches (on the fallback path, a plain prefix
/// of the description).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub user_id: Uuid,
    pub rank: f32,
    pub headline: String,
}

impl SearchHit {
    /// Map a plain note row into the search hit shape used by the fallback
    /// path: `rank` is synthesized as 0 and `headline` as a prefix of the
    /// description (not a real highlighted snippet).
    pub fn from_fallback_note(note: Note) -> Self {
        let headline: String = note.description.chars().take(SNIPPET_LENGTH).collect();
        Self {
            id: note.id,
            title: note.title,
            description: note.description,
            tags: note.tags,
            created_at: note.created_at,
            updated_at: note.updated_at,
            user_id: note.user_id,
            rank: 0.0,
            headline,
        }
    }
}

/// Which search strategy produced a result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchMethod {
    Fts,
    Ilike,
}

/// One page of search results.
///
/// `total` is `None` when the backend did not report a count and the page was
/// full, i.e. more results may exist but the exact count is unknown.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    pub results: Vec<SearchHit>,
    pub total: Option<i64>,
    pub method: SearchMethod,
    pub execution_ms: u64,
}
