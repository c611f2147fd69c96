//! # annota-core
//!
//! Core types, traits, and abstractions for the annota note engine.
//!
//! This crate provides the foundational data structures and trait definitions
//! that other annota crates depend on: the note domain model, the offline
//! mutation-queue types, the storage-adapter and search-backend seams, the
//! shared error taxonomy, and the structured-logging schema.

pub mod defaults;
pub mod error;
pub mod logging;
pub mod models;
pub mod offline;
pub mod traits;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use models::{
    merge_note_fields, pick_latest, CachedNote, Note, NotePatch, NoteSyncStatus, SearchHit,
    SearchMethod, SearchResponse, UpdatedAtCarrier,
};
pub use offline::{
    MutationInput, MutationOperation, MutationQueueItem, MutationStatus, SyncState,
};
pub use traits::{
    CreateNoteRequest, FtsPage, FtsQuery, ListNotesRequest, NoteRepository, OfflineStore,
    ScanQuery, SearchBackend, SyncTarget,
};
