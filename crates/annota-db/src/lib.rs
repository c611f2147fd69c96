//! # annota-db
//!
//! PostgreSQL database layer for annota.
//!
//! This crate provides:
//! - Connection pool management
//! - The user-scoped note repository
//! - The search backend: FTS via the `search_notes_fts` stored function plus
//!   the ILIKE substring fallback scan
//!
//! ## Example
//!
//! ```rust,ignore
//! use annota_db::{create_pool, PgNoteRepository, PgSearchBackend};
//! use annota_core::{CreateNoteRequest, NoteRepository};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let pool = create_pool("postgres://localhost/annota").await?;
//!     let notes = PgNoteRepository::new(pool.clone());
//!
//!     let note = notes
//!         .create(user_id, CreateNoteRequest {
//!             title: "Hello".to_string(),
//!             description: "<p>world</p>".to_string(),
//!             tags: vec!["greeting".to_string()],
//!         })
//!         .await?;
//!
//!     println!("Created note: {}", note.id);
//!     Ok(())
//! }
//! ```

pub mod notes;
pub mod pool;
pub mod search;

// Test fixtures for integration tests
// Note: Always compiled so integration tests (in tests/) can use DEFAULT_TEST_DATABASE_URL
pub mod test_fixtures;

// Re-export core types
pub use annota_core::*;

/// Escape LIKE/ILIKE wildcard characters (`%`, `_`, `\`) in user input.
pub fn escape_like(input: &str) -> String {
    input
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

// Re-export repository implementations
pub use notes::PgNoteRepository;
pub use pool::{create_pool, create_pool_with_config, log_pool_metrics, PoolConfig};
pub use search::PgSearchBackend;
