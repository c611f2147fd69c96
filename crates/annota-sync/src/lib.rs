//! # annota-sync
//!
//! Offline-first sync engine for annota notes.
//!
//! This crate provides:
//! - A durable, ordered mutation queue recording local edits as intents
//! - A replay driver reconciling the queue against the backend in batches,
//!   preserving per-note ordering and continuing past individual failures
//! - Queue compaction collapsing per-note mutation chains before replay
//! - An offline note cache with byte-budget eviction
//! - A complete in-memory storage adapter
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use annota_sync::{MemoryStore, SyncConfig, SyncManager};
//!
//! let store = Arc::new(MemoryStore::new());
//! let manager = Arc::new(SyncManager::new(store, target, SyncConfig::default()));
//!
//! manager.enqueue(input).await?;     // drains opportunistically when online
//! manager.handle_online().await?;    // replays everything pending
//! let state = manager.state().await?;
//! println!("{} items still queued", state.queue_size);
//! ```

pub mod cache;
pub mod compact;
pub mod manager;
pub mod memory;
pub mod queue;

pub use cache::OfflineCache;
pub use compact::compact_queue;
pub use manager::{DrainReport, SyncConfig, SyncManager};
pub use memory::MemoryStore;
pub use queue::MutationQueue;
