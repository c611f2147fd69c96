//! Centralized default constants for the annota system.
//!
//! **This module is the single source of truth** for all shared default
//! values. Crates reference these constants instead of defining their own
//! magic numbers. When adding new constants, place them in the appropriate
//! section and document the rationale for the chosen value.

// =============================================================================
// SEARCH
// =============================================================================

/// Minimum query length (characters, after trimming).
pub const QUERY_MIN_LEN: usize = 3;

/// Maximum query length (characters).
pub const QUERY_MAX_LEN: usize = 1000;

/// Default page size for search endpoints.
pub const SEARCH_PAGE_LIMIT: i64 = 20;

/// Hard cap on a single search page.
pub const SEARCH_PAGE_LIMIT_MAX: i64 = 100;

/// Wall-clock threshold above which a search is logged as slow.
pub const SLOW_SEARCH_MS: u64 = 1000;

// =============================================================================
// SNIPPET
// =============================================================================

/// Snippet/headline length in characters for search results and lists.
pub const SNIPPET_LENGTH: usize = 200;

// =============================================================================
// EDITOR BRIDGE
// =============================================================================

/// Default chunk size (characters) for chunked transfers across the WebView
/// message channel. Comfortably under practical postMessage payload limits
/// while keeping the message count low for typical note bodies.
pub const BRIDGE_CHUNK_SIZE: usize = 30_000;

/// Default debounce delay for editor autosave.
pub const AUTOSAVE_DEBOUNCE_MS: u64 = 800;

/// Capacity of the debounce flush-event broadcast channel.
pub const FLUSH_EVENT_CAPACITY: usize = 64;

// =============================================================================
// OFFLINE SYNC
// =============================================================================

/// Queue items replayed per sync cycle.
pub const SYNC_BATCH_SIZE: usize = 10;

/// Replay attempts before an item is left failed for manual retry.
pub const SYNC_MAX_ATTEMPTS: i32 = 5;

/// Byte budget for the offline note cache before eviction kicks in.
pub const OFFLINE_CACHE_LIMIT_BYTES: usize = 8 * 1024 * 1024;
