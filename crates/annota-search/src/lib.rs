//! # annota-search
//!
//! Search pipeline for annota notes.
//!
//! This crate provides:
//! - Tri-state query building (`token:*` AND-joined) with validation
//! - Unicode-script-based query language detection
//! - FTS-first search with a one-shot ILIKE substring fallback
//! - Incremental pagination accounting for infinite-scroll consumers
//!
//! ## Example
//!
//! ```ignore
//! use annota_search::{SearchConfig, SearchOptions, SearchPipeline};
//!
//! let pipeline = SearchPipeline::new(backend, SearchConfig::new(0.01));
//! let page = pipeline
//!     .search(Some(user_id), "quarterly report", SearchOptions::default())
//!     .await?;
//! println!("{} hits via {:?}", page.results.len(), page.method);
//! ```

pub mod pagination;
pub mod pipeline;
pub mod query;

pub use pagination::{compute_has_more, compute_total, SearchPager};
pub use pipeline::{SearchConfig, SearchOptions, SearchPipeline};
pub use query::{build_ts_query, detect_language, Language};
