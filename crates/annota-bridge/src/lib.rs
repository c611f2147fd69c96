//! # annota-bridge
//!
//! Transport glue between a native mobile shell and the web editor it hosts
//! inside a WebView.
//!
//! This crate provides:
//! - A chunked transfer protocol that splits large text payloads into bounded
//!   `postMessage`-shaped frames and reassembles them losslessly
//! - A debounced last-writer-wins scheduler coordinating editor autosave and
//!   editor-to-host content sync
//!
//! ## Example
//!
//! ```ignore
//! use annota_bridge::{send_chunked_text, consume_chunked_message, ChunkBufferStore};
//!
//! let mut sent = Vec::new();
//! send_chunked_text(|m| sent.push(m), "EDITOR_CONTENT", &html, 30_000);
//!
//! let mut store = ChunkBufferStore::new();
//! for message in sent {
//!     if let Some(done) = consume_chunked_message(&message, &mut store) {
//!         println!("{}: {} chars", done.base_type, done.text.len());
//!     }
//! }
//! ```

pub mod chunk;
pub mod debounce;

pub use chunk::{
    consume_chunked_message, send_chunked_text, BridgeMessage, ChunkBufferStore, ChunkFrame,
    Reassembled, DEFAULT_CHUNK_SIZE,
};
pub use debounce::{DebouncedLatest, FlushEvent};
