//! Chunked transfer protocol for the WebView message channel.
//!
//! The channel carries `{type, payload}` JSON messages and is reliable and
//! in-order, but individual messages have practical size limits. Texts that
//! fit in one chunk are sent as a single plain message (zero overhead);
//! larger texts are framed as `<type>_CHUNK_START`, `total` messages of
//! `<type>_CHUNK` (explicitly indexed, so duplicate or out-of-order chunk
//! delivery within one transfer is tolerated), and `<type>_CHUNK_END`.
//!
//! The receiving side buffers chunks by index per `transfer_id` and only
//! reassembles on `_CHUNK_END`. Malformed or unknown frames are dropped, not
//! errors: a stray message must not crash either host. Nothing here bounds
//! `total` or chunk sizes — the transport/caller owns that.

use std::collections::HashMap;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};

use annota_core::defaults::BRIDGE_CHUNK_SIZE;

/// Default chunk size (characters) for editor content transfers.
pub const DEFAULT_CHUNK_SIZE: usize = BRIDGE_CHUNK_SIZE;

const CHUNK_START_SUFFIX: &str = "_CHUNK_START";
const CHUNK_SUFFIX: &str = "_CHUNK";
const CHUNK_END_SUFFIX: &str = "_CHUNK_END";

/// A raw message on the WebView channel.
///
/// The `_CHUNK_START`/`_CHUNK`/`_CHUNK_END` type suffixes are reserved
/// protocol framing; application message types must not collide with them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BridgeMessage {
    #[serde(rename = "type")]
    pub msg_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<JsonValue>,
}

impl BridgeMessage {
    /// Build a plain (non-chunked) text message.
    pub fn plain(msg_type: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            msg_type: msg_type.into(),
            payload: Some(JsonValue::String(text.into())),
        }
    }
}

#[derive(Deserialize)]
struct StartPayload {
    #[serde(rename = "transferId")]
    transfer_id: String,
    total: u64,
}

#[derive(Deserialize)]
struct ChunkPayload {
    #[serde(rename = "transferId")]
    transfer_id: String,
    index: u64,
    chunk: String,
}

#[derive(Deserialize)]
struct EndPayload {
    #[serde(rename = "transferId")]
    transfer_id: String,
}

/// A chunk-protocol frame, validated at the channel boundary.
///
/// Classification is the single place raw payloads are inspected; everything
/// downstream works with this sum type instead of re-probing `type` suffixes.
#[derive(Debug, Clone, PartialEq)]
pub enum ChunkFrame {
    Start {
        base_type: String,
        transfer_id: String,
        total: usize,
    },
    Chunk {
        base_type: String,
        transfer_id: String,
        index: usize,
        chunk: String,
    },
    End {
        base_type: String,
        transfer_id: String,
    },
}

impl ChunkFrame {
    /// Classify a raw message into a protocol frame.
    ///
    /// Returns `None` for application messages (no reserved suffix) and for
    /// malformed frames (missing/empty `transferId`, non-numeric `total` or
    /// `index`, non-string `chunk`).
    pub fn classify(message: &BridgeMessage) -> Option<ChunkFrame> {
        let msg_type = message.msg_type.as_str();
        let payload = message.payload.clone()?;

        if let Some(base) = msg_type.strip_suffix(CHUNK_START_SUFFIX) {
            let p: StartPayload = serde_json::from_value(payload).ok()?;
            if p.transfer_id.is_empty() {
                return None;
            }
            return Some(ChunkFrame::Start {
                base_type: base.to_string(),
                transfer_id: p.transfer_id,
                total: p.total as usize,
            });
        }

        if let Some(base) = msg_type.strip_suffix(CHUNK_END_SUFFIX) {
            let p: EndPayload = serde_json::from_value(payload).ok()?;
            if p.transfer_id.is_empty() {
                return None;
            }
            return Some(ChunkFrame::End {
                base_type: base.to_string(),
                transfer_id: p.transfer_id,
            });
        }

        if let Some(base) = msg_type.strip_suffix(CHUNK_SUFFIX) {
            let p: ChunkPayload = serde_json::from_value(payload).ok()?;
            if p.transfer_id.is_empty() {
                return None;
            }
            return Some(ChunkFrame::Chunk {
                base_type: base.to_string(),
                transfer_id: p.transfer_id,
                index: p.index as usize,
                chunk: p.chunk,
            });
        }

        None
    }
}

#[derive(Debug)]
struct ChunkBuffer {
    total: usize,
    /// Chunks stored by index; holes stay `None` until (if ever) filled.
    chunks: Vec<Option<String>>,
}

/// Per-transfer reassembly buffers, keyed by transfer id.
///
/// Must be owned by exactly one message-handling context (one per WebView
/// bridge instance). Entries are removed only on `_CHUNK_END`; callers should
/// [`clear`](ChunkBufferStore::clear) the store on transport teardown so
/// aborted transfers do not accumulate.
#[derive(Debug, Default)]
pub struct ChunkBufferStore {
    transfers: HashMap<String, ChunkBuffer>,
}

impl ChunkBufferStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of in-flight transfers.
    pub fn len(&self) -> usize {
        self.transfers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transfers.is_empty()
    }

    /// Drop all in-flight transfers (transport teardown).
    pub fn clear(&mut self) {
        self.transfers.clear();
    }
}

/// A completed chunked transfer.
#[derive(Debug, Clone, PartialEq)]
pub struct Reassembled {
    /// The application message type the transfer was framed under.
    pub base_type: String,
    pub text: String,
}

/// Split `text` into bounded messages and emit them through `send`.
///
/// Texts of at most `chunk_size` characters are emitted as exactly one plain
/// `{type, payload}` message. Larger texts are framed as start / indexed
/// chunks / end, with a transfer id unique enough to disambiguate concurrent
/// transfers of the same type. Chunk boundaries fall on character boundaries,
/// never inside a UTF-8 sequence.
pub fn send_chunked_text<F>(mut send: F, msg_type: &str, text: &str, chunk_size: usize)
where
    F: FnMut(BridgeMessage),
{
    let chunk_size = chunk_size.max(1);
    let char_count = text.chars().count();

    if char_count <= chunk_size {
        send(BridgeMessage::plain(msg_type, text));
        return;
    }

    let transfer_id = new_transfer_id(msg_type);
    let total = char_count.div_ceil(chunk_size);

    send(BridgeMessage {
        msg_type: format!("{msg_type}{CHUNK_START_SUFFIX}"),
        payload: Some(json!({ "transferId": transfer_id.as_str(), "total": total })),
    });

    let mut index = 0usize;
    let mut buf = String::new();
    let mut buf_chars = 0usize;
    for ch in text.chars() {
        buf.push(ch);
        buf_chars += 1;
        if buf_chars == chunk_size {
            send(BridgeMessage {
                msg_type: format!("{msg_type}{CHUNK_SUFFIX}"),
                payload: Some(json!({
                    "transferId": transfer_id.as_str(),
                    "index": index,
                    "chunk": std::mem::take(&mut buf),
                })),
            });
            buf_chars = 0;
            index += 1;
        }
    }
    if !buf.is_empty() {
        send(BridgeMessage {
            msg_type: format!("{msg_type}{CHUNK_SUFFIX}"),
            payload: Some(json!({
                "transferId": transfer_id.as_str(),
                "index": index,
                "chunk": buf,
            })),
        });
    }

    send(BridgeMessage {
        msg_type: format!("{msg_type}{CHUNK_END_SUFFIX}"),
        payload: Some(json!({ "transferId": transfer_id })),
    });
}

/// Feed one incoming message into the reassembly store.
///
/// Returns `Some` only when the message completes a transfer; every other
/// case — application messages, start/chunk frames, malformed frames, chunks
/// or ends referencing an unknown transfer — returns `None`, so callers must
/// always check before treating the result as completed text.
///
/// Reassembly on `_CHUNK_END` is lossy: any index never delivered stays a
/// hole and contributes nothing to the joined text.
pub fn consume_chunked_message(
    message: &BridgeMessage,
    store: &mut ChunkBufferStore,
) -> Option<Reassembled> {
    match ChunkFrame::classify(message)? {
        ChunkFrame::Start {
            transfer_id, total, ..
        } => {
            store.transfers.insert(
                transfer_id,
                ChunkBuffer {
                    total,
                    chunks: Vec::with_capacity(total),
                },
            );
            None
        }
        ChunkFrame::Chunk {
            transfer_id,
            index,
            chunk,
            ..
        } => {
            // Chunk for an unknown transfer (arrived before start, or after
            // end already cleared it) is dropped.
            let entry = store.transfers.get_mut(&transfer_id)?;
            if index >= entry.chunks.len() {
                entry.chunks.resize(index + 1, None);
            }
            entry.chunks[index] = Some(chunk);
            None
        }
        ChunkFrame::End {
            base_type,
            transfer_id,
        } => {
            let entry = store.transfers.remove(&transfer_id)?;
            let text: String = entry.chunks.into_iter().flatten().collect();
            Some(Reassembled { base_type, text })
        }
    }
}

fn new_transfer_id(msg_type: &str) -> String {
    format!(
        "{}_{}_{:08x}",
        msg_type,
        Utc::now().timestamp_millis(),
        rand::random::<u32>()
    )
}
