//! Round-trip law for the chunked transfer protocol: splitting then
//! reassembling yields the original text exactly, for any chunk size and for
//! chunk frames delivered in any order.

use annota_bridge::{consume_chunked_message, send_chunked_text, BridgeMessage, ChunkBufferStore};

fn roundtrip(text: &str, chunk_size: usize) -> String {
    let mut sent: Vec<BridgeMessage> = Vec::new();
    send_chunked_text(|m| sent.push(m), "EDITOR_CONTENT", text, chunk_size);

    if sent.len() == 1 {
        // Single plain message: payload carries the text directly.
        return sent[0]
            .payload
            .as_ref()
            .and_then(|p| p.as_str())
            .unwrap()
            .to_string();
    }

    let mut store = ChunkBufferStore::new();
    let mut completed = None;
    for message in &sent {
        if let Some(done) = consume_chunked_message(message, &mut store) {
            completed = Some(done);
        }
    }
    let done = completed.expect("transfer never completed");
    assert_eq!(done.base_type, "EDITOR_CONTENT");
    assert!(store.is_empty(), "completed transfer must be evicted");
    done.text
}

#[test]
fn roundtrip_short_text_is_zero_overhead() {
    let text = "hello world";
    let mut sent = Vec::new();
    send_chunked_text(|m| sent.push(m), "EDITOR_CONTENT", text, 30_000);

    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].msg_type, "EDITOR_CONTENT");
    assert_eq!(sent[0].payload.as_ref().unwrap().as_str().unwrap(), text);
}

#[test]
fn roundtrip_various_lengths_and_chunk_sizes() {
    let texts = [
        String::new(),
        "a".to_string(),
        "hello world".to_string(),
        "x".repeat(29_999),
        "x".repeat(30_000),
        "x".repeat(30_001),
        "y".repeat(90_000), // exact multiple of 30_000
        "z".repeat(100_000),
    ];

    for text in &texts {
        for chunk_size in [1usize, 2, 30_000] {
            assert_eq!(
                &roundtrip(text, chunk_size),
                text,
                "len={} chunk_size={}",
                text.len(),
                chunk_size
            );
        }
    }
}

#[test]
fn roundtrip_preserves_multibyte_text() {
    let text = "Заметка про серверы — 日本語のノート 🚀".repeat(2000);
    for chunk_size in [1usize, 7, 30_000] {
        assert_eq!(roundtrip(&text, chunk_size), text);
    }
}

#[test]
fn roundtrip_tolerates_out_of_order_chunks() {
    let text: String = (0..2600).map(|i| ((b'a' + (i % 26) as u8) as char)).collect();
    let mut sent = Vec::new();
    send_chunked_text(|m| sent.push(m), "T", &text, 100);

    // start, chunks reversed, end
    let start = sent.remove(0);
    let end = sent.pop().unwrap();
    sent.reverse();

    let mut store = ChunkBufferStore::new();
    assert!(consume_chunked_message(&start, &mut store).is_none());
    for chunk in &sent {
        assert!(consume_chunked_message(chunk, &mut store).is_none());
    }
    let done = consume_chunked_message(&end, &mut store).unwrap();
    assert_eq!(done.text, text);
}

#[test]
fn concurrent_transfers_are_independent() {
    let first = "1".repeat(500);
    let second = "2".repeat(500);

    let mut sent_first = Vec::new();
    send_chunked_text(|m| sent_first.push(m), "T", &first, 100);
    let mut sent_second = Vec::new();
    send_chunked_text(|m| sent_second.push(m), "T", &second, 100);

    // Interleave the two transfers frame by frame.
    let mut store = ChunkBufferStore::new();
    let mut results = Vec::new();
    let mut iters = (sent_first.into_iter(), sent_second.into_iter());
    loop {
        let a = iters.0.next();
        let b = iters.1.next();
        if a.is_none() && b.is_none() {
            break;
        }
        for message in [a, b].into_iter().flatten() {
            if let Some(done) = consume_chunked_message(&message, &mut store) {
                results.push(done.text);
            }
        }
    }

    assert_eq!(results, vec![first, second]);
    assert!(store.is_empty());
}
