//! Mutation-chain compaction.
//!
//! Collapses the queued operations for each note into the minimal set that
//! still produces the same backend state:
//!
//! 1. create + delete (with any updates in between) → nothing (noop)
//! 2. create + update(s) → one create carrying the final payload
//! 3. update + update(s) → one update carrying the final payload
//! 4. update/delete without create, ending in delete → one delete
//!
//! The output is re-marked `pending` (it forms a fresh set for replay) and
//! ordered by `client_updated_at` to keep overall execution order. This is
//! an optimization the replay driver may apply before a drain; the queue
//! itself never compacts.

use std::collections::HashMap;

use uuid::Uuid;

use annota_core::{MutationOperation, MutationQueueItem, MutationStatus};

/// Compact a queue snapshot. The input may contain items in any status; the
/// result is a new pending set, not a mutation of the input.
pub fn compact_queue(items: &[MutationQueueItem]) -> Vec<MutationQueueItem> {
    let mut by_note: HashMap<Uuid, Vec<&MutationQueueItem>> = HashMap::new();
    let mut note_order: Vec<Uuid> = Vec::new();
    for item in items {
        let entry = by_note.entry(item.note_id).or_default();
        if entry.is_empty() {
            note_order.push(item.note_id);
        }
        entry.push(item);
    }

    let mut result: Vec<MutationQueueItem> = Vec::new();

    for note_id in note_order {
        let mut ops = by_note.remove(&note_id).unwrap_or_default();
        ops.sort_by_key(|op| op.client_updated_at);
        let first = ops[0];
        let last = ops[ops.len() - 1];

        let has_create = ops.iter().any(|op| op.operation == MutationOperation::Create);
        let has_delete = ops.iter().any(|op| op.operation == MutationOperation::Delete);

        // 1) create + delete: the note never reached the backend — noop.
        if has_create && has_delete {
            continue;
        }

        // 2) delete without create: one delete wins.
        if !has_create && last.operation == MutationOperation::Delete {
            result.push(with_pending_status(last.clone()));
            continue;
        }

        // 3) create (+ updates): one create with the final payload.
        if has_create {
            let mut collapsed = first.clone();
            collapsed.operation = MutationOperation::Create;
            collapsed.payload = last.payload.clone();
            collapsed.client_updated_at = last.client_updated_at;
            collapsed.id = last.id;
            result.push(with_pending_status(collapsed));
            continue;
        }

        // 4) update (+ updates): the final update carries everything needed.
        if last.operation == MutationOperation::Update {
            result.push(with_pending_status(last.clone()));
        }
    }

    result.sort_by_key(|item| item.client_updated_at);
    result
}

fn with_pending_status(mut item: MutationQueueItem) -> MutationQueueItem {
    item.status = MutationStatus::Pending;
    item
}

#[cfg(test)]
mod tests {
    use super::*;
    use annota_core::NotePatch;
    use chrono::{DateTime, TimeZone, Utc};

    fn ts(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    fn item(
        note_id: Uuid,
        operation: MutationOperation,
        title: &str,
        at: DateTime<Utc>,
    ) -> MutationQueueItem {
        MutationQueueItem {
            id: Uuid::new_v4(),
            note_id,
            operation,
            payload: NotePatch {
                title: Some(title.to_string()),
                ..Default::default()
            },
            client_updated_at: at,
            status: MutationStatus::Failed,
            attempts: 2,
            last_error: Some("earlier failure".to_string()),
        }
    }

    #[test]
    fn test_create_then_delete_is_noop() {
        let note = Uuid::new_v4();
        let items = vec![
            item(note, MutationOperation::Create, "v1", ts(1)),
            item(note, MutationOperation::Update, "v2", ts(2)),
            item(note, MutationOperation::Delete, "v2", ts(3)),
        ];
        assert!(compact_queue(&items).is_empty());
    }

    #[test]
    fn test_create_plus_updates_collapse_to_create() {
        let note = Uuid::new_v4();
        let items = vec![
            item(note, MutationOperation::Create, "v1", ts(1)),
            item(note, MutationOperation::Update, "v2", ts(2)),
            item(note, MutationOperation::Update, "v3", ts(3)),
        ];

        let compacted = compact_queue(&items);
        assert_eq!(compacted.len(), 1);
        assert_eq!(compacted[0].operation, MutationOperation::Create);
        assert_eq!(compacted[0].payload.title.as_deref(), Some("v3"));
        assert_eq!(compacted[0].client_updated_at, ts(3));
    }

    #[test]
    fn test_updates_collapse_to_final_update() {
        let note = Uuid::new_v4();
        let items = vec![
            item(note, MutationOperation::Update, "v1", ts(1)),
            item(note, MutationOperation::Update, "v2", ts(2)),
        ];

        let compacted = compact_queue(&items);
        assert_eq!(compacted.len(), 1);
        assert_eq!(compacted[0].operation, MutationOperation::Update);
        assert_eq!(compacted[0].payload.title.as_deref(), Some("v2"));
    }

    #[test]
    fn test_trailing_delete_without_create_keeps_delete() {
        let note = Uuid::new_v4();
        let items = vec![
            item(note, MutationOperation::Update, "v1", ts(1)),
            item(note, MutationOperation::Delete, "v1", ts(2)),
        ];

        let compacted = compact_queue(&items);
        assert_eq!(compacted.len(), 1);
        assert_eq!(compacted[0].operation, MutationOperation::Delete);
    }

    #[test]
    fn test_output_is_pending_regardless_of_input_status() {
        let note = Uuid::new_v4();
        let items = vec![item(note, MutationOperation::Update, "v1", ts(1))];

        let compacted = compact_queue(&items);
        assert_eq!(compacted[0].status, MutationStatus::Pending);
    }

    #[test]
    fn test_result_ordered_by_client_timestamp_across_notes() {
        let note_a = Uuid::new_v4();
        let note_b = Uuid::new_v4();
        let items = vec![
            item(note_b, MutationOperation::Update, "b", ts(5)),
            item(note_a, MutationOperation::Update, "a", ts(1)),
        ];

        let compacted = compact_queue(&items);
        assert_eq!(compacted.len(), 2);
        assert_eq!(compacted[0].note_id, note_a);
        assert_eq!(compacted[1].note_id, note_b);
    }

    #[test]
    fn test_unsorted_input_still_uses_latest_payload() {
        let note = Uuid::new_v4();
        let items = vec![
            item(note, MutationOperation::Update, "newest", ts(9)),
            item(note, MutationOperation::Update, "oldest", ts(1)),
        ];

        let compacted = compact_queue(&items);
        assert_eq!(compacted[0].payload.title.as_deref(), Some("newest"));
    }
}
