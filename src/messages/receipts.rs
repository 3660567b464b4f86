//! Implicit read receipts: fetching a thread marks other people's unread
//! messages in it as read.

use std::collections::HashSet;
use std::sync::Arc;

use sqlx::{Pool, Sqlite};
use tokio::task::JoinHandle;

use crate::db::MessageRepository;
use crate::index::{FieldUpdateBatch, IndexStore};
use crate::messages::criteria::CallerIdentity;
use crate::messages::normalize::Message;

/// A message fetched from the index together with its hash key.
#[derive(Debug, Clone)]
pub struct IndexedMessage {
    pub key: String,
    pub message: Message,
}

/// Records without a known author count as someone else's.
pub fn needs_receipt(message: &Message, caller: &CallerIdentity) -> bool {
    message.user_id != Some(caller.id) && !message.read
}

pub fn unread_ids(messages: &[Message], caller: &CallerIdentity) -> Vec<i64> {
    let mut seen = HashSet::new();
    messages
        .iter()
        .filter(|m| needs_receipt(m, caller))
        .filter_map(|m| m.id)
        .filter(|id| seen.insert(*id))
        .collect()
}

/// Queues `read = 1` for every qualifying hash, once per key.
pub fn receipt_batch(indexed: &[IndexedMessage], caller: &CallerIdentity) -> FieldUpdateBatch {
    let mut seen = HashSet::new();
    let mut batch = FieldUpdateBatch::new();
    for item in indexed {
        if needs_receipt(&item.message, caller) && seen.insert(item.key.as_str()) {
            batch.set(item.key.as_str(), "read", 1);
        }
    }
    batch
}

/// Marks unread messages in the relational store before the response goes
/// out. Failures are logged and swallowed.
pub async fn mark_relational(pool: &Pool<Sqlite>, messages: &[Message], caller: &CallerIdentity) -> u64 {
    let ids = unread_ids(messages, caller);
    if ids.is_empty() {
        return 0;
    }

    match MessageRepository::mark_read(pool, &ids).await {
        Ok(updated) => {
            tracing::debug!(caller = caller.id, updated, "marked messages read");
            updated
        }
        Err(e) => {
            tracing::warn!(caller = caller.id, "failed to mark {} messages read: {}", ids.len(), e);
            0
        }
    }
}

/// Submits the receipt batch and records the caller's read cursor on a
/// background task. The caller's response never waits on it.
pub fn spawn_index_receipts(
    store: Arc<dyn IndexStore>,
    batch: FieldUpdateBatch,
    thread_id: i64,
    caller_id: i64,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        if !batch.is_empty() {
            match store.execute_batch(&batch).await {
                Ok(applied) => {
                    tracing::debug!(thread_id, caller = caller_id, applied, "read receipts applied")
                }
                Err(e) => tracing::warn!(
                    thread_id,
                    caller = caller_id,
                    "read receipt batch of {} failed: {}",
                    batch.len(),
                    e
                ),
            }
        }

        if let Err(e) = store.touch_read_cursor(thread_id, caller_id).await {
            tracing::warn!(thread_id, caller = caller_id, "failed to record read cursor: {}", e);
        }
    })
}
