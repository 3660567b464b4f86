//! Search-index store: a denormalized copy of messages held as hashes and
//! queried through a RediSearch index.

pub mod memory;
pub mod query;
pub mod redis_store;

pub use memory::MemoryIndexStore;
pub use query::{search_options, to_index_params, to_index_query};
pub use redis_store::RedisIndexStore;

use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::AppError;
use crate::messages::criteria::SortOrder;
use crate::messages::normalize::parse_int;

/// Field types of the message index, in declaration order.
pub const MESSAGE_INDEX_SCHEMA: &[(&str, FieldKind)] = &[
    ("userId", FieldKind::Numeric),
    ("messageType", FieldKind::Text),
    ("chatThreadId", FieldKind::Numeric),
    ("chatUserId", FieldKind::Numeric),
    ("message", FieldKind::Text),
    ("deleted", FieldKind::Numeric),
    ("createdAt", FieldKind::SortableNumeric),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Numeric,
    SortableNumeric,
    Text,
}

/// Hash key holding per-caller read cursors for a thread.
pub fn read_cursor_key(thread_id: i64) -> String {
    format!("RMC:{}", thread_id)
}

/// One matched record: its opaque hash key plus raw field values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexDocument {
    pub key: String,
    pub fields: HashMap<String, String>,
}

impl IndexDocument {
    pub fn new<I>(key: impl Into<String>, fields: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        Self {
            key: key.into(),
            fields: fields.into_iter().collect(),
        }
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    pub fn int(&self, field: &str) -> Option<i64> {
        self.get(field).and_then(parse_int)
    }

    /// Numeric flag: anything greater than zero is set.
    pub fn flag(&self, field: &str) -> bool {
        self.get(field)
            .and_then(|v| v.trim().parse::<f64>().ok())
            .is_some_and(|v| v > 0.0)
    }

    /// The part of the key after `prefix` and its `:` separator.
    pub fn key_suffix(&self, prefix: &str) -> Option<&str> {
        self.key
            .strip_prefix(prefix)
            .map(|rest| rest.trim_start_matches(':'))
            .filter(|rest| !rest.is_empty())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchOptions {
    pub offset: u32,
    pub limit: u32,
    pub sort: SortOrder,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldUpdate {
    pub key: String,
    pub field: String,
    pub value: String,
}

/// Field writes queued for a single all-or-nothing submission.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldUpdateBatch {
    updates: Vec<FieldUpdate>,
}

impl FieldUpdateBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: impl Into<String>, field: impl Into<String>, value: impl ToString) {
        self.updates.push(FieldUpdate {
            key: key.into(),
            field: field.into(),
            value: value.to_string(),
        });
    }

    pub fn updates(&self) -> &[FieldUpdate] {
        &self.updates
    }

    pub fn len(&self) -> usize {
        self.updates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.updates.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexStatus {
    Created,
    AlreadyExists,
}

/// Operations the message service needs from the search index.
///
/// Implementations own their connection lifecycle; callers never close
/// anything they obtain through this trait.
#[async_trait]
pub trait IndexStore: Send + Sync {
    /// Run `query` against `index`, returning matches in sort order.
    async fn search(
        &self,
        index: &str,
        query: &str,
        options: &SearchOptions,
    ) -> Result<Vec<IndexDocument>, AppError>;

    /// Apply every queued update together. Returns the number applied.
    async fn execute_batch(&self, batch: &FieldUpdateBatch) -> Result<usize, AppError>;

    /// Record that `caller_id` has caught up on `thread_id`.
    async fn touch_read_cursor(&self, thread_id: i64, caller_id: i64) -> Result<(), AppError>;

    /// Create the message index over hashes under `key_prefix` unless it exists.
    async fn ensure_index(&self, index: &str, key_prefix: &str) -> Result<IndexStatus, AppError>;
}
