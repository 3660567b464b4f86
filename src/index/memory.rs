//! In-process index store that understands the equality-range queries this
//! crate emits. Selected with `INDEX_BACKEND=memory` for local runs without
//! Redis, and used by the integration tests.

use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use async_trait::async_trait;
use redis::ErrorKind;

use crate::error::AppError;
use crate::index::query::MATCH_ALL;
use crate::index::{
    read_cursor_key, FieldUpdateBatch, IndexDocument, IndexStatus, IndexStore, SearchOptions,
};
use crate::messages::criteria::SortDirection;
use crate::messages::normalize::parse_int;

type Fields = HashMap<String, String>;

#[derive(Default)]
pub struct MemoryIndexStore {
    hashes: RwLock<BTreeMap<String, Fields>>,
    /// index name -> key prefix
    indexes: RwLock<HashMap<String, String>>,
}

impl MemoryIndexStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert<I, K, V>(&self, key: impl Into<String>, fields: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let fields = fields.into_iter().map(|(k, v)| (k.into(), v.into())).collect();
        write(&self.hashes).insert(key.into(), fields);
    }

    pub fn field(&self, key: &str, field: &str) -> Option<String> {
        read(&self.hashes).get(key).and_then(|h| h.get(field).cloned())
    }

    pub fn read_cursor(&self, thread_id: i64, caller_id: i64) -> Option<String> {
        self.field(&read_cursor_key(thread_id), &caller_id.to_string())
    }
}

fn read<T>(lock: &RwLock<T>) -> std::sync::RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|e| e.into_inner())
}

fn write<T>(lock: &RwLock<T>) -> std::sync::RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|e| e.into_inner())
}

#[derive(Debug, PartialEq)]
struct RangePredicate {
    field: String,
    min: i64,
    max: i64,
}

/// Parses a sequence of `@field:[min max]` terms, or `*`.
fn parse_query(query: &str) -> Result<Vec<RangePredicate>, AppError> {
    let query = query.trim();
    if query == MATCH_ALL {
        return Ok(Vec::new());
    }

    let bad = || AppError::Index((ErrorKind::ResponseError, "Syntax error").into());
    let mut predicates = Vec::new();
    let mut rest = query;

    while !rest.is_empty() {
        let term = rest.strip_prefix('@').ok_or_else(bad)?;
        let (field, term) = term.split_once(':').ok_or_else(bad)?;
        let term = term.trim_start().strip_prefix('[').ok_or_else(bad)?;
        let (range, term) = term.split_once(']').ok_or_else(bad)?;
        let (min, max) = range.trim().split_once(' ').ok_or_else(bad)?;

        predicates.push(RangePredicate {
            field: field.trim().to_string(),
            min: parse_int(min).ok_or_else(bad)?,
            max: parse_int(max).ok_or_else(bad)?,
        });
        rest = term.trim_start();
    }

    Ok(predicates)
}

#[async_trait]
impl IndexStore for MemoryIndexStore {
    async fn search(
        &self,
        index: &str,
        query: &str,
        options: &SearchOptions,
    ) -> Result<Vec<IndexDocument>, AppError> {
        let prefix = read(&self.indexes)
            .get(index)
            .cloned()
            .ok_or_else(|| AppError::Index((ErrorKind::ResponseError, "Unknown index name").into()))?;
        let predicates = parse_query(query)?;

        let mut matched: Vec<IndexDocument> = read(&self.hashes)
            .iter()
            .filter(|(key, _)| key.starts_with(&prefix))
            .filter(|(_, hash)| {
                predicates.iter().all(|p| {
                    hash.get(&p.field)
                        .and_then(|v| parse_int(v))
                        .is_some_and(|v| v >= p.min && v <= p.max)
                })
            })
            .map(|(key, hash)| IndexDocument::new(key.clone(), hash.clone()))
            .collect();

        let sort_field = options.sort.field.attribute();
        matched.sort_by_key(|doc| doc.int(sort_field).unwrap_or(i64::MIN));
        if options.sort.direction == SortDirection::Desc {
            matched.reverse();
        }

        Ok(matched
            .into_iter()
            .skip(options.offset as usize)
            .take(options.limit as usize)
            .collect())
    }

    async fn execute_batch(&self, batch: &FieldUpdateBatch) -> Result<usize, AppError> {
        let mut hashes = write(&self.hashes);
        for update in batch.updates() {
            hashes
                .entry(update.key.clone())
                .or_default()
                .insert(update.field.clone(), update.value.clone());
        }

        Ok(batch.len())
    }

    async fn touch_read_cursor(&self, thread_id: i64, caller_id: i64) -> Result<(), AppError> {
        write(&self.hashes)
            .entry(read_cursor_key(thread_id))
            .or_default()
            .insert(caller_id.to_string(), "0".to_string());
        Ok(())
    }

    async fn ensure_index(&self, index: &str, key_prefix: &str) -> Result<IndexStatus, AppError> {
        let mut indexes = write(&self.indexes);
        if indexes.contains_key(index) {
            return Ok(IndexStatus::AlreadyExists);
        }
        indexes.insert(index.to_string(), key_prefix.to_string());
        Ok(IndexStatus::Created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::criteria::SortOrder;

    #[test]
    fn test_parse_query() {
        assert!(parse_query("*").unwrap().is_empty());
        assert_eq!(
            parse_query("@chatThreadId:[42 42] @deleted:[0 0]").unwrap(),
            vec![
                RangePredicate { field: "chatThreadId".to_string(), min: 42, max: 42 },
                RangePredicate { field: "deleted".to_string(), min: 0, max: 0 },
            ]
        );
        assert!(parse_query("chatThreadId:42").is_err());
    }

    #[tokio::test]
    async fn test_search_filters_and_sorts() {
        let store = MemoryIndexStore::new();
        assert_eq!(
            store.ensure_index("idx:messages", "messages").await.unwrap(),
            IndexStatus::Created
        );
        assert_eq!(
            store.ensure_index("idx:messages", "messages").await.unwrap(),
            IndexStatus::AlreadyExists
        );

        store.insert("messages:1", [("chatThreadId", "1"), ("createdAt", "10")]);
        store.insert("messages:2", [("chatThreadId", "1"), ("createdAt", "30")]);
        store.insert("messages:3", [("chatThreadId", "2"), ("createdAt", "20")]);
        store.insert("other:4", [("chatThreadId", "1"), ("createdAt", "40")]);

        let options = SearchOptions { offset: 0, limit: 10, sort: SortOrder::NEWEST_FIRST };
        let docs = store
            .search("idx:messages", "@chatThreadId:[1 1]", &options)
            .await
            .unwrap();

        let keys: Vec<_> = docs.iter().map(|d| d.key.as_str()).collect();
        assert_eq!(keys, vec!["messages:2", "messages:1"]);
    }

    #[tokio::test]
    async fn test_batch_and_read_cursor() {
        let store = MemoryIndexStore::new();
        store.insert("messages:1", [("read", "0")]);

        let mut batch = FieldUpdateBatch::new();
        batch.set("messages:1", "read", 1);
        assert_eq!(store.execute_batch(&batch).await.unwrap(), 1);
        assert_eq!(store.field("messages:1", "read").as_deref(), Some("1"));

        store.touch_read_cursor(42, 5).await.unwrap();
        assert_eq!(store.read_cursor(42, 5).as_deref(), Some("0"));
    }

    #[tokio::test]
    async fn test_unknown_index_is_an_error() {
        let store = MemoryIndexStore::new();
        let options = SearchOptions { offset: 0, limit: 10, sort: SortOrder::NEWEST_FIRST };
        assert!(store.search("idx:missing", "*", &options).await.is_err());
    }
}
