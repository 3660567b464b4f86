use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{FromRedisValue, RedisResult, Value};

use crate::error::AppError;
use crate::index::{
    read_cursor_key, FieldKind, FieldUpdateBatch, IndexDocument, IndexStatus, IndexStore,
    SearchOptions, MESSAGE_INDEX_SCHEMA,
};

/// RediSearch-backed index store.
///
/// Holds a multiplexed, auto-reconnecting connection that is cloned per
/// command. Nothing here closes it.
#[derive(Clone)]
pub struct RedisIndexStore {
    conn: ConnectionManager,
    timeout: Duration,
}

impl RedisIndexStore {
    pub async fn connect(url: &str, timeout: Duration) -> Result<Self, AppError> {
        let client = redis::Client::open(url)?;
        let conn = with_timeout("connect", timeout, ConnectionManager::new(client)).await?;
        Ok(Self { conn, timeout })
    }

    async fn query<T: FromRedisValue>(&self, op: &str, cmd: &redis::Cmd) -> Result<T, AppError> {
        let mut conn = self.conn.clone();
        with_timeout(op, self.timeout, cmd.query_async(&mut conn)).await
    }
}

async fn with_timeout<T, F>(op: &str, timeout: Duration, fut: F) -> Result<T, AppError>
where
    F: Future<Output = RedisResult<T>>,
{
    match tokio::time::timeout(timeout, fut).await {
        Ok(result) => Ok(result?),
        Err(_) => Err(AppError::IndexTimeout(format!("{} exceeded {:?}", op, timeout))),
    }
}

#[async_trait]
impl IndexStore for RedisIndexStore {
    async fn search(
        &self,
        index: &str,
        query: &str,
        options: &SearchOptions,
    ) -> Result<Vec<IndexDocument>, AppError> {
        let mut cmd = redis::cmd("FT.SEARCH");
        cmd.arg(index)
            .arg(query)
            .arg("LIMIT")
            .arg(options.offset)
            .arg(options.limit)
            .arg("SORTBY")
            .arg(options.sort.field.attribute())
            .arg(options.sort.direction.as_str());

        let reply: Value = self.query("FT.SEARCH", &cmd).await?;
        parse_search_reply(&reply)
    }

    async fn execute_batch(&self, batch: &FieldUpdateBatch) -> Result<usize, AppError> {
        if batch.is_empty() {
            return Ok(0);
        }

        let mut pipe = redis::pipe();
        pipe.atomic();
        for update in batch.updates() {
            pipe.hset(&update.key, &update.field, &update.value).ignore();
        }

        let mut conn = self.conn.clone();
        let () = with_timeout("MULTI/EXEC", self.timeout, pipe.query_async(&mut conn)).await?;

        Ok(batch.len())
    }

    async fn touch_read_cursor(&self, thread_id: i64, caller_id: i64) -> Result<(), AppError> {
        let mut cmd = redis::cmd("HSET");
        cmd.arg(read_cursor_key(thread_id)).arg(caller_id).arg(0);

        let _: i64 = self.query("HSET", &cmd).await?;
        Ok(())
    }

    async fn ensure_index(&self, index: &str, key_prefix: &str) -> Result<IndexStatus, AppError> {
        let mut cmd = redis::cmd("FT.CREATE");
        cmd.arg(index)
            .arg("ON")
            .arg("HASH")
            .arg("PREFIX")
            .arg(1)
            .arg(key_prefix)
            .arg("SCHEMA");

        for (name, kind) in MESSAGE_INDEX_SCHEMA {
            cmd.arg(*name);
            match kind {
                FieldKind::Numeric => cmd.arg("NUMERIC"),
                FieldKind::SortableNumeric => cmd.arg("NUMERIC").arg("SORTABLE"),
                FieldKind::Text => cmd.arg("TEXT"),
            };
        }

        match self.query::<()>("FT.CREATE", &cmd).await {
            Ok(()) => Ok(IndexStatus::Created),
            Err(AppError::Index(err)) if err.to_string().contains("Index already exists") => {
                Ok(IndexStatus::AlreadyExists)
            }
            Err(err) => Err(err),
        }
    }
}

/// Decodes an `FT.SEARCH` reply: `[total, key, [field, value, ...], key, ...]`.
pub fn parse_search_reply(reply: &Value) -> Result<Vec<IndexDocument>, AppError> {
    let items = match reply {
        Value::Bulk(items) => items,
        other => return Err(malformed(format!("expected array, got {:?}", other))),
    };

    let Some((total, rest)) = items.split_first() else {
        return Err(malformed("empty reply".to_string()));
    };
    if !matches!(total, Value::Int(_)) {
        return Err(malformed(format!("expected result count, got {:?}", total)));
    }
    if rest.len() % 2 != 0 {
        return Err(malformed("dangling document key".to_string()));
    }

    rest.chunks(2)
        .map(|pair| {
            let key: String = decode(&pair[0])?;
            let fields = match &pair[1] {
                Value::Bulk(values) if values.len() % 2 == 0 => values
                    .chunks(2)
                    .map(|kv| Ok((decode::<String>(&kv[0])?, decode::<String>(&kv[1])?)))
                    .collect::<Result<Vec<_>, AppError>>()?,
                Value::Nil => Vec::new(),
                other => {
                    return Err(malformed(format!("bad field list for {}: {:?}", key, other)))
                }
            };
            Ok(IndexDocument::new(key, fields))
        })
        .collect()
}

fn decode<T: FromRedisValue>(value: &Value) -> Result<T, AppError> {
    redis::from_redis_value(value).map_err(|e| malformed(e.to_string()))
}

fn malformed(detail: String) -> AppError {
    AppError::MalformedIndexReply(detail)
}
