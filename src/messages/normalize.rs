//! Canonical message shape and conversion from both stores' raw records.

use serde::Serialize;
use serde_json::Value;

use crate::db::models::MessageRow;
use crate::index::IndexDocument;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    #[default]
    Text,
    Tip,
    Image,
    File,
}

impl MessageType {
    /// Unknown or missing tags fall back to `text`, the column default.
    pub fn from_tag(tag: Option<&str>) -> Self {
        match tag.map(|t| t.trim().to_ascii_lowercase()).as_deref() {
            Some("tip") => MessageType::Tip,
            Some("image") => MessageType::Image,
            Some("file") => MessageType::File,
            _ => MessageType::Text,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Numeric id; index records keyed by something else leave it unset.
    pub id: Option<i64>,
    pub event_id: Option<i64>,
    pub parent_id: Option<i64>,
    pub chat_thread_id: Option<i64>,
    pub message_type: MessageType,
    pub message: Option<String>,
    pub user_id: Option<i64>,
    pub chat_user_id: Option<i64>,
    pub name: Option<String>,
    pub banned: bool,
    pub data: Value,
    pub deleted: bool,
    pub read: bool,
    pub created_at: Option<i64>,
    pub updated_at: Option<i64>,
    pub deleted_at: Option<i64>,
}

/// Decodes a stored payload, substituting `{}` for anything absent,
/// undecodable, falsy (`null`, `false`, `0`, `""`) or an empty array.
pub fn parse_payload(raw: Option<&str>) -> Value {
    let empty = || Value::Object(serde_json::Map::new());

    let Some(raw) = raw.filter(|r| !r.trim().is_empty()) else {
        return empty();
    };

    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Null) | Ok(Value::Bool(false)) | Err(_) => empty(),
        Ok(Value::String(s)) if s.is_empty() => empty(),
        Ok(Value::Number(n)) if n.as_f64() == Some(0.0) => empty(),
        Ok(Value::Array(a)) if a.is_empty() => empty(),
        Ok(value) => value,
    }
}

impl From<MessageRow> for Message {
    fn from(row: MessageRow) -> Self {
        Message {
            id: Some(row.id),
            event_id: row.event_id,
            parent_id: row.parent_id,
            chat_thread_id: Some(row.chat_thread_id),
            message_type: MessageType::from_tag(row.message_type.as_deref()),
            message: row.message,
            user_id: Some(row.user_id),
            chat_user_id: row.chat_user_id,
            name: row.name,
            banned: row.banned.unwrap_or(false),
            data: parse_payload(row.data.as_deref()),
            deleted: row.deleted.unwrap_or(false),
            read: row.read.unwrap_or(false),
            created_at: Some(row.created_at),
            updated_at: row.updated_at,
            deleted_at: row.deleted_at,
        }
    }
}

/// Index hashes store every value as text and every flag as `0`/`1`.
/// Missing or non-numeric fields stay unset; the hash key is opaque and only
/// lends the id when its suffix happens to be numeric.
pub fn normalize_document(doc: &IndexDocument, key_prefix: &str) -> Message {
    Message {
        id: doc
            .int("id")
            .or_else(|| doc.key_suffix(key_prefix).and_then(parse_int)),
        event_id: doc.int("eventId"),
        parent_id: doc.int("parentId"),
        chat_thread_id: doc.int("chatThreadId"),
        message_type: MessageType::from_tag(doc.get("messageType")),
        message: doc.get("message").map(str::to_string),
        user_id: doc.int("userId"),
        chat_user_id: doc.int("chatUserId"),
        name: doc.get("name").map(str::to_string),
        banned: doc.flag("banned"),
        data: parse_payload(doc.get("data")),
        deleted: doc.flag("deleted"),
        read: doc.flag("read"),
        created_at: doc.int("createdAt"),
        updated_at: doc.int("updatedAt"),
        deleted_at: doc.int("deletedAt"),
    }
}

/// Accepts integral text and integral floats such as `"42.0"`.
pub(crate) fn parse_int(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    raw.parse::<i64>().ok().or_else(|| {
        raw.parse::<f64>()
            .ok()
            .filter(|f| f.is_finite() && f.fract() == 0.0)
            .map(|f| f as i64)
    })
}
