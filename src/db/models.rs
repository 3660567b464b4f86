use sqlx::FromRow;

/// Session joined with its owner's role.
#[derive(Debug, Clone, FromRow)]
pub struct SessionCaller {
    pub user_id: i64,
    pub role: String,
}

/// A `messages` row as stored.
#[derive(Debug, Clone, FromRow)]
pub struct MessageRow {
    pub id: i64,
    pub event_id: Option<i64>,
    pub parent_id: Option<i64>,
    pub chat_thread_id: i64,
    pub message_type: Option<String>,
    pub message: Option<String>,
    pub user_id: i64,
    pub chat_user_id: Option<i64>,
    pub name: Option<String>,
    pub banned: Option<bool>,
    pub data: Option<String>,
    pub deleted: Option<bool>,
    pub read: Option<bool>,
    pub created_at: i64,
    pub updated_at: Option<i64>,
    pub deleted_at: Option<i64>,
}
