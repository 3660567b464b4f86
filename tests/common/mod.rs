//! Seeding helpers shared by the integration tests. They write straight to
//! the tables, since the service itself never creates users or messages.

#![allow(dead_code)]

use sqlx::{sqlite::SqlitePoolOptions, Pool, Sqlite};
use uuid::Uuid;

use chat_messages::config::{Config, IndexBackend};

pub const INDEX: &str = "idx:messages";
pub const PREFIX: &str = "messages";

pub async fn pool() -> Pool<Sqlite> {
    let db = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    sqlx::migrate!("./migrations").run(&db).await.unwrap();
    db
}

pub fn config() -> Config {
    Config {
        server_host: "127.0.0.1".to_string(),
        server_port: 0,
        database_url: "sqlite::memory:".to_string(),
        db_max_connections: 1,
        db_min_connections: 1,
        index_backend: IndexBackend::Memory,
        redis_url: String::new(),
        message_index: INDEX.to_string(),
        message_key_prefix: PREFIX.to_string(),
        index_timeout_secs: 5,
        request_timeout_secs: 30,
    }
}

/// Creates a user with `role` and returns its id and a live session token.
pub async fn login(db: &Pool<Sqlite>, username: &str, role: &str) -> (i64, String) {
    let now = chrono::Utc::now().timestamp();

    let user_id: i64 = sqlx::query_scalar(
        "INSERT INTO users (username, role, created_at) VALUES (?, ?, ?) RETURNING id",
    )
    .bind(username)
    .bind(role)
    .bind(now)
    .fetch_one(db)
    .await
    .unwrap();

    let token = Uuid::new_v4().to_string();
    sqlx::query("INSERT INTO sessions (id, user_id, token, expires_at, created_at) VALUES (?, ?, ?, ?, ?)")
        .bind(Uuid::new_v4().to_string())
        .bind(user_id)
        .bind(&token)
        .bind(now + 3600)
        .bind(now)
        .execute(db)
        .await
        .unwrap();

    (user_id, token)
}

pub struct Seed {
    pub thread_id: i64,
    pub user_id: i64,
    pub chat_user_id: Option<i64>,
    pub read: bool,
    pub deleted: bool,
    pub created_at: i64,
}

impl Seed {
    pub fn new(thread_id: i64, user_id: i64, created_at: i64) -> Self {
        Seed { thread_id, user_id, chat_user_id: None, read: false, deleted: false, created_at }
    }

    pub fn deleted(mut self) -> Self {
        self.deleted = true;
        self
    }

    pub fn to(mut self, chat_user_id: i64) -> Self {
        self.chat_user_id = Some(chat_user_id);
        self
    }
}

/// Stores an unreadable payload so the `{}` fallback shows in responses.
pub async fn insert_message(db: &Pool<Sqlite>, seed: Seed) -> i64 {
    sqlx::query_scalar(
        r#"
INSERT INTO messages (chat_thread_id, user_id, chat_user_id, message, data, read, deleted,
                      created_at, updated_at)
VALUES (?, ?, ?, 'hello', 'not-json', ?, ?, ?, ?)
RETURNING id
        "#,
    )
    .bind(seed.thread_id)
    .bind(seed.user_id)
    .bind(seed.chat_user_id)
    .bind(seed.read)
    .bind(seed.deleted)
    .bind(seed.created_at)
    .bind(seed.created_at)
    .fetch_one(db)
    .await
    .unwrap()
}

pub async fn read_flag(db: &Pool<Sqlite>, id: i64) -> bool {
    sqlx::query_scalar("SELECT read FROM messages WHERE id = ?")
        .bind(id)
        .fetch_one(db)
        .await
        .unwrap()
}

pub async fn updated_at(db: &Pool<Sqlite>, id: i64) -> Option<i64> {
    sqlx::query_scalar("SELECT updated_at FROM messages WHERE id = ?")
        .bind(id)
        .fetch_one(db)
        .await
        .unwrap()
}
