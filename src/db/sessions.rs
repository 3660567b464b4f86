use sqlx::{Pool, Sqlite};

use crate::db::models::SessionCaller;
use crate::error::AppError;

pub struct SessionRepository;

impl SessionRepository {
    /// Resolves a live session token to its user and role tag.
    pub async fn get_caller(
        pool: &Pool<Sqlite>,
        token: &str,
    ) -> Result<Option<SessionCaller>, AppError> {
        let now = chrono::Utc::now().timestamp();

        let caller = sqlx::query_as::<_, SessionCaller>(
            r#"
SELECT s.user_id, u.role
FROM sessions s
JOIN users u ON s.user_id = u.id
WHERE s.token = ? AND s.expires_at > ?
            "#,
        )
        .bind(token)
        .bind(now)
        .fetch_optional(pool)
        .await?;

        Ok(caller)
    }

    pub async fn cleanup_expired(pool: &Pool<Sqlite>) -> Result<u64, AppError> {
        let now = chrono::Utc::now().timestamp();

        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= ?")
            .bind(now)
            .execute(pool)
            .await?;

        Ok(result.rows_affected())
    }
}
