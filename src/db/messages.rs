use sqlx::{Pool, QueryBuilder, Sqlite};

use crate::db::models::MessageRow;
use crate::error::AppError;
use crate::messages::criteria::{FilterValue, SearchCriteria};

const MESSAGE_COLUMNS: &str = "id, event_id, parent_id, chat_thread_id, message_type, message, \
     user_id, chat_user_id, name, banned, data, deleted, read, created_at, updated_at, deleted_at";

pub struct MessageRepository;

impl MessageRepository {
    /// Equality on every filter predicate, newest first, bounded by the limit.
    pub async fn find_all(
        pool: &Pool<Sqlite>,
        criteria: &SearchCriteria,
    ) -> Result<Vec<MessageRow>, AppError> {
        let mut query = QueryBuilder::<Sqlite>::new("SELECT ");
        query.push(MESSAGE_COLUMNS).push(" FROM messages WHERE ");

        let mut conditions = query.separated(" AND ");
        for (field, value) in criteria.filter.predicates() {
            conditions.push(format!("{} = ", field.column()));
            match value {
                FilterValue::Int(v) => conditions.push_bind_unseparated(v),
                FilterValue::Bool(b) => conditions.push_bind_unseparated(b),
            };
        }

        query
            .push(format!(
                " ORDER BY {} {} LIMIT ",
                criteria.order.field.column(),
                criteria.order.direction.as_str()
            ))
            .push_bind(i64::from(criteria.limit));

        let rows = query.build_query_as::<MessageRow>().fetch_all(pool).await?;

        Ok(rows)
    }

    /// Sets `read` on every listed message in one statement.
    pub async fn mark_read(pool: &Pool<Sqlite>, ids: &[i64]) -> Result<u64, AppError> {
        if ids.is_empty() {
            return Ok(0);
        }

        let now = chrono::Utc::now().timestamp_millis();
        let mut query = QueryBuilder::<Sqlite>::new("UPDATE messages SET read = 1, updated_at = ");
        query.push_bind(now).push(" WHERE id IN (");

        let mut list = query.separated(", ");
        for id in ids {
            list.push_bind(*id);
        }
        list.push_unseparated(")");

        let result = query.build().execute(pool).await?;

        Ok(result.rows_affected())
    }
}
