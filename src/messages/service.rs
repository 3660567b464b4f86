use std::sync::Arc;

use sqlx::{Pool, Sqlite};
use tokio::task::JoinHandle;

use crate::db::MessageRepository;
use crate::error::AppError;
use crate::index::{search_options, to_index_query, IndexStore};
use crate::messages::criteria::{CallerIdentity, MessagesRequest, SearchCriteria};
use crate::messages::normalize::{normalize_document, Message};
use crate::messages::receipts::{self, IndexedMessage};

/// Result of one thread read.
pub struct MessagePage {
    pub messages: Vec<Message>,
    /// Background receipt task on the index path.
    pub receipts: Option<JoinHandle<()>>,
}

/// Reads thread messages from whichever store the caller's role selects.
///
/// API callers read the authoritative relational store. Everyone else reads
/// the search index. A failing store fails the request; the other store is
/// never consulted, since the two are not kept strictly in sync.
#[derive(Clone)]
pub struct MessageService {
    db: Pool<Sqlite>,
    index: Arc<dyn IndexStore>,
    index_name: String,
    key_prefix: String,
}

impl MessageService {
    pub fn new(
        db: Pool<Sqlite>,
        index: Arc<dyn IndexStore>,
        index_name: impl Into<String>,
        key_prefix: impl Into<String>,
    ) -> Self {
        Self {
            db,
            index,
            index_name: index_name.into(),
            key_prefix: key_prefix.into(),
        }
    }

    pub async fn fetch(
        &self,
        caller: &CallerIdentity,
        thread_id: i64,
        request: &MessagesRequest,
    ) -> Result<MessagePage, AppError> {
        let criteria = SearchCriteria::from_request(thread_id, request, caller);

        if caller.role.reads_relational_store() {
            self.fetch_relational(caller, &criteria).await
        } else {
            self.fetch_indexed(caller, &criteria).await
        }
    }

    async fn fetch_relational(
        &self,
        caller: &CallerIdentity,
        criteria: &SearchCriteria,
    ) -> Result<MessagePage, AppError> {
        let rows = MessageRepository::find_all(&self.db, criteria).await?;
        let messages: Vec<Message> = rows.into_iter().map(Message::from).collect();

        receipts::mark_relational(&self.db, &messages, caller).await;

        Ok(MessagePage {
            messages,
            receipts: None,
        })
    }

    async fn fetch_indexed(
        &self,
        caller: &CallerIdentity,
        criteria: &SearchCriteria,
    ) -> Result<MessagePage, AppError> {
        let query = to_index_query(&criteria.filter);
        tracing::debug!(index = %self.index_name, %query, limit = criteria.limit, "searching message index");

        let documents = self
            .index
            .search(&self.index_name, &query, &search_options(criteria))
            .await?;

        let indexed: Vec<IndexedMessage> = documents
            .into_iter()
            .map(|doc| {
                let message = normalize_document(&doc, &self.key_prefix);
                IndexedMessage { key: doc.key, message }
            })
            .collect();

        let batch = receipts::receipt_batch(&indexed, caller);
        let handle = receipts::spawn_index_receipts(
            self.index.clone(),
            batch,
            criteria.filter.chat_thread_id,
            caller.id,
        );

        Ok(MessagePage {
            messages: indexed.into_iter().map(|item| item.message).collect(),
            receipts: Some(handle),
        })
    }
}
