use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde::Serialize;

use crate::api::state::AppState;
use crate::error::AppError;
use crate::messages::{CallerIdentity, Message, MessagesRequest};

#[derive(Debug, Serialize)]
pub struct MessagesResponse {
    pub success: bool,
    pub data: Vec<Message>,
}

/// POST /api/chat/threads/:thread_id/messages (requires caller)
pub async fn thread_messages(
    State(state): State<AppState>,
    caller: Option<Extension<CallerIdentity>>,
    Path(thread_id): Path<i64>,
    Json(request): Json<MessagesRequest>,
) -> Result<Json<MessagesResponse>, AppError> {
    let Some(Extension(caller)) = caller else {
        return Err(AppError::Unauthenticated);
    };

    let page = state.messages.fetch(&caller, thread_id, &request).await?;

    // Receipts on the index path finish on their own; the response does not wait.
    drop(page.receipts);

    Ok(Json(MessagesResponse {
        success: true,
        data: page.messages,
    }))
}
