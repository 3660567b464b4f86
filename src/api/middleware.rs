use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};

use crate::api::state::AppState;
use crate::db::SessionRepository;
use crate::error::AppError;
use crate::messages::{CallerIdentity, Role};

/// Resolves `Authorization: Bearer <token>` to a [`CallerIdentity`].
///
/// Requests without a valid session pass through anonymously; handlers that
/// need a caller reject them.
pub async fn resolve_caller(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string());

    if let Some(token) = token {
        match SessionRepository::get_caller(&state.db, &token).await? {
            Some(session) => {
                let caller = CallerIdentity::new(session.user_id, Role::from_tag(&session.role));
                request.extensions_mut().insert(caller);
            }
            None => tracing::debug!("unknown or expired session token"),
        }
    }

    Ok(next.run(request).await)
}
