use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Authentication required")]
    Unauthenticated,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Index store error: {0}")]
    Index(#[from] redis::RedisError),

    #[error("Malformed index reply: {0}")]
    MalformedIndexReply(String),

    #[error("Index store timed out: {0}")]
    IndexTimeout(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

// Axum IntoResponse implementation for HTTP errors
impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        use axum::http::StatusCode;

        let status = match &self {
            AppError::Unauthenticated => StatusCode::UNAUTHORIZED,
            AppError::Database(_) | AppError::Index(_) | AppError::MalformedIndexReply(_) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            AppError::IndexTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            AppError::Migration(_) | AppError::Config(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        if status.is_server_error() {
            tracing::error!("request failed: {}", self);
        }

        let body = serde_json::json!({
            "success": false,
            "error": self.to_string(),
        });

        (status, axum::Json(body)).into_response()
    }
}
