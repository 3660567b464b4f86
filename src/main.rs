use std::sync::Arc;
use std::time::Duration;
use sqlx::sqlite::SqlitePoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use chat_messages::{
    api::{create_router, AppState},
    config::{Config, IndexBackend},
    db::SessionRepository,
    error::AppError,
    index::{IndexStatus, IndexStore, MemoryIndexStore, RedisIndexStore},
    messages::MessageService,
};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,chat_messages=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting chat message service v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = Arc::new(Config::from_env()?);
    tracing::info!("Configuration loaded");

    // Setup database with proper connection pooling
    let db = SqlitePoolOptions::new()
        .max_connections(config.db_max_connections)
        .min_connections(config.db_min_connections)
        .acquire_timeout(Duration::from_secs(30))
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(1800))
        .connect(&config.database_url)
        .await?;

    tracing::info!("Database connected: {}", config.database_url);

    // Run migrations
    sqlx::migrate!("./migrations").run(&db).await?;
    tracing::info!("Database migrations completed");

    // Connect index store and make sure the message index exists
    let index: Arc<dyn IndexStore> = match config.index_backend {
        IndexBackend::Redis => {
            let store = RedisIndexStore::connect(&config.redis_url, config.index_timeout()).await?;
            tracing::info!("Index store connected: {}", config.redis_url);
            Arc::new(store)
        }
        IndexBackend::Memory => {
            tracing::warn!("Using in-process index store; indexed messages are lost on restart");
            Arc::new(MemoryIndexStore::new())
        }
    };

    match index
        .ensure_index(&config.message_index, &config.message_key_prefix)
        .await?
    {
        IndexStatus::Created => tracing::info!("Created search index {}", config.message_index),
        IndexStatus::AlreadyExists => {
            tracing::info!("Search index {} exists already, skipped creation", config.message_index)
        }
    }

    // Create shared application state
    let messages = MessageService::new(
        db.clone(),
        index,
        config.message_index.clone(),
        config.message_key_prefix.clone(),
    );

    let state = AppState {
        db: db.clone(),
        messages,
        config: config.clone(),
    };

    // Spawn background task for session cleanup
    {
        let db_clone = db.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(3600));
            loop {
                interval.tick().await;
                match SessionRepository::cleanup_expired(&db_clone).await {
                    Ok(removed) => tracing::debug!("Expired sessions cleaned up: {}", removed),
                    Err(e) => tracing::error!("Session cleanup failed: {}", e),
                }
            }
        });
    }

    // Build router
    let app = create_router(state);

    // Bind and serve
    let addr = config.server_address();
    tracing::info!("Server listening on http://{}", addr);
    tracing::info!("  GET  /api/health");
    tracing::info!("  POST /api/chat/threads/:thread_id/messages (requires auth)");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to bind to {}: {}", addr, e)))?;

    axum::serve(listener, app)
        .await
        .map_err(|e| AppError::Internal(format!("Server error: {}", e)))?;

    Ok(())
}
