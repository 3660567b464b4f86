use std::sync::Arc;
use sqlx::{Pool, Sqlite};
use crate::config::Config;
use crate::messages::MessageService;

#[derive(Clone)]
pub struct AppState {
    pub db: Pool<Sqlite>,
    pub messages: MessageService,
    pub config: Arc<Config>,
}
