pub mod models;
pub mod sessions;
pub mod messages;

pub use models::{SessionCaller, MessageRow};
pub use sessions::SessionRepository;
pub use messages::MessageRepository;
