use std::str::FromStr;
use std::time::Duration;

use crate::error::AppError;

/// Where the message index lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexBackend {
    Redis,
    /// In-process and empty on every start.
    Memory,
}

impl FromStr for IndexBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "redis" => Ok(IndexBackend::Redis),
            "memory" => Ok(IndexBackend::Memory),
            other => Err(format!("unknown backend '{}', expected redis or memory", other)),
        }
    }
}

#[derive(Clone)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    pub database_url: String,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub index_backend: IndexBackend,
    pub redis_url: String,
    pub message_index: String,
    pub message_key_prefix: String,
    pub index_timeout_secs: u64,
    pub request_timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Ok(Config {
            server_host: var_or("SERVER_HOST", "127.0.0.1"),
            server_port: parse_var("SERVER_PORT", "8080")?,
            database_url: var_or("DATABASE_URL", "sqlite://chat_messages.db"),
            db_max_connections: parse_var("DB_MAX_CONNECTIONS", "20")?,
            db_min_connections: parse_var("DB_MIN_CONNECTIONS", "5")?,
            index_backend: parse_var("INDEX_BACKEND", "redis")?,
            redis_url: var_or("REDIS_URL", "redis://127.0.0.1:6379"),
            message_index: var_or("MESSAGE_INDEX", "idx:messages"),
            message_key_prefix: var_or("MESSAGE_KEY_PREFIX", "messages"),
            index_timeout_secs: parse_var("INDEX_TIMEOUT_SECS", "5")?,
            request_timeout_secs: parse_var("REQUEST_TIMEOUT_SECS", "30")?,
        })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn index_timeout(&self) -> Duration {
        Duration::from_secs(self.index_timeout_secs)
    }
}

fn var_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_var<T>(key: &str, default: &str) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    var_or(key, default)
        .parse()
        .map_err(|e| AppError::Config(format!("Invalid {}: {}", key, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_backend_from_str() {
        assert_eq!("redis".parse::<IndexBackend>(), Ok(IndexBackend::Redis));
        assert_eq!(" Memory ".parse::<IndexBackend>(), Ok(IndexBackend::Memory));
        assert!("postgres".parse::<IndexBackend>().is_err());
    }
}
