//! Core error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Storage error: {0}")]
    Storage(#[from] vantage_storage::StorageError),

    #[error("Session error: {0}")]
    Session(#[from] vantage_session::SessionError),

    #[error("Router error: {0}")]
    Router(#[from] vantage_router::RouterError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("API error {code}: {message}")]
    Api { code: i32, message: String },
}
