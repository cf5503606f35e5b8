//! Vantage Storage Layer
//!
//! Durable key-value text storage that survives restarts.
//! The session store is the only writer; last write wins.

mod error;
mod memory;
mod migrations;
mod sqlite;
mod storage;

pub use error::StorageError;
pub use memory::MemoryStorage;
pub use sqlite::SqliteStorage;
pub use storage::{DurableStorage, JsonStorage};

pub type Result<T> = std::result::Result<T, StorageError>;
