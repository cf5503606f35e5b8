//! Durable storage contract

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::StorageError;
use crate::Result;

/// Key-value text storage scoped to one application origin.
pub trait DurableStorage: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;

    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<()>;
}

/// JSON helpers layered over any [`DurableStorage`].
pub trait JsonStorage {
    /// Returns `Ok(None)` when the key is absent and `Err(StorageError::Json)`
    /// when a value is present but does not decode.
    fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>>;

    fn set_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()>;
}

impl<S: DurableStorage + ?Sized> JsonStorage for S {
    fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.get(key)? {
            Some(raw) => serde_json::from_str(&raw)
                .map(Some)
                .map_err(|source| StorageError::Json {
                    key: key.to_string(),
                    source,
                }),
            None => Ok(None),
        }
    }

    fn set_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let raw = serde_json::to_string(value).map_err(|source| StorageError::Json {
            key: key.to_string(),
            source,
        })?;
        self.set(key, &raw)
    }
}

pub(crate) fn check_key(key: &str) -> Result<()> {
    if key.trim().is_empty() {
        return Err(StorageError::EmptyKey);
    }
    Ok(())
}
