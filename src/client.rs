//! Client
//!
//! The text edge handed to a scripting runtime. Keys and values cross this
//! boundary as strings and are stored as their UTF-8 bytes.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use crate::config::StoreConfig;
use crate::error::{Result, StashError};
use crate::handle;
use crate::store::Store;

/// String-keyed view of the shared store
///
/// Cheap to clone; every clone talks to the same handle.
#[derive(Clone)]
pub struct Client {
    store: Arc<Store>,
}

impl Client {
    /// Connect to the process-wide store, opening it on first use
    ///
    /// `location` is ignored for in-memory stores and, like `in_memory`,
    /// for every call after the store has been opened.
    pub fn connect(location: &str, in_memory: bool) -> Result<Self> {
        let store = handle::acquire(StoreConfig::new(location, in_memory))?;
        Ok(Self { store })
    }

    /// Wrap an existing handle
    pub fn from_store(store: Arc<Store>) -> Self {
        Self { store }
    }

    /// Set a key
    pub fn set(&self, key: &str, value: &str) -> Result<()> {
        self.store.set(key.as_bytes(), value.as_bytes())
    }

    /// Set a key that expires after `ttl_seconds`
    pub fn set_with_ttl(&self, key: &str, value: &str, ttl_seconds: i64) -> Result<()> {
        let secs = u64::try_from(ttl_seconds).map_err(|_| StashError::InvalidTtl(ttl_seconds))?;
        self.store
            .set_with_ttl(key.as_bytes(), value.as_bytes(), Duration::from_secs(secs))
    }

    /// Get a key's value
    pub fn get(&self, key: &str) -> Result<String> {
        let bytes = self.store.get(key.as_bytes())?;
        String::from_utf8(bytes)
            .map_err(|e| StashError::Encoding(format!("value of key {}: {}", key, e)))
    }

    /// All live key/value pairs whose key starts with `prefix`
    pub fn view_prefix(&self, prefix: &str) -> Result<BTreeMap<String, String>> {
        self.store
            .view_prefix(prefix.as_bytes())?
            .into_iter()
            .map(|(k, v)| -> Result<(String, String)> {
                let key = String::from_utf8(k).map_err(|e| {
                    StashError::Encoding(format!(
                        "key {}: {}",
                        String::from_utf8_lossy(e.as_bytes()),
                        e
                    ))
                })?;
                let value = String::from_utf8(v)
                    .map_err(|e| StashError::Encoding(format!("value of key {}: {}", key, e)))?;
                Ok((key, value))
            })
            .collect()
    }

    /// Delete a key; missing keys are fine
    pub fn delete(&self, key: &str) -> Result<()> {
        self.store.delete(key.as_bytes())?;
        Ok(())
    }

    /// The underlying handle
    pub fn store(&self) -> &Arc<Store> {
        &self.store
    }
}
