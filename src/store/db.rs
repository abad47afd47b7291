//! Store implementation
//!
//! Wraps the redb database and runs every operation in its own transaction.

use std::collections::BTreeMap;
use std::fmt::Display;
use std::fs;
use std::time::Duration;

use redb::backends::InMemoryBackend;
use redb::{Database, ReadableTable};

use super::{Snapshot, ENTRIES};
use crate::config::StoreConfig;
use crate::entry::{now_millis, EntryRecord};
use crate::error::{Result, StashError};

/// The opened store
///
/// ## Transactions
/// - **Writes** (set/set_with_ttl/delete/purge_expired): one write
///   transaction each; dropped uncommitted on any error, so nothing partial
///   is ever visible
/// - **Reads** (get/view_prefix): one read transaction each, see [`Snapshot`]
pub struct Store {
    /// Engine instance
    db: Database,

    /// Configuration the store was opened with
    config: StoreConfig,
}

impl Store {
    // =========================================================================
    // Internal Path Constants
    // =========================================================================
    const DB_FILENAME: &'static str = "data.redb";

    /// Open the engine described by `config`
    ///
    /// On startup:
    /// 1. Create the storage directory (persistent mode only)
    /// 2. Open or create the engine file, or an in-memory backend
    /// 3. Create the entries table so readers never find it missing
    pub fn open(config: StoreConfig) -> Result<Self> {
        let described = config.to_string();
        let open_err = |reason: String| StashError::Open {
            location: described.clone(),
            reason,
        };

        let mut builder = Database::builder();
        if let Some(bytes) = config.cache_size {
            builder.set_cache_size(bytes);
        }

        let db = if config.in_memory {
            builder
                .create_with_backend(InMemoryBackend::new())
                .map_err(|e| open_err(e.to_string()))?
        } else {
            let dir = config.resolved_location();
            fs::create_dir_all(dir)
                .map_err(|e| open_err(format!("cannot create {}: {}", dir.display(), e)))?;
            builder
                .create(dir.join(Self::DB_FILENAME))
                .map_err(|e| open_err(e.to_string()))?
        };

        let txn = db.begin_write().map_err(|e| open_err(e.to_string()))?;
        {
            let _table = txn
                .open_table(ENTRIES)
                .map_err(|e| open_err(e.to_string()))?;
        }
        txn.commit().map_err(|e| open_err(e.to_string()))?;

        tracing::info!(store = %config, "Store opened");

        Ok(Self { db, config })
    }

    /// Set a key, overwriting any previous value and TTL
    pub fn set(&self, key: &[u8], value: &[u8]) -> Result<()> {
        self.put_record(key, value, None)
    }

    /// Set a key that expires `ttl` after the write commits
    ///
    /// A zero TTL stores an entry that is already expired.
    pub fn set_with_ttl(&self, key: &[u8], value: &[u8], ttl: Duration) -> Result<()> {
        self.put_record(key, value, Some(ttl))
    }

    /// Get the live value for a key, or `NotFound`
    pub fn get(&self, key: &[u8]) -> Result<Vec<u8>> {
        let snapshot =
            Snapshot::begin(&self.db).map_err(|e| StashError::Read(e.to_string()))?;
        snapshot.get(key)
    }

    /// All live entries under `prefix`, ascending; empty prefix means all
    pub fn view_prefix(&self, prefix: &[u8]) -> Result<BTreeMap<Vec<u8>, Vec<u8>>> {
        let snapshot =
            Snapshot::begin(&self.db).map_err(|e| StashError::Scan(e.to_string()))?;
        snapshot.view_prefix(prefix)
    }

    /// Delete a key
    ///
    /// Missing keys commit an empty transaction. Returns whether a live
    /// entry was removed.
    pub fn delete(&self, key: &[u8]) -> Result<bool> {
        let now = now_millis();
        let txn = self.db.begin_write().map_err(write_err)?;

        let removed = {
            let mut table = txn.open_table(ENTRIES).map_err(write_err)?;
            let old = table.remove(key).map_err(write_err)?;
            match old {
                Some(guard) => {
                    EntryRecord::decode(guard.value()).map_or(true, |r| !r.is_expired(now))
                }
                None => false,
            }
        };

        txn.commit().map_err(write_err)?;

        tracing::trace!(key = %String::from_utf8_lossy(key), removed, "delete");
        Ok(removed)
    }

    /// Begin an explicit read snapshot
    pub fn snapshot(&self) -> Result<Snapshot> {
        Snapshot::begin(&self.db).map_err(|e| StashError::Read(e.to_string()))
    }

    /// Physically remove every expired entry in one write transaction
    ///
    /// Records that fail to decode are left alone.
    pub fn purge_expired(&self) -> Result<usize> {
        let now = now_millis();
        let txn = self.db.begin_write().map_err(write_err)?;

        let purged = {
            let mut table = txn.open_table(ENTRIES).map_err(write_err)?;

            let mut expired = Vec::new();
            for item in table.iter().map_err(write_err)? {
                let (k, v) = item.map_err(write_err)?;
                if let Ok(record) = EntryRecord::decode(v.value()) {
                    if record.is_expired(now) {
                        expired.push(k.value().to_vec());
                    }
                }
            }

            for key in &expired {
                table.remove(key.as_slice()).map_err(write_err)?;
            }

            expired.len()
        };

        txn.commit().map_err(write_err)?;

        if purged > 0 {
            tracing::debug!(purged, "Purged expired entries");
        }
        Ok(purged)
    }

    /// Get the configuration
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Write one record in its own transaction
    ///
    /// The expiry clock starts once the write lock is held, so time spent
    /// waiting behind other writers does not eat into the TTL.
    fn put_record(&self, key: &[u8], value: &[u8], ttl: Option<Duration>) -> Result<()> {
        let txn = self.db.begin_write().map_err(write_err)?;
        {
            let record = match ttl {
                Some(ttl) => EntryRecord::with_ttl(value.to_vec(), ttl, now_millis()),
                None => EntryRecord::new(value.to_vec()),
            };
            let encoded = record.encode().map_err(write_err)?;

            let mut table = txn.open_table(ENTRIES).map_err(write_err)?;
            table.insert(key, encoded.as_slice()).map_err(write_err)?;
        }
        txn.commit().map_err(write_err)?;

        tracing::trace!(
            key = %String::from_utf8_lossy(key),
            ttl = ttl.is_some(),
            "set"
        );
        Ok(())
    }
}

fn write_err(e: impl Display) -> StashError {
    StashError::Write(e.to_string())
}
