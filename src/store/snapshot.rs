//! Read snapshots
//!
//! A `Snapshot` pins one read transaction. Every lookup through it sees the
//! same committed state, no matter what writers commit in the meantime.

use std::collections::BTreeMap;

use redb::{Database, ReadOnlyTable, ReadTransaction, ReadableTable};

use super::ENTRIES;
use crate::entry::{now_millis, EntryRecord};
use crate::error::{Result, StashError};

/// A consistent, read-only view of the store
pub struct Snapshot {
    table: ReadOnlyTable<&'static [u8], &'static [u8]>,

    /// Keeps the read transaction open as long as the table
    _txn: ReadTransaction,
}

impl Snapshot {
    /// Begin a read transaction and open the entries table
    pub(crate) fn begin(db: &Database) -> std::result::Result<Self, redb::Error> {
        let txn = db.begin_read()?;
        let table = txn.open_table(ENTRIES)?;
        Ok(Self { table, _txn: txn })
    }

    /// Get the live value for a key
    ///
    /// Absent and expired keys both yield `NotFound`.
    pub fn get(&self, key: &[u8]) -> Result<Vec<u8>> {
        let guard = self
            .table
            .get(key)
            .map_err(|e| StashError::Read(e.to_string()))?;

        let Some(guard) = guard else {
            tracing::trace!(key = %String::from_utf8_lossy(key), "get: absent");
            return Err(StashError::not_found(key));
        };

        let record = EntryRecord::decode(guard.value()).map_err(|e| {
            StashError::Read(format!("key {}: {}", String::from_utf8_lossy(key), e))
        })?;

        if record.is_expired(now_millis()) {
            tracing::trace!(key = %String::from_utf8_lossy(key), "get: expired");
            return Err(StashError::not_found(key));
        }

        Ok(record.value)
    }

    /// Collect every live entry whose key starts with `prefix`
    ///
    /// Keys come back in ascending byte order. Any failure while iterating
    /// discards what was collected so far.
    pub fn view_prefix(&self, prefix: &[u8]) -> Result<BTreeMap<Vec<u8>, Vec<u8>>> {
        let now = now_millis();
        let mut entries = BTreeMap::new();

        let range = self
            .table
            .range(prefix..)
            .map_err(|e| StashError::Scan(e.to_string()))?;

        for item in range {
            let (k, v) = item.map_err(|e| StashError::Scan(e.to_string()))?;
            let key = k.value();

            // Keys are sorted, so the first miss ends the prefix run
            if !key.starts_with(prefix) {
                break;
            }

            let record = EntryRecord::decode(v.value()).map_err(|e| {
                StashError::Scan(format!("key {}: {}", String::from_utf8_lossy(key), e))
            })?;

            if record.is_expired(now) {
                continue;
            }

            entries.insert(key.to_vec(), record.value);
        }

        Ok(entries)
    }
}
