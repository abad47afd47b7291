//! Store Module
//!
//! The key-value operations facade over the embedded engine.
//!
//! ## Responsibilities
//! - One engine transaction per operation
//! - Writes (set/set_with_ttl/delete) commit atomically or not at all
//! - Reads (get/view_prefix) observe one MVCC snapshot
//! - Expired entries are treated as absent by every read
//!
//! ## Concurrency
//! The facade takes no locks of its own. The engine serializes write
//! transactions and gives every read transaction a fixed snapshot, so a
//! `Store` behind an `Arc` can be used from any number of threads.
//!
//! ## Layout
//! ```text
//! table "entries": key (bytes) → EntryRecord (see entry module)
//! ```

mod db;
mod snapshot;

pub use db::Store;
pub use snapshot::Snapshot;

use redb::TableDefinition;

/// The single table holding every entry
pub(crate) const ENTRIES: TableDefinition<&[u8], &[u8]> = TableDefinition::new("entries");
