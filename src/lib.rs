//! # StashKV
//!
//! A process-wide embedded key-value store handle for many concurrent
//! callers, with:
//! - Create-once handle publication under concurrent initialization
//! - Atomic set/delete, one transaction per operation
//! - Snapshot-isolated gets and prefix scans
//! - Per-entry TTL expiry
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │            Callers (virtual users / script threads)          │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ acquire(config)
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                   Handle Manager                             │
//! │          (mutex-guarded create-once, Arc<Store>)             │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                      Store                                   │
//! │   set / set_with_ttl / get / view_prefix / delete            │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ one transaction per call
//!                       ▼
//!                ┌─────────────┐
//!                │    redb     │  file backend or in-memory
//!                └─────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod entry;
pub mod store;
pub mod handle;
pub mod client;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{StashError, Result};
pub use config::StoreConfig;
pub use store::{Store, Snapshot};
pub use handle::{acquire, acquire_exact, HandleManager, HandleState};
pub use client::Client;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of StashKV
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
