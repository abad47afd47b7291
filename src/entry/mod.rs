//! Entry Module
//!
//! The record stored under every key.
//!
//! ## Responsibilities
//! - Carry the value plus an optional absolute expiry
//! - CRC32 checksums for corruption detection
//! - Decide liveness against a wall-clock timestamp
//!
//! ## Record Format
//! ```text
//! ┌─────────┬─────────┬──────────────────────────────────────┐
//! │ CRC (4) │ Len (4) │ bincode { expires_at_ms, value }     │
//! └─────────┴─────────┴──────────────────────────────────────┘
//! ```

mod record;

pub use record::{now_millis, EntryRecord, HEADER_SIZE};
