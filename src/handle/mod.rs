//! Handle Module
//!
//! Owns the decision of whether and how to open the store, and hands out
//! the one shared handle.
//!
//! ## Lifecycle
//! ```text
//!              ┌──────────┐   acquire    ┌─────────┐   ok    ┌────────┐
//!              │ Unopened │ ───────────▶ │ Opening │ ──────▶ │ Opened │
//!              └──────────┘              └────┬────┘         └────────┘
//!                                            │ err
//!                                            ▼
//!                                     ┌──────────────┐
//!                                     │ FailedToOpen │ ── acquire retries
//!                                     └──────────────┘
//! ```
//!
//! The check and the open run under one mutex. Callers arriving while an
//! open is in progress block until it finishes and then either share the
//! new handle or retry after a failure.

mod manager;

pub use manager::{acquire, acquire_exact, global, HandleManager, HandleState};
