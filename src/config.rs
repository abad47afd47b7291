//! Configuration for StashKV
//!
//! The store configuration is fixed by whichever caller opens the handle
//! first. Later callers may pass their own, but it is only compared, never
//! applied.

use std::fmt;
use std::path::{Path, PathBuf};

/// Directory used when a persistent store is requested without a location
pub const FALLBACK_LOCATION: &str = "/tmp/stashkv";

/// Configuration for opening the store
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreConfig {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Directory holding the engine file. Empty means [`FALLBACK_LOCATION`].
    /// Ignored when `in_memory` is set.
    /// Internal structure:
    ///   {location}/
    ///     └── data.redb        (engine-owned, opaque)
    pub location: PathBuf,

    /// Keep everything in memory; data is discarded at process exit
    pub in_memory: bool,

    // -------------------------------------------------------------------------
    // Engine Tuning
    // -------------------------------------------------------------------------
    /// Engine page cache size in bytes (engine default when `None`)
    pub cache_size: Option<usize>,
}

impl StoreConfig {
    /// Config from the `(location, in_memory)` pair a caller supplies
    pub fn new(location: impl Into<PathBuf>, in_memory: bool) -> Self {
        Self {
            location: location.into(),
            in_memory,
            cache_size: None,
        }
    }

    /// Purely transient store
    pub fn in_memory() -> Self {
        Self::new(PathBuf::new(), true)
    }

    /// Persistent store at `location`
    pub fn persistent(location: impl Into<PathBuf>) -> Self {
        Self::new(location, false)
    }

    /// Create a new config builder
    pub fn builder() -> StoreConfigBuilder {
        StoreConfigBuilder::default()
    }

    /// Directory the engine file lives in, applying the fallback
    pub fn resolved_location(&self) -> &Path {
        if self.location.as_os_str().is_empty() {
            Path::new(FALLBACK_LOCATION)
        } else {
            &self.location
        }
    }

    /// Whether two configs would open the same store.
    ///
    /// Cache size is a tuning knob and does not count.
    pub fn is_equivalent(&self, other: &StoreConfig) -> bool {
        match (self.in_memory, other.in_memory) {
            (true, true) => true,
            (false, false) => self.resolved_location() == other.resolved_location(),
            _ => false,
        }
    }
}

impl fmt::Display for StoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.in_memory {
            write!(f, "in-memory store")
        } else {
            write!(f, "persistent store at {}", self.resolved_location().display())
        }
    }
}

/// Builder for StoreConfig
#[derive(Default)]
pub struct StoreConfigBuilder {
    config: StoreConfig,
}

impl StoreConfigBuilder {
    /// Set the storage directory
    pub fn location(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.location = path.into();
        self
    }

    /// Toggle in-memory mode
    pub fn in_memory(mut self, in_memory: bool) -> Self {
        self.config.in_memory = in_memory;
        self
    }

    /// Set the engine cache size (in bytes)
    pub fn cache_size(mut self, bytes: usize) -> Self {
        self.config.cache_size = Some(bytes);
        self
    }

    pub fn build(self) -> StoreConfig {
        self.config
    }
}
