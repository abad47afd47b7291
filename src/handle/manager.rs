//! Handle Manager
//!
//! Create-once publication of the shared `Store`.

use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::{const_mutex, Mutex};

use crate::config::StoreConfig;
use crate::error::{Result, StashError};
use crate::store::Store;

/// The process-wide manager behind [`acquire`]
static GLOBAL: HandleManager = HandleManager::new();

/// Acquire the process-wide store handle
///
/// The first successful caller's configuration wins; later configurations
/// are ignored (with a warning if they differ).
pub fn acquire(config: StoreConfig) -> Result<Arc<Store>> {
    GLOBAL.acquire(config)
}

/// Like [`acquire`], but a differing configuration is an error
pub fn acquire_exact(config: StoreConfig) -> Result<Arc<Store>> {
    GLOBAL.acquire_exact(config)
}

/// The process-wide manager
pub fn global() -> &'static HandleManager {
    &GLOBAL
}

/// Observable lifecycle state of a manager
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum HandleState {
    Unopened = 0,
    Opening = 1,
    Opened = 2,
    FailedToOpen = 3,
}

impl HandleState {
    fn from_u8(raw: u8) -> Self {
        match raw {
            1 => HandleState::Opening,
            2 => HandleState::Opened,
            3 => HandleState::FailedToOpen,
            _ => HandleState::Unopened,
        }
    }
}

/// What to do when a handle exists but the caller asked for something else
#[derive(Debug, Clone, Copy)]
enum Reconfigure {
    Ignore,
    Reject,
}

/// Publishes at most one `Store`
///
/// ## Concurrency:
/// - `slot`: the only shared mutable state; check-and-open happens while
///   holding it, so two callers can never both open
/// - `state`, `opens`: atomics for lock-free observation
pub struct HandleManager {
    /// The published handle, once opened
    slot: Mutex<Option<Arc<Store>>>,

    /// Current `HandleState` as its discriminant
    state: AtomicU8,

    /// Successful opens (never exceeds 1)
    opens: AtomicUsize,
}

impl HandleManager {
    /// Create a manager with nothing opened
    pub const fn new() -> Self {
        Self {
            slot: const_mutex(None),
            state: AtomicU8::new(HandleState::Unopened as u8),
            opens: AtomicUsize::new(0),
        }
    }

    /// Return the shared handle, opening the store on first use
    pub fn acquire(&self, config: StoreConfig) -> Result<Arc<Store>> {
        self.acquire_inner(config, Reconfigure::Ignore, Store::open)
    }

    /// Return the shared handle only if it matches `config`
    pub fn acquire_exact(&self, config: StoreConfig) -> Result<Arc<Store>> {
        self.acquire_inner(config, Reconfigure::Reject, Store::open)
    }

    /// Like [`acquire`](Self::acquire) with a caller-supplied open routine
    ///
    /// `open` runs only if no handle has been published yet.
    pub fn acquire_with<F>(&self, config: StoreConfig, open: F) -> Result<Arc<Store>>
    where
        F: FnOnce(StoreConfig) -> Result<Store>,
    {
        self.acquire_inner(config, Reconfigure::Ignore, open)
    }

    fn acquire_inner<F>(
        &self,
        config: StoreConfig,
        reconfigure: Reconfigure,
        open: F,
    ) -> Result<Arc<Store>>
    where
        F: FnOnce(StoreConfig) -> Result<Store>,
    {
        let mut slot = self.slot.lock();

        if let Some(store) = slot.as_ref() {
            if !store.config().is_equivalent(&config) {
                match reconfigure {
                    Reconfigure::Ignore => {
                        tracing::warn!(
                            requested = %config,
                            active = %store.config(),
                            "Store already open, ignoring requested configuration"
                        );
                    }
                    Reconfigure::Reject => {
                        return Err(StashError::ConfigMismatch {
                            requested: config.to_string(),
                            active: store.config().to_string(),
                        });
                    }
                }
            }
            return Ok(Arc::clone(store));
        }

        self.set_state(HandleState::Opening);
        tracing::debug!(store = %config, "Opening store");

        // Left armed if `open` unwinds, so the state never sticks at Opening
        let mut opening = OpeningGuard {
            state: &self.state,
            armed: true,
        };
        let opened = open(config);
        opening.armed = false;

        match opened {
            Ok(store) => {
                let store = Arc::new(store);
                *slot = Some(Arc::clone(&store));
                self.opens.fetch_add(1, Ordering::SeqCst);
                self.set_state(HandleState::Opened);
                Ok(store)
            }
            Err(e) => {
                // Nothing published; the next caller tries again
                self.set_state(HandleState::FailedToOpen);
                tracing::warn!(error = %e, "Store open failed");
                Err(e)
            }
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// The published handle, if any, without opening
    pub fn current(&self) -> Option<Arc<Store>> {
        self.slot.lock().clone()
    }

    /// Current lifecycle state
    pub fn state(&self) -> HandleState {
        HandleState::from_u8(self.state.load(Ordering::SeqCst))
    }

    /// Number of successful engine opens
    pub fn open_count(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    fn set_state(&self, state: HandleState) {
        self.state.store(state as u8, Ordering::SeqCst);
    }
}

/// Marks the manager `FailedToOpen` if dropped while still armed
struct OpeningGuard<'a> {
    state: &'a AtomicU8,
    armed: bool,
}

impl Drop for OpeningGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.state
                .store(HandleState::FailedToOpen as u8, Ordering::SeqCst);
        }
    }
}

impl Default for HandleManager {
    fn default() -> Self {
        Self::new()
    }
}
