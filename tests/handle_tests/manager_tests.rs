//! Tests for HandleManager
//!
//! These tests verify:
//! - Exactly one open under many concurrent acquires
//! - All callers share the same handle
//! - Open failures are surfaced and retried, never cached
//! - First-caller-wins vs. strict reconfiguration
//! - State transitions

use std::fs;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

use stashkv::{HandleManager, HandleState, StashError, Store, StoreConfig};
use tempfile::TempDir;

// =============================================================================
// Singleton Tests
// =============================================================================

#[test]
fn test_fresh_manager_is_unopened() {
    let manager = HandleManager::new();

    assert_eq!(manager.state(), HandleState::Unopened);
    assert!(manager.current().is_none());
    assert_eq!(manager.open_count(), 0);
}

#[test]
fn test_acquire_opens_once() {
    let manager = HandleManager::new();

    let a = manager.acquire(StoreConfig::in_memory()).unwrap();
    let b = manager.acquire(StoreConfig::in_memory()).unwrap();

    assert!(Arc::ptr_eq(&a, &b));
    assert_eq!(manager.open_count(), 1);
    assert_eq!(manager.state(), HandleState::Opened);
    assert!(Arc::ptr_eq(&a, &manager.current().unwrap()));
}

#[test]
fn test_concurrent_acquire_opens_exactly_once() {
    const CALLERS: usize = 64;

    let manager = Arc::new(HandleManager::new());
    let opens = Arc::new(AtomicUsize::new(0));
    let barrier = Arc::new(Barrier::new(CALLERS));

    let handles: Vec<_> = (0..CALLERS)
        .map(|i| {
            let manager = Arc::clone(&manager);
            let opens = Arc::clone(&opens);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                // Mixed configurations; only the winner's is applied
                let config = if i % 2 == 0 {
                    StoreConfig::in_memory()
                } else {
                    StoreConfig::new(format!("/nonexistent/{}", i), true)
                };
                barrier.wait();
                manager
                    .acquire_with(config, |config| {
                        opens.fetch_add(1, Ordering::SeqCst);
                        Store::open(config)
                    })
                    .unwrap()
            })
        })
        .collect();

    let stores: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert_eq!(opens.load(Ordering::SeqCst), 1);
    assert_eq!(manager.open_count(), 1);
    for store in &stores[1..] {
        assert!(Arc::ptr_eq(&stores[0], store));
    }
}

#[test]
fn test_concurrent_callers_see_same_data() {
    let manager = Arc::new(HandleManager::new());

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let manager = Arc::clone(&manager);
            thread::spawn(move || {
                let store = manager.acquire(StoreConfig::in_memory()).unwrap();
                store
                    .set(format!("key{}", i).as_bytes(), format!("value{}", i).as_bytes())
                    .unwrap();
            })
        })
        .collect();

    for h in handles {
        h.join().unwrap();
    }

    let store = manager.acquire(StoreConfig::in_memory()).unwrap();
    assert_eq!(store.view_prefix(b"key").unwrap().len(), 8);
}

// =============================================================================
// Failure Tests
// =============================================================================

#[test]
fn test_open_failure_is_surfaced() {
    let temp = TempDir::new().unwrap();
    let blocker = temp.path().join("blocker");
    fs::write(&blocker, b"a file, not a directory").unwrap();

    let manager = HandleManager::new();
    let result = manager.acquire(StoreConfig::persistent(blocker.join("db")));

    assert!(matches!(result, Err(StashError::Open { .. })));
    assert_eq!(manager.state(), HandleState::FailedToOpen);
    assert!(manager.current().is_none());
    assert_eq!(manager.open_count(), 0);
}

#[test]
fn test_failed_open_is_retried() {
    let temp = TempDir::new().unwrap();
    let blocker = temp.path().join("blocker");
    fs::write(&blocker, b"x").unwrap();

    let manager = HandleManager::new();
    assert!(manager
        .acquire(StoreConfig::persistent(blocker.join("db")))
        .is_err());

    // The failed configuration is not remembered; the next caller's applies
    let good = temp.path().join("good");
    let store = manager.acquire(StoreConfig::persistent(&good)).unwrap();

    assert_eq!(manager.state(), HandleState::Opened);
    assert_eq!(store.config().resolved_location(), good.as_path());
    assert!(good.join("data.redb").exists());
}

#[test]
fn test_transient_failure_then_success() {
    let manager = HandleManager::new();
    let attempts = AtomicUsize::new(0);

    let open = |config: StoreConfig| {
        if attempts.fetch_add(1, Ordering::SeqCst) == 0 {
            Err(StashError::Open {
                location: config.to_string(),
                reason: "lock held".to_string(),
            })
        } else {
            Store::open(config)
        }
    };

    assert!(manager.acquire_with(StoreConfig::in_memory(), open).is_err());
    assert_eq!(manager.state(), HandleState::FailedToOpen);

    let store = manager.acquire_with(StoreConfig::in_memory(), open).unwrap();
    assert_eq!(manager.state(), HandleState::Opened);
    assert_eq!(attempts.load(Ordering::SeqCst), 2);

    // Once opened, the open routine is never called again
    let again = manager.acquire_with(StoreConfig::in_memory(), open).unwrap();
    assert!(Arc::ptr_eq(&store, &again));
    assert_eq!(attempts.load(Ordering::SeqCst), 2);
}

#[test]
fn test_panicking_open_leaves_failed_state() {
    let manager = HandleManager::new();

    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        manager.acquire_with(StoreConfig::in_memory(), |_| panic!("open blew up"))
    }));

    assert!(result.is_err());
    assert_eq!(manager.state(), HandleState::FailedToOpen);
    assert!(manager.current().is_none());

    // The slot is not poisoned; the next caller opens normally
    manager.acquire(StoreConfig::in_memory()).unwrap();
    assert_eq!(manager.state(), HandleState::Opened);
    assert_eq!(manager.open_count(), 1);
}

#[test]
fn test_same_path_cannot_be_opened_twice() {
    let temp = TempDir::new().unwrap();
    let config = StoreConfig::persistent(temp.path());

    let _first = Store::open(config.clone()).unwrap();
    let second = Store::open(config);

    assert!(matches!(second, Err(StashError::Open { .. })));
}

#[test]
fn test_separate_managers_on_one_path_conflict() {
    let temp = TempDir::new().unwrap();
    let config = StoreConfig::persistent(temp.path());

    let a = HandleManager::new();
    let b = HandleManager::new();

    let _store = a.acquire(config.clone()).unwrap();
    assert!(b.acquire(config).is_err());
    assert_eq!(b.state(), HandleState::FailedToOpen);
}

// =============================================================================
// Reconfiguration Tests
// =============================================================================

#[test]
fn test_first_caller_configuration_wins() {
    let temp = TempDir::new().unwrap();
    let manager = HandleManager::new();

    let first = manager.acquire(StoreConfig::in_memory()).unwrap();
    let second = manager
        .acquire(StoreConfig::persistent(temp.path()))
        .unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert!(second.config().in_memory);
    assert!(!temp.path().join("data.redb").exists());
}

#[test]
fn test_acquire_exact_rejects_mismatch() {
    let temp = TempDir::new().unwrap();
    let manager = HandleManager::new();

    manager.acquire(StoreConfig::in_memory()).unwrap();

    let result = manager.acquire_exact(StoreConfig::persistent(temp.path()));
    assert!(matches!(result, Err(StashError::ConfigMismatch { .. })));

    // Still opened, and an equivalent request is fine
    assert_eq!(manager.state(), HandleState::Opened);
    assert!(manager.acquire_exact(StoreConfig::in_memory()).is_ok());
}

#[test]
fn test_acquire_exact_accepts_equivalent_persistent_config() {
    let temp = TempDir::new().unwrap();
    let manager = HandleManager::new();

    manager.acquire(StoreConfig::persistent(temp.path())).unwrap();

    let tuned = StoreConfig::builder()
        .location(temp.path())
        .cache_size(4 * 1024 * 1024)
        .build();
    assert!(manager.acquire_exact(tuned).is_ok());
    assert_eq!(manager.open_count(), 1);
}
