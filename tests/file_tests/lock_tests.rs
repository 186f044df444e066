//! Tests for advisory locking

use std::fs::{File, OpenOptions};

use flatkv::{FlatError, Value};
use fs2::FileExt;

use crate::setup_store;

/// Hold an exclusive lock on `path` through a separate handle
fn lock_exclusive(path: &std::path::Path) -> File {
    let file = OpenOptions::new().read(true).write(true).open(path).unwrap();
    FileExt::try_lock_exclusive(&file).unwrap();
    file
}

fn lock_shared(path: &std::path::Path) -> File {
    let file = File::open(path).unwrap();
    FileExt::try_lock_shared(&file).unwrap();
    file
}

#[test]
fn test_read_fails_fast_under_exclusive_lock() {
    let (_temp, store) = setup_store(false);
    store.set("a", "1").unwrap();

    let holder = lock_exclusive(store.path());

    assert!(matches!(store.get("a"), Err(FlatError::Lock { .. })));
    assert!(matches!(store.keys(), Err(FlatError::Lock { .. })));

    FileExt::unlock(&holder).unwrap();
    assert_eq!(store.get("a").unwrap(), Some(Value::from("1")));
}

#[test]
fn test_write_fails_fast_under_shared_lock() {
    let (_temp, store) = setup_store(false);
    store.set("a", "1").unwrap();
    let before = std::fs::read(store.path()).unwrap();

    let holder = lock_shared(store.path());

    // Reads may share the lock
    assert_eq!(store.get("a").unwrap(), Some(Value::from("1")));

    assert!(matches!(store.set("b", "2"), Err(FlatError::Lock { .. })));
    assert!(matches!(store.flush(), Err(FlatError::Lock { .. })));

    // A refused truncate must not have emptied the file
    assert_eq!(std::fs::read(store.path()).unwrap(), before);

    drop(holder);
    store.set("b", "2").unwrap();
    assert_eq!(store.keys().unwrap(), vec!["a", "b"]);
}

#[test]
fn test_memory_rewrite_fails_fast_under_shared_lock() {
    let (_temp, store) = setup_store(false);
    store.set("a", "1").unwrap();
    let before = std::fs::read(store.path()).unwrap();

    let holder = lock_shared(store.path());

    assert!(matches!(store.replace("a", "2"), Err(FlatError::Lock { .. })));
    assert_eq!(std::fs::read(store.path()).unwrap(), before);

    drop(holder);
    assert!(store.replace("a", "2").unwrap());
    assert_eq!(store.get("a").unwrap(), Some(Value::from("2")));
}

#[test]
fn test_disk_rewrite_fails_fast_under_shared_lock() {
    let temp_dir = tempfile::TempDir::new().unwrap();
    let config = flatkv::Config::builder()
        .directory(temp_dir.path())
        .cache(false)
        .swap_memory_limit(0)
        .build()
        .unwrap();
    let store = flatkv::Store::open("test", &config).unwrap();
    store.set("a", "1").unwrap();
    let before = std::fs::read(store.path()).unwrap();

    let holder = lock_shared(store.path());

    assert!(matches!(store.replace("a", "2"), Err(FlatError::Lock { .. })));
    assert!(matches!(store.delete("a"), Err(FlatError::Lock { .. })));
    assert_eq!(std::fs::read(store.path()).unwrap(), before);
    assert!(!store.tmp_path().exists());

    // The reader's lock still guards the live file, so memory rewrites are refused too
    let memory_store =
        flatkv::Store::open("test", &config.with_swap_memory_limit(u64::MAX)).unwrap();
    assert!(matches!(memory_store.replace("a", "3"), Err(FlatError::Lock { .. })));

    drop(holder);
    assert!(store.replace("a", "2").unwrap());
    assert_eq!(store.get("a").unwrap(), Some(Value::from("2")));
    assert!(!store.tmp_path().exists());
}

#[test]
fn test_locks_released_after_each_operation() {
    let (_temp, store) = setup_store(false);

    store.set("a", "1").unwrap();
    store.get("a").unwrap();
    store.replace("a", "2").unwrap();
    store.delete("a").unwrap();
    store.flush().unwrap();

    // Nothing is still held by the store
    let holder = lock_exclusive(store.path());
    FileExt::unlock(&holder).unwrap();
}

#[test]
fn test_compressed_store_is_not_locked() {
    let (_temp, store) = setup_store(true);
    store.set("a", "1").unwrap();

    let _holder = lock_exclusive(store.path());

    assert_eq!(store.get("a").unwrap(), Some(Value::from("1")));
}
