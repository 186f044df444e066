//! Tests for cache coherence

use std::fs;
use std::sync::Arc;

use flatkv::{Cache, MemoryCache, Store, Value};
use parking_lot::Mutex;
use tempfile::TempDir;

use crate::{setup_config, setup_temp_store};

#[test]
fn test_set_set_get_sees_latest() {
    let (_temp, store) = setup_temp_store();

    store.set("a", "1").unwrap();
    store.set("a", "2").unwrap();

    assert_eq!(store.get("a").unwrap(), Some(Value::from("2")));
}

#[test]
fn test_delete_invalidates_cache() {
    let (_temp, store) = setup_temp_store();

    store.set("a", "1").unwrap();
    assert_eq!(store.get("a").unwrap(), Some(Value::from("1")));

    store.delete("a").unwrap();
    assert_eq!(store.get("a").unwrap(), None);
}

#[test]
fn test_flush_clears_cache() {
    let (_temp, store) = setup_temp_store();

    store.set("a", "1").unwrap();
    store.get("a").unwrap();
    store.flush().unwrap();

    assert_eq!(store.get("a").unwrap(), None);
}

#[test]
fn test_cached_value_answers_reads() {
    let (_temp, store) = setup_temp_store();

    store.set("a", "1").unwrap();
    // The cache is not the source of truth, but it does answer reads
    fs::write(store.path(), "a=s:5:\"stale\";\n").unwrap();

    assert_eq!(store.get("a").unwrap(), Some(Value::from("1")));
}

#[test]
fn test_uncached_store_reads_file() {
    let temp_dir = TempDir::new().unwrap();
    let config = setup_config(&temp_dir).with_cache(false);
    let store = Store::open("test", &config).unwrap();

    store.set("a", "1").unwrap();
    fs::write(store.path(), "a=s:5:\"fresh\";\n").unwrap();

    assert_eq!(store.get("a").unwrap(), Some(Value::from("fresh")));
}

/// Cache that records every call, sharing its log with the test
struct RecordingCache {
    inner: MemoryCache,
    log: Arc<Mutex<Vec<String>>>,
}

impl Cache for RecordingCache {
    fn contains(&self, key: &str) -> bool {
        self.inner.contains(key)
    }

    fn get(&self, key: &str) -> Option<Value> {
        self.log.lock().push(format!("get {}", key));
        self.inner.get(key)
    }

    fn set(&mut self, key: &str, value: Value) {
        self.log.lock().push(format!("set {}", key));
        self.inner.set(key, value);
    }

    fn delete(&mut self, key: &str) {
        self.log.lock().push(format!("delete {}", key));
        self.inner.delete(key);
    }

    fn flush(&mut self) {
        self.log.lock().push("flush".to_string());
        self.inner.flush();
    }
}

#[test]
fn test_custom_cache_is_used() {
    let temp_dir = TempDir::new().unwrap();
    let log = Arc::new(Mutex::new(Vec::new()));
    let cache = RecordingCache {
        inner: MemoryCache::new(),
        log: Arc::clone(&log),
    };
    let store = Store::with_cache("test", &setup_config(&temp_dir), Box::new(cache)).unwrap();

    store.set("a", 1).unwrap();
    store.get("a").unwrap();
    store.delete("a").unwrap();
    store.flush().unwrap();

    assert_eq!(
        *log.lock(),
        vec![
            "get a",    // set: existence check misses
            "set a",    // set: appended
            "get a",    // get: hit
            "get a",    // delete: existence check hits
            "delete a", // delete: invalidated
            "flush",
        ]
    );
}
