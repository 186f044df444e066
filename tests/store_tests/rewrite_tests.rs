//! Tests for the rewrite path: disk swap vs in-memory buffer

use std::fs;

use flatkv::{Store, Value};
use tempfile::TempDir;

use crate::setup_config;

/// Open a store that rewrites with the given swap memory limit
fn setup_store_with_limit(limit: u64) -> (TempDir, Store) {
    let temp_dir = TempDir::new().unwrap();
    let config = setup_config(&temp_dir).with_swap_memory_limit(limit);
    let store = Store::open("test", &config).unwrap();
    (temp_dir, store)
}

/// Run the same mutation sequence and return the final file bytes
fn run_workload(store: &Store) -> Vec<u8> {
    for i in 0..20 {
        store.set(&format!("key{}", i), format!("value{}", i)).unwrap();
    }
    store.set("key3", vec![1, 2, 3]).unwrap();
    store.replace("key7", "line\nbreak").unwrap();
    store.delete("key11").unwrap();
    store.delete("key0").unwrap();
    store.set("key19", 19.5).unwrap();
    fs::read(store.path()).unwrap()
}

#[test]
fn test_disk_and_memory_produce_identical_files() {
    let (_disk_dir, disk_store) = setup_store_with_limit(0);
    let (_mem_dir, mem_store) = setup_store_with_limit(u64::MAX);

    let disk_bytes = run_workload(&disk_store);
    let mem_bytes = run_workload(&mem_store);

    assert!(!disk_bytes.is_empty());
    assert_eq!(disk_bytes, mem_bytes);
}

#[test]
fn test_disk_swap_removes_temp_file() {
    let (_temp, store) = setup_store_with_limit(0);

    store.set("a", "1").unwrap();
    store.set("b", "2").unwrap();
    store.replace("a", "3").unwrap();
    assert!(!store.tmp_path().exists());

    store.delete("b").unwrap();
    assert!(!store.tmp_path().exists());

    assert_eq!(store.get("a").unwrap(), Some(Value::from("3")));
    assert_eq!(store.keys().unwrap(), vec!["a"]);
}

#[test]
fn test_stale_temp_file_is_overwritten() {
    let (_temp, store) = setup_store_with_limit(0);
    fs::write(store.tmp_path(), "leftover=i:1;\n").unwrap();

    store.set("a", 1).unwrap();
    store.set("a", 2).unwrap();

    assert_eq!(fs::read_to_string(store.path()).unwrap(), "a=i:2;\n");
    assert!(!store.tmp_path().exists());
}

#[test]
fn test_memory_rewrite_never_touches_temp_path() {
    let (_temp, store) = setup_store_with_limit(u64::MAX);

    store.set("a", 1).unwrap();
    store.set("a", 2).unwrap();
    store.delete("a").unwrap();

    assert!(!store.tmp_path().exists());
    assert_eq!(fs::metadata(store.path()).unwrap().len(), 0);
}

#[test]
fn test_strategy_switches_with_file_size() {
    // Small limit: the first rewrite fits in memory, later ones spill to disk
    let (_temp, store) = setup_store_with_limit(16);

    store.set("a", 1).unwrap();
    store.set("a", 2).unwrap();
    for i in 0..10 {
        store.set(&format!("k{}", i), i).unwrap();
    }
    store.set("a", 3).unwrap();

    assert_eq!(store.get("a").unwrap(), Some(Value::from(3)));
    assert_eq!(store.keys().unwrap().len(), 11);
    assert!(!store.tmp_path().exists());
}

#[test]
fn test_rewrite_keeps_record_order() {
    let (_temp, store) = setup_store_with_limit(0);

    store.set("first", 1).unwrap();
    store.set("middle", 2).unwrap();
    store.set("last", 3).unwrap();
    store.replace("middle", 20).unwrap();

    assert_eq!(
        fs::read_to_string(store.path()).unwrap(),
        "first=i:1;\nmiddle=i:20;\nlast=i:3;\n"
    );
}

#[test]
fn test_rewrite_normalizes_untouched_lines() {
    for limit in [0, u64::MAX] {
        let (_temp, store) = setup_store_with_limit(limit);
        fs::write(store.path(), "a=i:1;\r\n\nb=i:2;\r\n\r\nc=i:3;").unwrap();

        store.replace("b", 20).unwrap();

        // CRLF becomes LF, empty lines go, and the last line gains a terminator
        assert_eq!(
            fs::read_to_string(store.path()).unwrap(),
            "a=i:1;\nb=i:20;\nc=i:3;\n"
        );
    }
}
