//! Cache Module
//!
//! Optional read cache of decoded values, private to one store instance.
//! Never the source of truth: populated on read-through and write,
//! invalidated on delete and flush.

use std::collections::HashMap;

use crate::value::Value;

/// Pluggable key → value cache
pub trait Cache: Send {
    fn contains(&self, key: &str) -> bool;

    fn get(&self, key: &str) -> Option<Value>;

    fn set(&mut self, key: &str, value: Value);

    fn delete(&mut self, key: &str);

    /// Remove every entry
    fn flush(&mut self);
}

/// HashMap-backed cache
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: HashMap<String, Value>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Cache for MemoryCache {
    fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    fn get(&self, key: &str) -> Option<Value> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: Value) {
        self.entries.insert(key.to_string(), value);
    }

    fn delete(&mut self, key: &str) {
        self.entries.remove(key);
    }

    fn flush(&mut self) {
        self.entries.clear();
    }
}

/// Cache that stores nothing; used when caching is disabled
#[derive(Debug, Default, Clone, Copy)]
pub struct NullCache;

impl Cache for NullCache {
    fn contains(&self, _key: &str) -> bool {
        false
    }

    fn get(&self, _key: &str) -> Option<Value> {
        None
    }

    fn set(&mut self, _key: &str, _value: Value) {}

    fn delete(&mut self, _key: &str) {}

    fn flush(&mut self) {}
}
