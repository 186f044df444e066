//! Store Module
//!
//! The store engine: one named flat file of `key=value` lines.
//!
//! ## Operations
//! - `get`: cache, then a linear scan; the first matching line wins
//! - `set`: append when the key is new, otherwise rewrite
//! - `replace` / `delete`: rewrite every matching line (see [`rewrite`])
//! - `flush`: truncate the file, clear the cache
//! - `keys` / `get_all`: full scans in file order
//!
//! ## Concurrency
//! Every operation opens, locks, uses, unlocks, and closes the file. Within
//! a process, operations on one `Store` are serialized by the cache mutex,
//! so an `Arc<Store>` can be shared between threads. Across processes the
//! advisory file lock is the only coordination, and compressed stores have
//! none.

mod rewrite;

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use crate::cache::{Cache, MemoryCache, NullCache};
use crate::config::Config;
use crate::error::{IoContext, Result};
use crate::file::{self, WriteMode};
use crate::record;
use crate::validate::{validate_key, validate_name, validate_value};
use crate::value::Value;

use rewrite::{MemorySink, Sink, TempFileSink};

pub use rewrite::SwapStrategy;

/// What a rewrite does to the matching lines
#[derive(Clone, Copy)]
enum Replacement<'a> {
    Value(&'a Value),
    Delete,
}

/// A key-value store backed by a single flat file
pub struct Store {
    /// Validated store name
    name: String,

    /// `{dir}/{name}{ext}`
    path: PathBuf,

    /// `{dir}/{name}_tmp{ext}`, only present during disk-swap rewrites
    tmp_path: PathBuf,

    config: Config,

    /// Read cache; its lock also serializes operations on this instance
    cache: Mutex<Box<dyn Cache>>,
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("name", &self.name)
            .field("path", &self.path)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Store {
    /// Open (creating if needed) the store `name` under `config`
    ///
    /// Uses a [`MemoryCache`] when caching is enabled, else a [`NullCache`].
    pub fn open(name: &str, config: &Config) -> Result<Self> {
        let cache: Box<dyn Cache> = if config.use_cache() {
            Box::new(MemoryCache::new())
        } else {
            Box::new(NullCache)
        };
        Self::with_cache(name, config, cache)
    }

    /// Open with a caller-supplied cache
    pub fn with_cache(name: &str, config: &Config, cache: Box<dyn Cache>) -> Result<Self> {
        validate_name(name)?;

        let ext = config.file_extension();
        let path = config.directory().join(format!("{}{}", name, ext));
        let tmp_path = config.directory().join(format!("{}_tmp{}", name, ext));

        file::ensure_file(&path)?;

        tracing::debug!(
            store = name,
            path = %path.display(),
            formatter = config.formatter().name(),
            compressed = config.use_compression(),
            "opened store"
        );

        Ok(Self {
            name: name.to_string(),
            path,
            tmp_path,
            config: config.clone(),
            cache: Mutex::new(cache),
        })
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Get the value for `key`; `Ok(None)` means not found
    pub fn get(&self, key: &str) -> Result<Option<Value>> {
        validate_key(key)?;
        let mut cache = self.cache.lock();
        self.lookup(&mut **cache, key)
    }

    /// Every key, in file order
    pub fn keys(&self) -> Result<Vec<String>> {
        let _guard = self.cache.lock();
        let mut keys = Vec::new();

        for line in file::open_reader(&self.path, self.compressed())? {
            let line = line?;
            match record::key_of(&line) {
                Some(key) => keys.push(key.to_string()),
                None => self.warn_malformed(),
            }
        }

        Ok(keys)
    }

    /// Every record, decoded. A duplicate key keeps its last value.
    pub fn get_all(&self) -> Result<BTreeMap<String, Value>> {
        let _guard = self.cache.lock();
        let formatter = self.config.formatter();
        let mut all = BTreeMap::new();

        for line in file::open_reader(&self.path, self.compressed())? {
            let line = line?;
            match record::split(&line) {
                Some((key, data)) => {
                    all.insert(key.to_string(), formatter.decode(data)?);
                }
                None => self.warn_malformed(),
            }
        }

        Ok(all)
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Store `value` under `key`, replacing any existing value
    pub fn set(&self, key: &str, value: impl Into<Value>) -> Result<()> {
        let value = value.into();
        validate_key(key)?;
        validate_value(&value)?;

        let mut cache = self.cache.lock();

        if self.lookup(&mut **cache, key)?.is_some() {
            return self.rewrite(&mut **cache, key, Replacement::Value(&value));
        }

        let encoded = self.config.formatter().encode(&value)?;
        let mut writer = file::open_writer(&self.path, WriteMode::Append, self.compressed())?;
        writer.write_line(&record::join(key, &encoded))?;
        writer.finish()?;

        tracing::debug!(store = %self.name, key, "appended record");
        cache.set(key, value);
        Ok(())
    }

    /// Replace the value of an existing key.
    ///
    /// Returns `false` and leaves the file untouched if the key is absent.
    pub fn replace(&self, key: &str, value: impl Into<Value>) -> Result<bool> {
        let value = value.into();
        validate_key(key)?;
        validate_value(&value)?;

        let mut cache = self.cache.lock();
        if self.lookup(&mut **cache, key)?.is_none() {
            return Ok(false);
        }

        self.rewrite(&mut **cache, key, Replacement::Value(&value))?;
        Ok(true)
    }

    /// Remove `key`. Returns `false` if it did not exist.
    pub fn delete(&self, key: &str) -> Result<bool> {
        validate_key(key)?;

        let mut cache = self.cache.lock();
        if self.lookup(&mut **cache, key)?.is_none() {
            return Ok(false);
        }

        self.rewrite(&mut **cache, key, Replacement::Delete)?;
        Ok(true)
    }

    /// Remove every record
    pub fn flush(&self) -> Result<()> {
        let mut cache = self.cache.lock();

        file::open_writer(&self.path, WriteMode::Truncate, self.compressed())?.finish()?;
        cache.flush();

        tracing::debug!(store = %self.name, "flushed store");
        Ok(())
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path used transiently by disk-swap rewrites
    pub fn tmp_path(&self) -> &Path {
        &self.tmp_path
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    fn compressed(&self) -> bool {
        self.config.use_compression()
    }

    /// Cache first, then the first matching line in the file
    fn lookup(&self, cache: &mut dyn Cache, key: &str) -> Result<Option<Value>> {
        if let Some(value) = cache.get(key) {
            return Ok(Some(value));
        }

        let found = self.scan(key)?;
        if let Some(value) = &found {
            cache.set(key, value.clone());
        }
        Ok(found)
    }

    fn scan(&self, key: &str) -> Result<Option<Value>> {
        for line in file::open_reader(&self.path, self.compressed())? {
            let line = line?;
            match record::split(&line) {
                Some((line_key, data)) if line_key == key => {
                    return self.config.formatter().decode(data).map(Some);
                }
                Some(_) => {}
                None => self.warn_malformed(),
            }
        }
        Ok(None)
    }

    fn rewrite(&self, cache: &mut dyn Cache, key: &str, replacement: Replacement<'_>) -> Result<()> {
        let new_line = match replacement {
            Replacement::Value(value) => {
                Some(record::join(key, &self.config.formatter().encode(value)?))
            }
            Replacement::Delete => None,
        };

        let size = fs::metadata(&self.path).at(&self.path)?.len();
        let strategy = SwapStrategy::choose(size, self.config.swap_memory_limit());
        let sink: Box<dyn Sink> = match strategy {
            SwapStrategy::Disk => Box::new(TempFileSink::create(&self.tmp_path, self.compressed())?),
            SwapStrategy::Memory => Box::new(MemorySink::with_capacity(size as usize)),
        };

        tracing::trace!(store = %self.name, key, size, ?strategy, "rewriting store");

        let matched = rewrite::rewrite(
            &self.path,
            self.compressed(),
            key,
            new_line.as_deref(),
            sink,
        )?;

        tracing::debug!(
            store = %self.name,
            key,
            matched,
            deleted = new_line.is_none(),
            "rewrote store"
        );

        match replacement {
            Replacement::Value(value) => cache.set(key, value.clone()),
            Replacement::Delete => cache.delete(key),
        }
        Ok(())
    }

    fn warn_malformed(&self) {
        tracing::warn!(store = %self.name, path = %self.path.display(), "skipping line without separator");
    }
}
