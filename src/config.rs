//! Configuration for FlatKV
//!
//! Immutable configuration with sensible defaults. Built once through
//! [`ConfigBuilder`], validated eagerly, then handed to every [`Store`]
//! by reference. The `with_*` methods return a modified copy.
//!
//! [`Store`]: crate::store::Store

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::{FlatError, Result};
use crate::format::{Formatter, SerializeFormatter};

/// Suffix appended to the extension when compression is enabled
pub const COMPRESSED_SUFFIX: &str = ".gz";

/// Default store file extension
pub const DEFAULT_EXTENSION: &str = ".dat";

/// Default swap memory limit: 2 MiB
pub const DEFAULT_SWAP_MEMORY_LIMIT: u64 = 2 * 1024 * 1024;

/// Main configuration for FlatKV stores
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // File Layout
    // -------------------------------------------------------------------------
    /// Directory holding the store files
    ///   {directory}/
    ///     ├── {name}{extension}        (store file)
    ///     └── {name}_tmp{extension}    (transient, during disk-swap rewrites)
    directory: PathBuf,

    /// Extension, always starting with '.'
    extension: String,

    /// Transparent gzip compression of the whole file
    use_compression: bool,

    // -------------------------------------------------------------------------
    // Engine Behaviour
    // -------------------------------------------------------------------------
    /// Keep decoded values in an in-memory read cache
    use_cache: bool,

    /// Rewrites of files larger than this stream through a temp file.
    /// 0 means always use the temp file.
    swap_memory_limit: u64,

    /// Encode/decode strategy for values
    formatter: Arc<dyn Formatter>,
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Directory holding the store files
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Extension as configured (without the compression suffix)
    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Effective extension, including `.gz` when compression is on
    pub fn file_extension(&self) -> String {
        if self.use_compression {
            format!("{}{}", self.extension, COMPRESSED_SUFFIX)
        } else {
            self.extension.clone()
        }
    }

    pub fn use_compression(&self) -> bool {
        self.use_compression
    }

    pub fn use_cache(&self) -> bool {
        self.use_cache
    }

    pub fn swap_memory_limit(&self) -> u64 {
        self.swap_memory_limit
    }

    pub fn formatter(&self) -> &Arc<dyn Formatter> {
        &self.formatter
    }

    // =========================================================================
    // Non-destructive updates
    // =========================================================================

    /// Copy with a different extension
    pub fn with_extension(&self, extension: &str) -> Result<Self> {
        let mut config = self.clone();
        config.extension = normalize_extension(extension)?;
        Ok(config)
    }

    /// Copy with compression switched on or off
    pub fn with_compression(&self, enabled: bool) -> Self {
        Self {
            use_compression: enabled,
            ..self.clone()
        }
    }

    /// Copy with the read cache switched on or off
    pub fn with_cache(&self, enabled: bool) -> Self {
        Self {
            use_cache: enabled,
            ..self.clone()
        }
    }

    /// Copy with a different swap memory limit
    pub fn with_swap_memory_limit(&self, bytes: u64) -> Self {
        Self {
            swap_memory_limit: bytes,
            ..self.clone()
        }
    }

    /// Copy with a different formatter
    pub fn with_formatter(&self, formatter: Arc<dyn Formatter>) -> Self {
        Self {
            formatter,
            ..self.clone()
        }
    }
}

/// Builder for Config
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    directory: PathBuf,
    extension: String,
    use_compression: bool,
    use_cache: bool,
    swap_memory_limit: u64,
    formatter: Option<Arc<dyn Formatter>>,
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("."),
            extension: DEFAULT_EXTENSION.to_string(),
            use_compression: false,
            use_cache: true,
            swap_memory_limit: DEFAULT_SWAP_MEMORY_LIMIT,
            formatter: None,
        }
    }
}

impl ConfigBuilder {
    /// Set the directory where store files live
    pub fn directory(mut self, path: impl Into<PathBuf>) -> Self {
        self.directory = path.into();
        self
    }

    /// Set the file extension ("dat" and ".dat" are equivalent)
    pub fn extension(mut self, ext: impl Into<String>) -> Self {
        self.extension = ext.into();
        self
    }

    /// Enable gzip compression of the store file
    pub fn compression(mut self, enabled: bool) -> Self {
        self.use_compression = enabled;
        self
    }

    /// Enable the in-memory read cache
    pub fn cache(mut self, enabled: bool) -> Self {
        self.use_cache = enabled;
        self
    }

    /// Set the swap memory limit (in bytes)
    pub fn swap_memory_limit(mut self, bytes: u64) -> Self {
        self.swap_memory_limit = bytes;
        self
    }

    /// Set the value formatter
    pub fn formatter(mut self, formatter: Arc<dyn Formatter>) -> Self {
        self.formatter = Some(formatter);
        self
    }

    /// Validate and build the config
    ///
    /// Fails with `FlatError::Config` if the directory is missing, is not
    /// a directory, or is read-only, or if the extension is empty.
    pub fn build(self) -> Result<Config> {
        validate_directory(&self.directory)?;
        let extension = normalize_extension(&self.extension)?;

        Ok(Config {
            directory: self.directory,
            extension,
            use_compression: self.use_compression,
            use_cache: self.use_cache,
            swap_memory_limit: self.swap_memory_limit,
            formatter: self
                .formatter
                .unwrap_or_else(|| Arc::new(SerializeFormatter)),
        })
    }
}

// =============================================================================
// Private Helpers
// =============================================================================

fn validate_directory(dir: &Path) -> Result<()> {
    let metadata = fs::metadata(dir).map_err(|e| {
        FlatError::Config(format!("Directory does not exist: {} ({})", dir.display(), e))
    })?;

    if !metadata.is_dir() {
        return Err(FlatError::Config(format!(
            "Not a directory: {}",
            dir.display()
        )));
    }

    if metadata.permissions().readonly() {
        return Err(FlatError::Config(format!(
            "Directory is not writable: {}",
            dir.display()
        )));
    }

    Ok(())
}

fn normalize_extension(ext: &str) -> Result<String> {
    let trimmed = ext.trim_start_matches('.');
    if trimmed.is_empty() {
        return Err(FlatError::Config("Extension must not be empty".to_string()));
    }
    if trimmed.contains(['/', '\\']) {
        return Err(FlatError::Config(format!(
            "Extension must not contain path separators: {:?}",
            ext
        )));
    }
    Ok(format!(".{}", trimmed))
}
