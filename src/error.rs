//! Error types for FlatKV
//!
//! Provides a unified error type for all operations. Every variant carries
//! enough context (store name, key, path) to diagnose without inspecting
//! internals.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Result type alias using FlatError
pub type Result<T> = std::result::Result<T, FlatError>;

/// Unified error type for FlatKV operations
#[derive(Debug, Error)]
pub enum FlatError {
    // -------------------------------------------------------------------------
    // Validation Errors
    // -------------------------------------------------------------------------
    #[error("Invalid store name {name:?}: {reason}")]
    InvalidName { name: String, reason: String },

    #[error("Invalid key {key:?}: {reason}")]
    InvalidKey { key: String, reason: String },

    #[error("Invalid value: {0}")]
    InvalidValue(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),

    // -------------------------------------------------------------------------
    // File Errors
    // -------------------------------------------------------------------------
    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Could not lock {}: {source}", path.display())]
    Lock {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    // -------------------------------------------------------------------------
    // Formatter Errors
    // -------------------------------------------------------------------------
    #[error("Encoding error ({formatter}): {message}")]
    Encoding {
        formatter: &'static str,
        message: String,
    },
}

impl FlatError {
    pub(crate) fn io(path: &Path, source: io::Error) -> Self {
        FlatError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn lock(path: &Path, source: io::Error) -> Self {
        FlatError::Lock {
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn invalid_key(key: &str, reason: impl Into<String>) -> Self {
        FlatError::InvalidKey {
            key: key.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn encoding(formatter: &'static str, message: impl Into<String>) -> Self {
        FlatError::Encoding {
            formatter,
            message: message.into(),
        }
    }
}

/// Attach a path to a bare `io::Result`
pub(crate) trait IoContext<T> {
    fn at(self, path: &Path) -> Result<T>;
}

impl<T> IoContext<T> for io::Result<T> {
    fn at(self, path: &Path) -> Result<T> {
        self.map_err(|e| FlatError::io(path, e))
    }
}
