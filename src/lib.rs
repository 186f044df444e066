//! # FlatKV
//!
//! A single-file key-value store with:
//! - One `key=value` record per line, human-readable on disk
//! - Append for new keys, full rewrite for updates and deletes
//! - Atomic temp-file swap or in-memory rewrite, chosen by file size
//! - Advisory shared/exclusive file locks, fail-fast
//! - Optional gzip compression and in-memory read cache
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 Registry (optional, name → Store)            │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                        Store                                 │
//! │        get / set / replace / delete / flush / keys           │
//! └──────┬──────────────────────┬────────────────────┬──────────┘
//!        │                      │                    │
//!        ▼                      ▼                    ▼
//!   ┌──────────┐        ┌──────────────┐     ┌─────────────┐
//!   │  Cache   │        │ Record codec │     │  Rewrite    │
//!   │ (Mutex)  │        │ + Formatter  │     │ (Sink swap) │
//!   └──────────┘        └──────────────┘     └──────┬──────┘
//!                                                   │
//!                                           ┌───────▼───────┐
//!                                           │  File access  │
//!                                           │ (locks, gzip) │
//!                                           └───────────────┘
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use flatkv::{Config, Store};
//!
//! let config = Config::builder().directory("/var/lib/app").build()?;
//! let store = Store::open("users", &config)?;
//!
//! store.set("alice", "admin")?;
//! assert_eq!(store.get("alice")?, Some("admin".into()));
//! # Ok::<(), flatkv::FlatError>(())
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod value;
pub mod validate;
pub mod record;
pub mod format;
pub mod file;
pub mod cache;
pub mod store;
pub mod registry;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{FlatError, Result};
pub use config::{Config, ConfigBuilder};
pub use value::Value;
pub use format::{Formatter, JsonFormatter, SerializeFormatter};
pub use cache::{Cache, MemoryCache, NullCache};
pub use store::{Store, SwapStrategy};
pub use registry::Registry;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of FlatKV
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
