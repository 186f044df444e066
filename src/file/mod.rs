//! File Access Layer
//!
//! Opens the store file for one of three intents and holds the matching
//! advisory lock until the handle is dropped or finished.
//!
//! ## Responsibilities
//! - Create the file (zero-length) on first access
//! - Refuse read-only files before opening them
//! - Shared lock for READ, exclusive lock for WRITE / APPEND, never waiting
//! - Transparent gzip streams when compression is enabled
//!
//! ## Intents
//! ```text
//! ┌─────────┬───────────┬──────────────────────────────────────┐
//! │ Intent  │ Lock      │ Behaviour                            │
//! ├─────────┼───────────┼──────────────────────────────────────┤
//! │ READ    │ shared    │ sequential lines, terminator removed │
//! │ WRITE   │ exclusive │ truncated once the lock is held      │
//! │ APPEND  │ exclusive │ writes land at the end               │
//! └─────────┴───────────┴──────────────────────────────────────┘
//! ```
//!
//! Compressed files are not locked: gzip streams are read and written
//! through a decoder/encoder and offer no inter-process exclusion.

mod reader;
mod writer;

use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use fs2::FileExt;

use crate::error::{FlatError, IoContext, Result};

pub use reader::LineReader;
pub use writer::LineWriter;

/// What a caller intends to do with the file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AccessMode {
    Read,
    Write,
    Append,
}

/// Write intents accepted by [`open_writer`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Truncate, then write from the start
    Truncate,
    /// Write at the end
    Append,
}

impl From<WriteMode> for AccessMode {
    fn from(mode: WriteMode) -> Self {
        match mode {
            WriteMode::Truncate => AccessMode::Write,
            WriteMode::Append => AccessMode::Append,
        }
    }
}

/// Create the file if absent and check it is a writable regular file
pub fn ensure_file(path: &Path) -> Result<()> {
    match fs::metadata(path) {
        Ok(metadata) => {
            if !metadata.is_file() {
                return Err(FlatError::io(
                    path,
                    io::Error::new(io::ErrorKind::InvalidInput, "not a regular file"),
                ));
            }
            if metadata.permissions().readonly() {
                return Err(FlatError::io(
                    path,
                    io::Error::new(io::ErrorKind::PermissionDenied, "file is read-only"),
                ));
            }
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(false)
                .open(path)
                .at(path)?;
            tracing::debug!(path = %path.display(), "created store file");
            Ok(())
        }
        Err(e) => Err(FlatError::io(path, e)),
    }
}

/// Open a file for sequential line reading under a shared lock
pub fn open_reader(path: &Path, compressed: bool) -> Result<LineReader> {
    ensure_file(path)?;
    let file = File::open(path).at(path)?;
    let lock = if compressed {
        None
    } else {
        Some(FileLock::acquire(&file, path, AccessMode::Read)?)
    };
    LineReader::new(path, file, compressed, lock)
}

/// Open a file for writing under an exclusive lock
pub fn open_writer(path: &Path, mode: WriteMode, compressed: bool) -> Result<LineWriter> {
    ensure_file(path)?;
    let mut options = OpenOptions::new();
    match mode {
        WriteMode::Truncate => options.write(true).truncate(false),
        WriteMode::Append => options.append(true),
    };
    let file = options.open(path).at(path)?;

    let lock = if compressed {
        None
    } else {
        Some(FileLock::acquire(&file, path, mode.into())?)
    };

    // Truncate only once nobody else can be reading
    if mode == WriteMode::Truncate {
        file.set_len(0).at(path)?;
    }

    Ok(LineWriter::new(path, file, compressed, lock))
}

/// Exclusively lock an existing file without opening it for writing.
///
/// Used to hold off readers while the file is replaced by a rename.
pub(crate) fn lock_exclusive(path: &Path) -> Result<FileLock> {
    let file = OpenOptions::new().read(true).write(true).open(path).at(path)?;
    FileLock::acquire(&file, path, AccessMode::Write)
}

/// Make a rename or creation in `path`'s directory durable
#[cfg(unix)]
pub(crate) fn sync_parent(path: &Path) -> Result<()> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    File::open(dir).at(dir)?.sync_all().at(dir)
}

/// Directory entries cannot be fsynced here; NTFS journals the rename
#[cfg(not(unix))]
pub(crate) fn sync_parent(_path: &Path) -> Result<()> {
    Ok(())
}

// =============================================================================
// Advisory Lock
// =============================================================================

/// Held advisory lock; released on drop
pub(crate) struct FileLock {
    file: File,
    path: PathBuf,
    released: bool,
}

impl FileLock {
    /// Try once to lock `file` for `mode`; a conflict fails immediately
    fn acquire(file: &File, path: &Path, mode: AccessMode) -> Result<Self> {
        let attempt = match mode {
            AccessMode::Read => FileExt::try_lock_shared(file),
            AccessMode::Write | AccessMode::Append => FileExt::try_lock_exclusive(file),
        };
        attempt.map_err(|e| FlatError::lock(path, e))?;

        tracing::trace!(path = %path.display(), ?mode, "lock acquired");

        Ok(Self {
            file: file.try_clone().at(path)?,
            path: path.to_path_buf(),
            released: false,
        })
    }

    /// Release explicitly, surfacing an unlock failure
    pub(crate) fn release(mut self) -> Result<()> {
        self.released = true;
        FileExt::unlock(&self.file).map_err(|e| FlatError::lock(&self.path, e))
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        if let Err(e) = FileExt::unlock(&self.file) {
            tracing::warn!(path = %self.path.display(), error = %e, "failed to release lock");
        }
    }
}
