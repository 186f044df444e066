//! Rewrite Engine
//!
//! Replaces or removes every line for one key by streaming the store file
//! through a [`Sink`], then committing the sink over the original.
//!
//! ## Sinks
//! - [`TempFileSink`]: lines go to `{name}_tmp{ext}`, which is synced and
//!   renamed over the store file under the store file's exclusive lock, then
//!   the directory is synced. A reader opening the path sees either the old
//!   or the new file, never a partial one.
//! - [`MemorySink`]: lines accumulate in a buffer, then the store file is
//!   truncated and rewritten in one go. If that final write fails the file
//!   may be left truncated.
//!
//! Both sinks receive exactly the same bytes, so the committed file is
//! identical whichever one is used.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::{IoContext, Result};
use crate::file::{self, LineWriter, WriteMode};
use crate::record;

/// Destination of a rewrite
pub(crate) trait Sink {
    fn write_str(&mut self, s: &str) -> Result<()>;

    /// Make the written content the new store file
    fn commit(self: Box<Self>, target: &Path, compressed: bool) -> Result<()>;

    /// Discard everything written so far
    fn abort(self: Box<Self>);
}

/// Which sink a rewrite uses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapStrategy {
    /// Stream through a temporary file and rename it into place
    Disk,
    /// Buffer in memory and overwrite the store file
    Memory,
}

impl SwapStrategy {
    /// Disk when the limit is 0 or the file is larger than the limit
    pub fn choose(file_size: u64, swap_memory_limit: u64) -> Self {
        if swap_memory_limit == 0 || file_size > swap_memory_limit {
            SwapStrategy::Disk
        } else {
            SwapStrategy::Memory
        }
    }
}

// =============================================================================
// Temp File Sink
// =============================================================================

pub(crate) struct TempFileSink {
    path: PathBuf,
    writer: LineWriter,
}

impl TempFileSink {
    /// Create (or truncate a stale) temp file
    pub(crate) fn create(path: &Path, compressed: bool) -> Result<Self> {
        let writer = file::open_writer(path, WriteMode::Truncate, compressed)?;
        Ok(Self {
            path: path.to_path_buf(),
            writer,
        })
    }

    /// Rename `path` over `target` while holding `target`'s exclusive lock
    fn replace(path: &Path, target: &Path, compressed: bool) -> Result<()> {
        let lock = if compressed {
            None
        } else {
            Some(file::lock_exclusive(target)?)
        };

        fs::rename(path, target).at(target)?;
        // The lock now guards the unlinked old inode; release it all the same
        drop(lock);

        file::sync_parent(target)
    }

    fn remove(path: &Path) {
        match fs::remove_file(path) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "failed to remove temp file")
            }
        }
    }
}

impl Sink for TempFileSink {
    fn write_str(&mut self, s: &str) -> Result<()> {
        self.writer.write_line(s)
    }

    fn commit(self: Box<Self>, target: &Path, compressed: bool) -> Result<()> {
        let Self { path, writer } = *self;

        let renamed = writer.finish().and_then(|()| Self::replace(&path, target, compressed));
        if renamed.is_err() {
            Self::remove(&path);
        }
        renamed
    }

    fn abort(self: Box<Self>) {
        let Self { path, writer } = *self;
        drop(writer);
        Self::remove(&path);
    }
}

// =============================================================================
// Memory Sink
// =============================================================================

pub(crate) struct MemorySink {
    buf: Vec<u8>,
}

impl MemorySink {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }
}

impl Sink for MemorySink {
    fn write_str(&mut self, s: &str) -> Result<()> {
        self.buf.extend_from_slice(s.as_bytes());
        Ok(())
    }

    fn commit(self: Box<Self>, target: &Path, compressed: bool) -> Result<()> {
        let mut writer = file::open_writer(target, WriteMode::Truncate, compressed)?;
        writer.write_all(&self.buf)?;
        writer.finish()
    }

    fn abort(self: Box<Self>) {}
}

// =============================================================================
// Rewrite
// =============================================================================

/// Rewrite `source`, replacing every line for `key` with `new_line`
/// (a complete, newline-terminated record) or dropping it when `None`.
///
/// Returns how many lines matched. Any failure aborts the sink and leaves
/// the store file as it was, except for a failed final write of a
/// [`MemorySink`].
pub(crate) fn rewrite(
    source: &Path,
    compressed: bool,
    key: &str,
    new_line: Option<&str>,
    mut sink: Box<dyn Sink>,
) -> Result<usize> {
    match copy_lines(source, compressed, key, new_line, sink.as_mut()) {
        Ok(matched) => {
            sink.commit(source, compressed)?;
            Ok(matched)
        }
        Err(e) => {
            sink.abort();
            Err(e)
        }
    }
}

fn copy_lines(
    source: &Path,
    compressed: bool,
    key: &str,
    new_line: Option<&str>,
    sink: &mut dyn Sink,
) -> Result<usize> {
    let reader = file::open_reader(source, compressed)?;
    let mut matched = 0;

    for line in reader {
        let line = line?;
        match record::key_of(&line) {
            Some(line_key) if line_key == key => {
                matched += 1;
                if let Some(replacement) = new_line {
                    sink.write_str(replacement)?;
                }
            }
            other => {
                if other.is_none() {
                    tracing::warn!(path = %source.display(), "copying malformed line unchanged");
                }
                sink.write_str(&line)?;
                sink.write_str("\n")?;
            }
        }
    }

    Ok(matched)
}
