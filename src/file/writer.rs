//! Line Writer
//!
//! Buffered (optionally gzip-compressed) output to a store file.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use flate2::write::GzEncoder;
use flate2::Compression;

use crate::error::{IoContext, Result};

use super::FileLock;

enum Output {
    Plain(BufWriter<File>),
    Gzip(GzEncoder<BufWriter<File>>),
}

/// Writes raw bytes to a store file.
///
/// Call [`finish`](LineWriter::finish) to flush, sync, and release the
/// lock with errors surfaced. Dropping without `finish` still releases
/// the lock but swallows flush errors.
pub struct LineWriter {
    path: PathBuf,
    output: Output,
    lock: Option<FileLock>,
}

impl LineWriter {
    pub(super) fn new(path: &Path, file: File, compressed: bool, lock: Option<FileLock>) -> Self {
        let buffered = BufWriter::new(file);
        let output = if compressed {
            Output::Gzip(GzEncoder::new(buffered, Compression::default()))
        } else {
            Output::Plain(buffered)
        };

        Self {
            path: path.to_path_buf(),
            output,
            lock,
        }
    }

    /// Write a line; the caller supplies the terminator
    pub fn write_line(&mut self, line: &str) -> Result<()> {
        self.write_all(line.as_bytes())
    }

    /// Write raw bytes
    pub fn write_all(&mut self, bytes: &[u8]) -> Result<()> {
        match &mut self.output {
            Output::Plain(w) => w.write_all(bytes),
            Output::Gzip(w) => w.write_all(bytes),
        }
        .at(&self.path)
    }

    /// Flush everything to disk, then release the lock
    pub fn finish(self) -> Result<()> {
        let Self { path, output, lock } = self;

        let buffered = match output {
            Output::Plain(w) => w,
            Output::Gzip(w) => w.finish().at(&path)?,
        };
        let file = buffered.into_inner().map_err(|e| e.into_error()).at(&path)?;
        file.sync_all().at(&path)?;

        if let Some(lock) = lock {
            lock.release()?;
        }
        Ok(())
    }
}
