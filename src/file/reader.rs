//! Line Reader
//!
//! Sequential iteration over the lines of a store file.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

use flate2::read::MultiGzDecoder;

use crate::error::{IoContext, Result};

use super::FileLock;

/// Iterator over the non-empty lines of a file, terminators removed.
///
/// Holds the shared lock (if any) until dropped.
pub struct LineReader {
    path: PathBuf,
    source: Box<dyn BufRead + Send>,
    buf: String,
    _lock: Option<FileLock>,
}

impl LineReader {
    pub(super) fn new(
        path: &Path,
        file: File,
        compressed: bool,
        lock: Option<FileLock>,
    ) -> Result<Self> {
        let source: Box<dyn BufRead + Send> = if !compressed {
            Box::new(BufReader::new(file))
        } else if file.metadata().at(path)?.len() == 0 {
            // A fresh compressed store has no gzip header yet
            Box::new(io::empty())
        } else {
            // Every append adds a gzip member
            Box::new(BufReader::new(MultiGzDecoder::new(BufReader::new(file))))
        };

        Ok(Self {
            path: path.to_path_buf(),
            source,
            buf: String::new(),
            _lock: lock,
        })
    }
}

impl Iterator for LineReader {
    type Item = Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.buf.clear();
            match self.source.read_line(&mut self.buf).at(&self.path) {
                Ok(0) => return None,
                Ok(_) => {}
                Err(e) => return Some(Err(e)),
            }

            if self.buf.ends_with('\n') {
                self.buf.pop();
                if self.buf.ends_with('\r') {
                    self.buf.pop();
                }
            }

            if !self.buf.is_empty() {
                return Some(Ok(std::mem::take(&mut self.buf)));
            }
        }
    }
}
