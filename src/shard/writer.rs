//! Append-only shard writer

use crate::{codec, Result, Row};
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Append-only handle on one day file.
///
/// Opens positioned at end-of-file, creating parent directories and the file
/// itself if absent. Each append lands as one complete, newline-terminated
/// line, flushed before the call returns. No ordering check is made against
/// the file's existing contents; callers wanting time order must append in
/// order or run a repair afterwards. The type exposes no read surface.
pub struct ShardWriter {
    file: BufWriter<File>,
    path: PathBuf,
}

impl ShardWriter {
    /// Open a shard for appending, creating it and its directories if needed
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        debug!(path = %path.display(), "opened shard for append");

        Ok(Self {
            file: BufWriter::new(file),
            path,
        })
    }

    /// Encode and append one row as a complete line
    pub fn append(&mut self, row: &Row) -> Result<()> {
        let line = codec::encode(row);
        self.file.write_all(line.as_bytes())?;
        self.file.flush()?;
        Ok(())
    }

    /// Flush buffered writes to the OS
    pub fn flush(&mut self) -> Result<()> {
        self.file.flush()?;
        Ok(())
    }

    /// Flush and ask the OS to commit the file to stable storage
    pub fn sync(&mut self) -> Result<()> {
        self.file.flush()?;
        self.file.get_ref().sync_all()?;
        Ok(())
    }

    /// Path of the shard this writer appends to
    pub fn path(&self) -> &Path {
        &self.path
    }
}
