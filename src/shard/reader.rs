//! Memory-bounded line readers over a single shard
//!
//! Both readers hold O(1) buffered state regardless of file size: a shard of a
//! million rows costs the same working set as a shard of ten. Lines are
//! yielded as raw strings without their terminator; decoding is the cursor's
//! job.

use crate::config::REVERSE_CHUNK_SIZE;
use crate::{DaybookError, Result};
use std::fs::File;
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom};

/// Head-to-tail line iterator over one shard
#[derive(Debug)]
pub struct ForwardLines {
    reader: BufReader<File>,
    buf: Vec<u8>,
    done: bool,
}

impl ForwardLines {
    /// Wrap an open shard file
    pub fn new(file: File) -> Self {
        Self {
            reader: BufReader::new(file),
            buf: Vec::new(),
            done: false,
        }
    }
}

impl Iterator for ForwardLines {
    type Item = Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        self.buf.clear();
        match self.reader.read_until(b'\n', &mut self.buf) {
            Err(e) => {
                self.done = true;
                Some(Err(e.into()))
            }
            Ok(0) => {
                self.done = true;
                None
            }
            Ok(_) => {
                strip_terminator(&mut self.buf);
                Some(line_from_bytes(&self.buf))
            }
        }
    }
}

/// Tail-to-head line iterator over one shard.
///
/// Scans the file backwards one bounded chunk at a time: seek back, read the
/// chunk, split it on newlines, yield the complete pieces last-first and carry
/// the partial first piece into the next chunk. The file is never materialized;
/// peak memory is one chunk plus the longest line.
#[derive(Debug)]
pub struct ReverseLines {
    file: File,
    /// Bytes of the file not yet scanned, counted from the front
    offset: u64,
    chunk_size: usize,
    /// Complete lines from scanned chunks, in file order; popped from the back
    pending: Vec<Vec<u8>>,
    /// Partial line spilling over the current chunk's front boundary
    remainder: Vec<u8>,
    done: bool,
}

impl ReverseLines {
    /// Wrap an open shard file, using the default chunk size
    pub fn new(file: File) -> Result<Self> {
        Self::with_chunk_size(file, REVERSE_CHUNK_SIZE)
    }

    /// Wrap an open shard file with an explicit chunk size
    pub fn with_chunk_size(mut file: File, chunk_size: usize) -> Result<Self> {
        debug_assert!(chunk_size > 0);
        let offset = file.seek(SeekFrom::End(0))?;

        Ok(Self {
            file,
            offset,
            chunk_size,
            pending: Vec::new(),
            remainder: Vec::new(),
            done: false,
        })
    }

    fn read_previous_chunk(&mut self) -> std::io::Result<()> {
        let len = self.offset.min(self.chunk_size as u64) as usize;
        self.offset -= len as u64;
        self.file.seek(SeekFrom::Start(self.offset))?;

        let mut block = vec![0u8; len];
        self.file.read_exact(&mut block)?;

        // The carried remainder is the continuation of this chunk's last piece.
        block.extend_from_slice(&self.remainder);

        let mut pieces = block.split(|&b| b == b'\n');
        self.remainder = pieces.next().unwrap_or_default().to_vec();
        self.pending = pieces.map(<[u8]>::to_vec).collect();

        Ok(())
    }
}

impl Iterator for ReverseLines {
    type Item = Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        loop {
            if let Some(mut line) = self.pending.pop() {
                strip_terminator(&mut line);
                return Some(line_from_bytes(&line));
            }

            if self.offset == 0 {
                // The first line of the file is whatever is left over.
                self.done = true;
                let mut line = std::mem::take(&mut self.remainder);
                strip_terminator(&mut line);
                return Some(line_from_bytes(&line));
            }

            if let Err(e) = self.read_previous_chunk() {
                self.done = true;
                return Some(Err(e.into()));
            }
        }
    }
}

fn strip_terminator(line: &mut Vec<u8>) {
    if line.last() == Some(&b'\n') {
        line.pop();
    }
    if line.last() == Some(&b'\r') {
        line.pop();
    }
}

fn line_from_bytes(bytes: &[u8]) -> Result<String> {
    std::str::from_utf8(bytes)
        .map(str::to_owned)
        .map_err(|e| DaybookError::MalformedRow(format!("invalid UTF-8: {}", e)))
}
