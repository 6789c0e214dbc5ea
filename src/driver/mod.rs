//! Scoped read-or-write access to a device's shards
//!
//! A [`DriverContext`] is the gate through which every file operation runs. It
//! is opened in exactly one of two modes and never switches: a context opened
//! for reading refuses appends, a context opened for writing refuses queries,
//! and switching means closing and reopening. The trade-off is deliberate: it
//! gives up read-while-write convenience so that a write can never mutate a
//! file under an in-flight streaming decode.
//!
//! Closing a context (explicitly or on drop) flushes and releases every cached
//! writer and invalidates every outstanding [`Rows`] cursor; polling such a
//! cursor afterwards releases its file handle and fails with
//! [`ContextClosed`](crate::DaybookError::ContextClosed).

mod cursor;
mod device;

pub use cursor::Rows;
pub use device::Device;

use crate::{layout, DaybookError, Direction, Result, Row, TimeRange};
use chrono::NaiveDate;
use parking_lot::Mutex;
use std::fmt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::debug;

use crate::shard::ShardWriter;

/// The single mode a context is opened in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    /// Streaming queries only
    Read,
    /// Appends only
    Write,
}

impl fmt::Display for AccessMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessMode::Read => write!(f, "read"),
            AccessMode::Write => write!(f, "write"),
        }
    }
}

/// Liveness flag shared between a context and its outstanding cursors
#[derive(Debug)]
pub(crate) struct ContextState {
    open: AtomicBool,
}

impl ContextState {
    fn new() -> Self {
        Self {
            open: AtomicBool::new(true),
        }
    }

    pub(crate) fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }

    fn close(&self) {
        self.open.store(false, Ordering::Release);
    }
}

/// A read-or-write session over one device's shards.
///
/// Holds no file handles at open; writers are acquired lazily per calendar
/// date on first append and cached for the context's lifetime, in request
/// order. Cursors from [`query`](DriverContext::query) open their shard files
/// lazily as they are polled.
pub struct DriverContext {
    root: PathBuf,
    device: String,
    mode: AccessMode,
    state: Arc<ContextState>,
    writers: Mutex<Vec<(NaiveDate, ShardWriter)>>,
}

impl DriverContext {
    /// Open a context on `device` under the database root, in `mode`
    pub fn open(
        root: impl Into<PathBuf>,
        device: impl Into<String>,
        mode: AccessMode,
    ) -> Result<Self> {
        let device = device.into();
        layout::validate_device_id(&device)?;

        Ok(Self {
            root: root.into(),
            device,
            mode,
            state: Arc::new(ContextState::new()),
            writers: Mutex::new(Vec::new()),
        })
    }

    /// The mode this context was opened in
    pub fn mode(&self) -> AccessMode {
        self.mode
    }

    /// Whether the context is still open
    pub fn is_open(&self) -> bool {
        self.state.is_open()
    }

    /// Append one row, routed to the day file of its timestamp's date.
    ///
    /// No ordering check is made against the file's existing rows; out-of-order
    /// appends land as-is and are put right by a later repair.
    pub fn append(&self, row: &Row) -> Result<()> {
        self.ensure_open()?;
        self.ensure_mode(AccessMode::Write)?;

        let date = row.timestamp.date()?;
        let mut writers = self.writers.lock();

        if let Some((_, writer)) = writers.iter_mut().find(|(d, _)| *d == date) {
            return writer.append(row);
        }

        let path = layout::shard_path(&self.root, &self.device, date);
        let mut writer = ShardWriter::open(path)?;
        writer.append(row)?;
        writers.push((date, writer));

        Ok(())
    }

    /// Stream rows whose timestamps fall in `range`, in `direction`.
    ///
    /// Rows come back in file-enumeration order and, within each file, in
    /// on-disk line order; the engine does not sort. Missing day files are
    /// skipped silently. The cursor stays valid until this context closes.
    pub fn query(&self, range: &TimeRange, direction: Direction) -> Result<Rows> {
        self.ensure_open()?;
        self.ensure_mode(AccessMode::Read)?;

        let shards = layout::enumerate(&self.root, &self.device, range, direction)?;
        Ok(Rows::new(
            Arc::clone(&self.state),
            shards,
            range.clone(),
            direction,
        ))
    }

    /// Flush every cached writer without closing the context
    pub fn flush(&self) -> Result<()> {
        self.ensure_open()?;

        let mut writers = self.writers.lock();
        for (_, writer) in writers.iter_mut() {
            writer.flush()?;
        }
        Ok(())
    }

    /// Close the context: flush and release all writers, invalidate cursors.
    ///
    /// Idempotent; closing twice is a no-op. Also runs on drop, ignoring
    /// flush errors there.
    pub fn close(&self) -> Result<()> {
        if !self.state.is_open() {
            return Ok(());
        }

        let mut writers = self.writers.lock();
        let mut result = Ok(());

        // Release in acquisition order; keep the first flush failure.
        for (date, mut writer) in writers.drain(..) {
            debug!(device = %self.device, %date, "releasing shard writer");
            if let Err(e) = writer.flush() {
                if result.is_ok() {
                    result = Err(e);
                }
            }
        }

        self.state.close();
        result
    }

    fn ensure_open(&self) -> Result<()> {
        if self.state.is_open() {
            Ok(())
        } else {
            Err(DaybookError::ContextClosed)
        }
    }

    fn ensure_mode(&self, requested: AccessMode) -> Result<()> {
        if self.mode == requested {
            Ok(())
        } else {
            Err(DaybookError::ModeConflict {
                requested,
                actual: self.mode,
            })
        }
    }
}

impl Drop for DriverContext {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

impl fmt::Debug for DriverContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DriverContext")
            .field("device", &self.device)
            .field("mode", &self.mode)
            .field("open", &self.is_open())
            .finish()
    }
}
