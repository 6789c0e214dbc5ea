//! daybook - File-Backed Time-Series Storage Engine
//!
//! A plain-text time-series store: rows of (timestamp, values) keyed by a
//! device id and partitioned by calendar date into one file per day under
//! `root/<device>/<YYYY>/<MM>/<DD>.txt`. Optimized for dumb durability and
//! memory-bounded scans rather than throughput: every row is a line of text
//! you can read with your eyes, and queries stream it back without ever
//! materializing a file.
//!
//! # Architecture
//!
//! - **layout**: pure mapping between (device, time) and day-file paths
//! - **codec**: one-line-per-row encoding and decoding
//! - **shard**: append-only writers and O(1)-memory line readers per day file
//! - **driver**: the read-or-write context gating all file access, and the
//!   lazy multi-file cursor
//! - **repair**: the offline pass that restores time order inside a shard
//!
//! Appends are never order-checked; files drift out of time order and
//! [`repair`] puts them right. Readers hand rows back in on-disk order and
//! leave sortedness to the writing discipline of the application.
//!
//! The engine is single-process and synchronous; it provides no cross-context
//! or cross-process locking. Callers running independent contexts against the
//! same files coordinate themselves.

pub mod codec;
pub mod driver;
pub mod layout;
pub mod repair;
pub mod shard;

mod error;
mod types;

pub use driver::{AccessMode, Device, DriverContext, Rows};
pub use error::{DaybookError, Result};
pub use repair::{FileRepair, RepairReport, SkippedLine};
pub use types::*;

/// daybook version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default configuration values
pub mod config {
    /// Field delimiter between the timestamp and each value
    pub const DELIMITER: char = ' ';

    /// Extension given to every day file
    pub const FILE_EXTENSION: &str = "txt";

    /// Chunk size for the backward scan of reverse reads (8 KiB)
    pub const REVERSE_CHUNK_SIZE: usize = 8 * 1024;
}
