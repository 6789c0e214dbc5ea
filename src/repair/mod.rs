//! Out-of-order repair for shards
//!
//! Appends are never order-checked, so a shard's rows can drift out of time
//! order; repair is the system's one corrective mechanism. It decodes a
//! shard's rows, stable-sorts them by timestamp (ties keep their on-disk
//! order), and atomically replaces the file via a temporary in the same
//! directory, so a crash mid-repair leaves the original untouched. Repair is
//! idempotent: an engine-written sorted shard comes out byte-identical.
//!
//! Malformed lines are skipped and reported with their original line numbers
//! rather than aborting the file; blank and comment lines are dropped. A
//! range sweep keeps going past per-file failures and reports them, matching
//! the engine's no-order-checks-fix-later philosophy.

use crate::shard::ForwardLines;
use crate::{codec, layout, DaybookError, Direction, Result, Row, TimeRange};
use chrono::NaiveDate;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{info, warn};

/// A line repair could not keep, with where it sat before the rewrite
#[derive(Debug, Clone)]
pub struct SkippedLine {
    /// 1-based line number in the file as it was before repair
    pub lineno: usize,
    /// The offending line, verbatim where representable
    pub line: String,
}

/// Outcome of repairing a single shard
#[derive(Debug)]
pub struct FileRepair {
    /// The shard that was rewritten
    pub path: PathBuf,
    /// Rows decoded, sorted, and written back
    pub rows: usize,
    /// Lines dropped from the rewrite, reported so nothing is lost silently
    pub skipped: Vec<SkippedLine>,
}

/// Outcome of a range sweep; a partial failure is a report, not an error
#[derive(Debug, Default)]
pub struct RepairReport {
    /// Shards repaired, in date order
    pub repaired: Vec<(NaiveDate, FileRepair)>,
    /// Shards whose repair failed, with the per-file error
    pub failed: Vec<(NaiveDate, DaybookError)>,
}

impl RepairReport {
    /// True when every touched shard was rewritten with no dropped lines
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty() && self.repaired.iter().all(|(_, r)| r.skipped.is_empty())
    }

    /// Total rows written back across the sweep
    pub fn rows(&self) -> usize {
        self.repaired.iter().map(|(_, r)| r.rows).sum()
    }
}

/// Re-sort one shard's rows by timestamp and rewrite it in place.
///
/// Memory use is proportional to this one file, never the database. IO
/// failures surface as [`RepairIo`](DaybookError::RepairIo).
pub fn repair_file(path: &Path) -> Result<FileRepair> {
    let file = File::open(path).map_err(|e| repair_io(path, e))?;

    let mut rows: Vec<Row> = Vec::new();
    let mut skipped = Vec::new();

    for (idx, line) in ForwardLines::new(file).enumerate() {
        let lineno = idx + 1;
        let line = match line {
            Ok(line) => line,
            Err(DaybookError::Io(e)) => return Err(repair_io(path, e)),
            Err(_) => {
                // Undecodable bytes; the content cannot be carried over.
                skipped.push(SkippedLine {
                    lineno,
                    line: "<invalid UTF-8>".to_string(),
                });
                continue;
            }
        };

        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        match codec::decode(trimmed) {
            Ok(row) => rows.push(row),
            Err(e) => {
                warn!(path = %path.display(), lineno, %e, "skipping malformed line during repair");
                skipped.push(SkippedLine { lineno, line });
            }
        }
    }

    // Stable: rows with equal timestamps keep their on-disk order.
    rows.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));

    let parent = path.parent().ok_or_else(|| {
        DaybookError::PathResolution(format!("{} has no parent directory", path.display()))
    })?;

    let mut tmp = NamedTempFile::new_in(parent).map_err(|e| repair_io(path, e))?;
    for row in &rows {
        tmp.write_all(codec::encode(row).as_bytes())
            .map_err(|e| repair_io(path, e))?;
    }
    tmp.flush().map_err(|e| repair_io(path, e))?;
    tmp.as_file().sync_all().map_err(|e| repair_io(path, e))?;
    tmp.persist(path).map_err(|e| repair_io(path, e.error))?;

    info!(
        path = %path.display(),
        rows = rows.len(),
        skipped = skipped.len(),
        "repaired shard"
    );

    Ok(FileRepair {
        path: path.to_path_buf(),
        rows: rows.len(),
        skipped,
    })
}

/// Repair every existing shard the range's enumeration touches.
///
/// Dates with no file are passed over; a shard whose repair fails is recorded
/// in the report and the sweep continues.
pub fn repair_range(root: &Path, device: &str, range: &TimeRange) -> Result<RepairReport> {
    let shards = layout::enumerate(root, device, range, Direction::Forward)?;
    let mut report = RepairReport::default();

    for (date, path) in shards {
        if !path.exists() {
            continue;
        }
        match repair_file(&path) {
            Ok(outcome) => report.repaired.push((date, outcome)),
            Err(e) => {
                warn!(device, %date, %e, "shard repair failed, continuing sweep");
                report.failed.push((date, e));
            }
        }
    }

    Ok(report)
}

fn repair_io(path: &Path, source: std::io::Error) -> DaybookError {
    DaybookError::RepairIo {
        path: path.to_path_buf(),
        source,
    }
}
