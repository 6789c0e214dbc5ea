//! The streaming cursor: a lazy, finite sequence of decoded rows
//!
//! [`Rows`] walks the shard files a range enumeration produced, opening each
//! one only when the previous is exhausted and reading it line by line, so the
//! working set stays O(1) no matter how much data the range covers. It yields
//! rows in file-enumeration order and, within a file, in on-disk line order;
//! it never sorts. Every line is inspected against the range, with no early
//! termination, because shards are not assumed sorted until a repair has run.
//!
//! A malformed line is surfaced as a per-row error carrying its location;
//! iteration continues afterwards, so the caller decides whether a bad row
//! aborts the query or is skipped. The default is therefore propagate, never
//! silently drop.

use super::ContextState;
use crate::shard::{ForwardLines, ReverseLines};
use crate::{codec, DaybookError, Direction, Result, Row, TimeRange};
use chrono::NaiveDate;
use std::fs::File;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Debug)]
enum ShardLines {
    Forward(ForwardLines),
    Reverse(ReverseLines),
}

impl Iterator for ShardLines {
    type Item = Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            ShardLines::Forward(lines) => lines.next(),
            ShardLines::Reverse(lines) => lines.next(),
        }
    }
}

#[derive(Debug)]
struct OpenShard {
    path: PathBuf,
    lines: ShardLines,
    /// Raw lines pulled from this shard so far; in reverse scans the count is
    /// from the tail and reported negative, as in "line -3 of ..."
    lineno: u64,
}

/// Lazy cursor over the rows a query matched.
///
/// Finite, not restartable; request a fresh cursor from a still-open context
/// to scan again. Tied to the originating context's lifetime: once that
/// context closes, the next poll releases the cursor's file handle and yields
/// [`ContextClosed`](DaybookError::ContextClosed), after which the cursor is
/// fused. Dropping a partially consumed cursor releases its handle.
#[derive(Debug)]
pub struct Rows {
    state: Arc<ContextState>,
    shards: std::vec::IntoIter<(NaiveDate, PathBuf)>,
    range: TimeRange,
    direction: Direction,
    current: Option<OpenShard>,
    finished: bool,
}

impl Rows {
    pub(crate) fn new(
        state: Arc<ContextState>,
        shards: Vec<(NaiveDate, PathBuf)>,
        range: TimeRange,
        direction: Direction,
    ) -> Self {
        Self {
            state,
            shards: shards.into_iter(),
            range,
            direction,
            current: None,
            finished: false,
        }
    }

    /// Open the next enumerated shard, skipping dates with no file.
    /// Returns false when the enumeration is exhausted.
    fn open_next_shard(&mut self) -> Result<bool> {
        loop {
            let Some((date, path)) = self.shards.next() else {
                return Ok(false);
            };

            let file = match File::open(&path) {
                Ok(file) => file,
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    debug!(%date, path = %path.display(), "no shard for date, skipping");
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            let lines = match self.direction {
                Direction::Forward => ShardLines::Forward(ForwardLines::new(file)),
                Direction::Reverse => ShardLines::Reverse(ReverseLines::new(file)?),
            };

            self.current = Some(OpenShard {
                path,
                lines,
                lineno: 0,
            });
            return Ok(true);
        }
    }

    fn locate(&self, shard: &OpenShard) -> String {
        match self.direction {
            Direction::Forward => format!("line {} of {}", shard.lineno, shard.path.display()),
            Direction::Reverse => format!("line -{} of {}", shard.lineno, shard.path.display()),
        }
    }
}

impl Iterator for Rows {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        if !self.state.is_open() {
            // Release the handle now rather than when the cursor is dropped.
            self.current = None;
            self.finished = true;
            return Some(Err(DaybookError::ContextClosed));
        }

        loop {
            if self.current.is_none() {
                match self.open_next_shard() {
                    Ok(true) => {}
                    Ok(false) => {
                        self.finished = true;
                        return None;
                    }
                    Err(e) => return Some(Err(e)),
                }
            }

            let Some(shard) = self.current.as_mut() else {
                continue;
            };

            let line = match shard.lines.next() {
                None => {
                    self.current = None;
                    continue;
                }
                Some(Ok(line)) => {
                    shard.lineno += 1;
                    line
                }
                Some(Err(e)) => {
                    shard.lineno += 1;
                    return Some(Err(e));
                }
            };

            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            match codec::decode(trimmed) {
                Ok(row) => {
                    if self.range.contains(&row.timestamp) {
                        return Some(Ok(row));
                    }
                }
                Err(DaybookError::MalformedRow(reason)) => {
                    let detail = match self.current.as_ref() {
                        Some(shard) => format!("{} ({})", reason, self.locate(shard)),
                        None => reason,
                    };
                    warn!("{}", detail);
                    return Some(Err(DaybookError::MalformedRow(detail)));
                }
                Err(e) => return Some(Err(e)),
            }
        }
    }
}
