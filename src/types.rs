//! Core types for daybook

use crate::{DaybookError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// An ISO-8601 timestamp, held as the string the application supplied.
///
/// The engine treats timestamps as opaque: they are compared lexicographically
/// (which orders ISO-8601 strings chronologically when the application is
/// consistent about precision and offsets) and are never re-timezoned. The only
/// structure the engine reads out of a timestamp is the leading `YYYY-MM-DD`
/// calendar date, used to place the row in a day file.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(String);

impl Timestamp {
    /// Create a timestamp from the application's string representation
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The timestamp exactly as supplied
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the timestamp, returning the underlying string
    pub fn into_inner(self) -> String {
        self.0
    }

    /// Extract the calendar date from the leading `YYYY-MM-DD` component
    pub fn date(&self) -> Result<NaiveDate> {
        let date_part = self.0.get(..10).ok_or_else(|| {
            DaybookError::PathResolution(format!(
                "timestamp {:?} is too short to contain a calendar date",
                self.0
            ))
        })?;

        NaiveDate::parse_from_str(date_part, "%Y-%m-%d").map_err(|e| {
            DaybookError::PathResolution(format!("timestamp {:?}: {}", self.0, e))
        })
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Timestamp {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for Timestamp {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// One stored record: a timestamp plus one or more opaque string values.
///
/// The engine does not interpret values and does not enforce a column count
/// across rows; the application owns column semantics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Row {
    /// When the record was taken, as supplied by the application
    pub timestamp: Timestamp,
    /// Ordered values, at least one
    pub values: Vec<String>,
}

impl Row {
    /// Create a new row
    pub fn new(timestamp: impl Into<Timestamp>, values: Vec<String>) -> Self {
        Self {
            timestamp: timestamp.into(),
            values,
        }
    }
}

/// One end of a time range
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bound {
    /// The boundary timestamp
    pub timestamp: Timestamp,
    /// Whether a row exactly at the boundary is included
    pub inclusive: bool,
}

impl Bound {
    /// A bound that includes rows exactly at the boundary
    pub fn inclusive(timestamp: impl Into<Timestamp>) -> Self {
        Self {
            timestamp: timestamp.into(),
            inclusive: true,
        }
    }

    /// A bound that excludes rows exactly at the boundary
    pub fn exclusive(timestamp: impl Into<Timestamp>) -> Self {
        Self {
            timestamp: timestamp.into(),
            inclusive: false,
        }
    }
}

/// Time range for queries; either end may be unbounded
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    /// Lower bound, or `None` for unbounded
    pub start: Option<Bound>,
    /// Upper bound, or `None` for unbounded
    pub end: Option<Bound>,
}

impl TimeRange {
    /// Create a range from explicit bounds
    pub fn new(start: Option<Bound>, end: Option<Bound>) -> Self {
        Self { start, end }
    }

    /// The unbounded range: every row the device has
    pub fn all() -> Self {
        Self::default()
    }

    /// The half-open interval `[start, end)`
    pub fn half_open(start: impl Into<Timestamp>, end: impl Into<Timestamp>) -> Self {
        Self {
            start: Some(Bound::inclusive(start)),
            end: Some(Bound::exclusive(end)),
        }
    }

    /// The closed interval `[start, end]`
    pub fn closed(start: impl Into<Timestamp>, end: impl Into<Timestamp>) -> Self {
        Self {
            start: Some(Bound::inclusive(start)),
            end: Some(Bound::inclusive(end)),
        }
    }

    /// Everything at or after `start`
    pub fn since(start: impl Into<Timestamp>) -> Self {
        Self {
            start: Some(Bound::inclusive(start)),
            end: None,
        }
    }

    /// Everything strictly before `end`
    pub fn until(end: impl Into<Timestamp>) -> Self {
        Self {
            start: None,
            end: Some(Bound::exclusive(end)),
        }
    }

    /// Check if a timestamp falls within the range
    pub fn contains(&self, timestamp: &Timestamp) -> bool {
        if let Some(start) = &self.start {
            if timestamp < &start.timestamp {
                return false;
            }
            if !start.inclusive && timestamp == &start.timestamp {
                return false;
            }
        }

        if let Some(end) = &self.end {
            if timestamp > &end.timestamp {
                return false;
            }
            if !end.inclusive && timestamp == &end.timestamp {
                return false;
            }
        }

        true
    }
}

/// Scan direction for queries
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Direction {
    /// Earliest shard first, each file head to tail
    #[default]
    Forward,
    /// Latest shard first, each file tail to head
    Reverse,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp_date() {
        let ts = Timestamp::new("2020-08-01T10:00:00");
        assert_eq!(ts.date().unwrap(), NaiveDate::from_ymd_opt(2020, 8, 1).unwrap());

        // A bare date is a valid timestamp too.
        let ts = Timestamp::new("2020-08-01");
        assert_eq!(ts.date().unwrap(), NaiveDate::from_ymd_opt(2020, 8, 1).unwrap());
    }

    #[test]
    fn test_timestamp_date_rejects_garbage() {
        assert!(Timestamp::new("10:00:00").date().is_err());
        assert!(Timestamp::new("2020").date().is_err());
        assert!(Timestamp::new("not-a-date-at-all").date().is_err());
    }

    #[test]
    fn test_timestamp_ordering_is_lexicographic() {
        let a = Timestamp::new("2020-08-01T09:00:00");
        let b = Timestamp::new("2020-08-01T10:00:00");
        let c = Timestamp::new("2020-08-02T00:00:00");

        assert!(a < b);
        assert!(b < c);
        assert_eq!(a, Timestamp::new("2020-08-01T09:00:00"));
    }

    #[test]
    fn test_range_contains() {
        let range = TimeRange::half_open("2020-08-01T09:00:00", "2020-08-01T10:00:00");

        assert!(range.contains(&Timestamp::new("2020-08-01T09:00:00")));
        assert!(range.contains(&Timestamp::new("2020-08-01T09:59:59")));
        assert!(!range.contains(&Timestamp::new("2020-08-01T10:00:00")));
        assert!(!range.contains(&Timestamp::new("2020-08-01T08:59:59")));
    }

    #[test]
    fn test_degenerate_range_contains_nothing() {
        let ts = "2020-08-01T09:00:00";
        let range = TimeRange::half_open(ts, ts);
        assert!(!range.contains(&Timestamp::new(ts)));
    }

    #[test]
    fn test_unbounded_range() {
        let range = TimeRange::all();
        assert!(range.contains(&Timestamp::new("1970-01-01T00:00:00")));
        assert!(range.contains(&Timestamp::new("2999-12-31T23:59:59")));

        let range = TimeRange::since("2020-08-01T00:00:00");
        assert!(range.contains(&Timestamp::new("2021-01-01T00:00:00")));
        assert!(!range.contains(&Timestamp::new("2019-12-31T23:59:59")));
    }
}
