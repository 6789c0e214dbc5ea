//! Mapping between logical (device, time) coordinates and on-disk paths
//!
//! One device maps to one subdirectory of the database root; one calendar date
//! maps to one day file under `root/<device>/<YYYY>/<MM>/<DD>.txt`. Resolution
//! is pure path arithmetic: nothing here checks that a file exists, so readers
//! can skip missing dates without treating them as errors.

use crate::config::FILE_EXTENSION;
use crate::{DaybookError, Direction, Result, TimeRange, Timestamp};
use chrono::{Datelike, Local, NaiveDate};
use std::fs;
use std::path::{Path, PathBuf};

/// Check that a device id can serve as a single path component.
///
/// The engine never escapes ids, so anything that would traverse the directory
/// tree is rejected outright.
pub fn validate_device_id(device: &str) -> Result<()> {
    if device.is_empty() {
        return Err(DaybookError::PathResolution(
            "device id must not be empty".to_string(),
        ));
    }
    if device == "." || device == ".." {
        return Err(DaybookError::PathResolution(format!(
            "device id {:?} is not a valid directory name",
            device
        )));
    }
    if device.contains(['/', '\\', '\0']) {
        return Err(DaybookError::PathResolution(format!(
            "device id {:?} contains a path separator",
            device
        )));
    }
    Ok(())
}

/// Build the day-file path for a calendar date
pub fn shard_path(root: &Path, device: &str, date: NaiveDate) -> PathBuf {
    root.join(device)
        .join(format!("{:04}", date.year()))
        .join(format!("{:02}", date.month()))
        .join(format!("{:02}.{}", date.day(), FILE_EXTENSION))
}

/// Resolve the day-file path holding rows stamped with `timestamp`.
///
/// Deterministic: the same (root, device, timestamp) always yields the same
/// path.
pub fn resolve(root: &Path, device: &str, timestamp: &Timestamp) -> Result<PathBuf> {
    validate_device_id(device)?;
    Ok(shard_path(root, device, timestamp.date()?))
}

/// Enumerate every (date, path) whose day file could hold rows overlapping
/// `range`, boundary dates included, in `direction` order.
///
/// An unbounded end is clamped to today's local date; an unbounded start is
/// resolved by scanning the device directory for its earliest shard. Inverted
/// ranges enumerate nothing. Existence of the files is not checked.
pub fn enumerate(
    root: &Path,
    device: &str,
    range: &TimeRange,
    direction: Direction,
) -> Result<Vec<(NaiveDate, PathBuf)>> {
    validate_device_id(device)?;

    let start = match &range.start {
        Some(bound) => bound.timestamp.date()?,
        None => match earliest_shard_date(&root.join(device))? {
            Some(date) => date,
            None => return Ok(Vec::new()),
        },
    };

    let end = match &range.end {
        Some(bound) => bound.timestamp.date()?,
        None => Local::now().date_naive(),
    };

    if start > end {
        return Ok(Vec::new());
    }

    let mut shards = Vec::new();
    let mut date = start;
    loop {
        shards.push((date, shard_path(root, device, date)));
        if date == end {
            break;
        }
        date = date.succ_opt().ok_or_else(|| {
            DaybookError::PathResolution(format!("calendar overflow after {}", date))
        })?;
    }

    if direction == Direction::Reverse {
        shards.reverse();
    }

    Ok(shards)
}

/// Find the earliest date that has a shard on disk, by walking the
/// year/month/day hierarchy in ascending numeric order.
fn earliest_shard_date(device_dir: &Path) -> Result<Option<NaiveDate>> {
    for (year, year_dir) in numeric_dirs_ascending(device_dir)? {
        for (month, month_dir) in numeric_dirs_ascending(&year_dir)? {
            if let Some(day) = shard_days_ascending(&month_dir)?.first() {
                if let Some(date) = NaiveDate::from_ymd_opt(year as i32, month, *day) {
                    return Ok(Some(date));
                }
            }
        }
    }
    Ok(None)
}

/// Numerically named subdirectories of `dir`, ascending
fn numeric_dirs_ascending(dir: &Path) -> Result<Vec<(u32, PathBuf)>> {
    let mut found = Vec::new();
    if !dir.is_dir() {
        return Ok(found);
    }

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let name = entry.file_name();
        if let Some(n) = name.to_str().and_then(|s| s.parse::<u32>().ok()) {
            found.push((n, entry.path()));
        }
    }

    found.sort_by_key(|(n, _)| *n);
    Ok(found)
}

/// Day numbers with a shard file in `dir`, ascending
fn shard_days_ascending(dir: &Path) -> Result<Vec<u32>> {
    let mut found = Vec::new();
    if !dir.is_dir() {
        return Ok(found);
    }

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some(FILE_EXTENSION) {
            continue;
        }
        if let Some(n) = path
            .file_stem()
            .and_then(|s| s.to_str())
            .and_then(|s| s.parse::<u32>().ok())
        {
            found.push(n);
        }
    }

    found.sort_unstable();
    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use tempfile::TempDir;

    #[test]
    fn test_resolve_is_deterministic() {
        let root = Path::new("/data/db");
        let ts = Timestamp::new("2020-08-01T10:00:00");

        let first = resolve(root, "garden-shed", &ts).unwrap();
        let second = resolve(root, "garden-shed", &ts).unwrap();

        assert_eq!(first, second);
        assert_eq!(first, Path::new("/data/db/garden-shed/2020/08/01.txt"));
    }

    #[test]
    fn test_resolve_rejects_bad_device_ids() {
        let root = Path::new("/data/db");
        let ts = Timestamp::new("2020-08-01T10:00:00");

        for bad in ["", ".", "..", "a/b", "a\\b", "a\0b"] {
            assert!(matches!(
                resolve(root, bad, &ts),
                Err(DaybookError::PathResolution(_))
            ));
        }
    }

    #[test]
    fn test_resolve_rejects_unparsable_timestamp() {
        let root = Path::new("/data/db");
        assert!(matches!(
            resolve(root, "dev", &Timestamp::new("half past nine")),
            Err(DaybookError::PathResolution(_))
        ));
    }

    #[test]
    fn test_enumerate_spans_boundary_dates() {
        let root = Path::new("/data/db");
        let range = TimeRange::half_open("2020-08-30T12:00:00", "2020-09-02T06:00:00");

        let shards = enumerate(root, "dev", &range, Direction::Forward).unwrap();
        let dates: Vec<NaiveDate> = shards.iter().map(|(d, _)| *d).collect();

        assert_eq!(
            dates,
            vec![
                NaiveDate::from_ymd_opt(2020, 8, 30).unwrap(),
                NaiveDate::from_ymd_opt(2020, 8, 31).unwrap(),
                NaiveDate::from_ymd_opt(2020, 9, 1).unwrap(),
                NaiveDate::from_ymd_opt(2020, 9, 2).unwrap(),
            ]
        );
        assert_eq!(shards[3].1, Path::new("/data/db/dev/2020/09/02.txt"));
    }

    #[test]
    fn test_enumerate_reverse_order() {
        let root = Path::new("/data/db");
        let range = TimeRange::half_open("2020-08-01T00:00:00", "2020-08-03T00:00:00");

        let forward = enumerate(root, "dev", &range, Direction::Forward).unwrap();
        let mut reverse = enumerate(root, "dev", &range, Direction::Reverse).unwrap();

        reverse.reverse();
        assert_eq!(forward, reverse);
    }

    #[test]
    fn test_enumerate_inverted_range_is_empty() {
        let root = Path::new("/data/db");
        let range = TimeRange::half_open("2020-08-03T00:00:00", "2020-08-01T00:00:00");
        assert!(enumerate(root, "dev", &range, Direction::Forward)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_enumerate_unbounded_end_clamps_to_today() {
        let root = Path::new("/data/db");
        let today = Local::now().date_naive();
        let start = today - Duration::days(2);
        let range = TimeRange::since(start.format("%Y-%m-%dT00:00:00").to_string());

        let shards = enumerate(root, "dev", &range, Direction::Forward).unwrap();

        assert_eq!(shards.len(), 3);
        assert_eq!(shards[0].0, start);
        assert_eq!(shards[2].0, today);
    }

    #[test]
    fn test_enumerate_unbounded_start_scans_directory() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        // Earliest shard is 2019-12-31; an empty month directory earlier in
        // the same year must not confuse the scan.
        fs::create_dir_all(root.join("dev/2019/01")).unwrap();
        fs::create_dir_all(root.join("dev/2019/12")).unwrap();
        fs::create_dir_all(root.join("dev/2020/01")).unwrap();
        fs::write(root.join("dev/2019/12/31.txt"), "").unwrap();
        fs::write(root.join("dev/2020/01/05.txt"), "").unwrap();

        let range = TimeRange::until("2020-01-02T00:00:00");
        let shards = enumerate(root, "dev", &range, Direction::Forward).unwrap();

        assert_eq!(shards.first().unwrap().0, NaiveDate::from_ymd_opt(2019, 12, 31).unwrap());
        assert_eq!(shards.last().unwrap().0, NaiveDate::from_ymd_opt(2020, 1, 2).unwrap());
    }

    #[test]
    fn test_enumerate_unknown_device_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let shards = enumerate(
            temp_dir.path(),
            "nonexistent",
            &TimeRange::all(),
            Direction::Forward,
        )
        .unwrap();
        assert!(shards.is_empty());
    }
}
