//! Device handles

use super::{AccessMode, DriverContext};
use crate::repair::{self, RepairReport};
use crate::{layout, Result, TimeRange};
use std::fmt;
use std::path::{Path, PathBuf};

/// A named data source within a database root.
///
/// Devices are implicit: one exists exactly when its directory does, and the
/// directory appears lazily on first append. The handle itself holds no file
/// state; it only mints driver contexts and runs repairs.
#[derive(Debug, Clone)]
pub struct Device {
    root: PathBuf,
    name: String,
}

impl Device {
    /// Create a handle for `name` under the database root
    pub fn new(root: impl Into<PathBuf>, name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        layout::validate_device_id(&name)?;
        Ok(Self {
            root: root.into(),
            name,
        })
    }

    /// The database root this device lives under
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The device id
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Top-level directory containing this device's shards
    pub fn path(&self) -> PathBuf {
        self.root.join(&self.name)
    }

    /// Open a read-mode driver context
    pub fn reader(&self) -> Result<DriverContext> {
        DriverContext::open(self.root.clone(), self.name.clone(), AccessMode::Read)
    }

    /// Open a write-mode driver context
    pub fn writer(&self) -> Result<DriverContext> {
        DriverContext::open(self.root.clone(), self.name.clone(), AccessMode::Write)
    }

    /// Re-sort every shard the range touches; see [`repair::repair_range`]
    pub fn repair(&self, range: &TimeRange) -> Result<RepairReport> {
        repair::repair_range(&self.root, &self.name, range)
    }

    /// Re-sort every shard this device has on disk
    pub fn repair_all(&self) -> Result<RepairReport> {
        self.repair(&TimeRange::all())
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DaybookError, Direction, Row};
    use tempfile::TempDir;

    #[test]
    fn test_device_path() {
        let device = Device::new("/data/db", "garden-shed").unwrap();
        assert_eq!(device.path(), Path::new("/data/db/garden-shed"));
        assert_eq!(device.to_string(), "garden-shed");
    }

    #[test]
    fn test_device_rejects_unsafe_names() {
        assert!(matches!(
            Device::new("/data/db", "a/b"),
            Err(DaybookError::PathResolution(_))
        ));
    }

    #[test]
    fn test_reader_and_writer_modes() {
        let temp_dir = TempDir::new().unwrap();
        let device = Device::new(temp_dir.path(), "dev").unwrap();

        let writer = device.writer().unwrap();
        assert_eq!(writer.mode(), AccessMode::Write);
        writer
            .append(&Row::new("2020-08-01T10:00:00", vec!["1".to_string()]))
            .unwrap();
        writer.close().unwrap();

        let reader = device.reader().unwrap();
        assert_eq!(reader.mode(), AccessMode::Read);
        let rows = reader
            .query(&TimeRange::all(), Direction::Forward)
            .unwrap()
            .count();
        assert_eq!(rows, 1);
    }
}
