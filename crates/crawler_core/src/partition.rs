//! Deterministic mapping from records to locations in the year/month archive.
//!
//! Everything here is pure: the same logical record always resolves to the
//! same path, which is what makes re-writing a unit safe.

use std::path::{Path, PathBuf};

use chrono::{Datelike, NaiveDate};

/// Year/month/day key a record is filed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Partition {
    pub year: i32,
    pub month: u32,
    pub day: u32,
}

impl Partition {
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
            day: date.day(),
        }
    }

    /// Parses the date part of an ISO-8601 timestamp such as
    /// `2023-07-15T00:00:00` or `2023-07-15T10:12:44.123Z`.
    pub fn from_iso_date(text: &str) -> Option<Self> {
        let date_part = text.trim().get(..10)?;
        NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
            .ok()
            .map(Self::from_date)
    }

    /// `root/YYYY/MM`
    pub fn directory(&self, root: &Path) -> PathBuf {
        root.join(format!("{:04}", self.year))
            .join(format!("{:02}", self.month))
    }
}

/// Per-day JSON-lines file: `root/YYYY/MM/YYYY_MM_DD.jsonl`.
pub fn record_path(root: &Path, partition: Partition) -> PathBuf {
    partition.directory(root).join(format!(
        "{:04}_{:02}_{:02}.jsonl",
        partition.year, partition.month, partition.day
    ))
}

/// Per-day blob: `root/YYYY/MM/YYYY-MM-DD.{ext}`.
pub fn blob_path(root: &Path, date: NaiveDate, ext: &str) -> PathBuf {
    Partition::from_date(date)
        .directory(root)
        .join(blob_file_name(date, ext))
}

pub fn blob_file_name(date: NaiveDate, ext: &str) -> String {
    format!("{}.{ext}", date.format("%Y-%m-%d"))
}

/// Inverse of [`blob_file_name`]; `None` for names that are not ours.
pub fn parse_blob_name(name: &str, ext: &str) -> Option<NaiveDate> {
    let stem = name.strip_suffix(ext)?.strip_suffix('.')?;
    NaiveDate::parse_from_str(stem, "%Y-%m-%d").ok()
}
