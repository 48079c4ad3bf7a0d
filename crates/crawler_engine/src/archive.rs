use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use crawler_core::{blob_file_name, parse_blob_name, record_path, Partition};

use crate::persist::{append_line, ensure_dir, AtomicFileWriter, PersistError};
use crate::Stored;

/// Date-partitioned file tree owned by a single feed: `root/YYYY/MM/<file>`.
#[derive(Debug, Clone)]
pub struct Archive {
    root: PathBuf,
}

impl Archive {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn ensure_root(&self) -> Result<(), PersistError> {
        ensure_dir(&self.root)
    }

    /// Appends one JSON line to the per-day file of `partition`.
    pub fn append_record(&self, partition: Partition, line: &str) -> Result<Stored, PersistError> {
        let path = record_path(&self.root, partition);
        let bytes = append_line(&path, line)?;
        Ok(Stored { path, bytes })
    }

    /// Writes (or replaces) the blob for `date`.
    pub fn write_blob(
        &self,
        date: NaiveDate,
        ext: &str,
        content: &[u8],
    ) -> Result<Stored, PersistError> {
        let dir = Partition::from_date(date).directory(&self.root);
        let writer = AtomicFileWriter::new(dir);
        let path = writer.write(&blob_file_name(date, ext), content)?;
        Ok(Stored {
            path,
            bytes: content.len() as u64,
        })
    }

    /// Latest date with a blob in the archive. Unreadable directories and
    /// foreign file names are ignored.
    pub fn discover_last_date(&self, ext: &str) -> Option<NaiveDate> {
        let mut highest: Option<NaiveDate> = None;
        for year_dir in subdirectories(&self.root) {
            for month_dir in subdirectories(&year_dir) {
                let Ok(entries) = fs::read_dir(&month_dir) else {
                    continue;
                };
                for entry in entries.filter_map(|e| e.ok()) {
                    let is_file = entry.file_type().map(|ft| ft.is_file()).unwrap_or(false);
                    if !is_file {
                        continue;
                    }
                    let name = entry.file_name();
                    if let Some(date) = parse_blob_name(&name.to_string_lossy(), ext) {
                        highest = highest.max(Some(date));
                    }
                }
            }
        }
        highest
    }

    /// True when the archive holds no partition directories yet. Hidden
    /// entries and plain files (cursor, missing log) do not count.
    pub fn is_empty(&self) -> bool {
        subdirectories(&self.root).is_empty()
    }
}

fn subdirectories(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut dirs: Vec<PathBuf> = entries
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().map(|ft| ft.is_dir()).unwrap_or(false))
        .filter(|e| !e.file_name().to_string_lossy().starts_with('.'))
        .map(|e| e.path())
        .collect();
    dirs.sort();
    dirs
}
