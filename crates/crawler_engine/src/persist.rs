use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("directory missing or not creatable: {path:?}: {message}")]
    Directory { path: PathBuf, message: String },
    #[error("record has no usable partition key: {0}")]
    Partition(String),
    #[error("could not encode record: {0}")]
    Encode(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Ensure a directory exists; create it (and its parents) if missing.
/// An existing directory is not an error.
pub fn ensure_dir(dir: &Path) -> Result<(), PersistError> {
    match fs::metadata(dir) {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(PersistError::Directory {
            path: dir.to_path_buf(),
            message: "path is not a directory".into(),
        }),
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            fs::create_dir_all(dir).map_err(|e| PersistError::Directory {
                path: dir.to_path_buf(),
                message: e.to_string(),
            })
        }
        Err(err) => Err(PersistError::Directory {
            path: dir.to_path_buf(),
            message: err.to_string(),
        }),
    }
}

/// Atomically write content to `{dir}/{filename}` by writing a temp file then renaming.
pub struct AtomicFileWriter {
    dir: PathBuf,
}

impl AtomicFileWriter {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn write(&self, filename: &str, content: &[u8]) -> Result<PathBuf, PersistError> {
        ensure_dir(&self.dir)?;

        let target = self.dir.join(filename);
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(content)?;
        tmp.flush()?;
        tmp.as_file_mut().sync_all()?;

        // `persist` replaces an existing target in one rename.
        tmp.persist(&target).map_err(|e| PersistError::Io(e.error))?;
        Ok(target)
    }
}

/// Append one line to `path`, creating the file and its directory if needed.
/// Existing lines are never touched.
pub fn append_line(path: &Path, line: &str) -> Result<u64, PersistError> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    let mut buffer = Vec::with_capacity(line.len() + 1);
    buffer.extend_from_slice(line.trim_end_matches('\n').as_bytes());
    buffer.push(b'\n');
    file.write_all(&buffer)?;
    file.flush()?;
    Ok(buffer.len() as u64)
}
