use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::persist::{append_line, PersistError};

/// Append-only list of units that were given up on, one identifier per line.
#[derive(Debug, Clone)]
pub struct MissingUnitLog {
    path: PathBuf,
}

impl MissingUnitLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn record(&self, identifier: &str) -> Result<(), PersistError> {
        append_line(&self.path, identifier)?;
        Ok(())
    }

    pub fn entries(&self) -> Result<Vec<String>, PersistError> {
        match fs::read_to_string(&self.path) {
            Ok(text) => Ok(text
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(ToOwned::to_owned)
                .collect()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(err) => Err(err.into()),
        }
    }
}
