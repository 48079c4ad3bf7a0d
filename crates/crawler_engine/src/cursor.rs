use std::fs;
use std::io;
use std::marker::PhantomData;
use std::path::PathBuf;

use crawler_core::WorkUnit;
use engine_logging::{feed_warn, FeedLog};

use crate::persist::{AtomicFileWriter, PersistError};

/// Durable "how far we have gotten" for one feed.
pub trait CursorStore<U: WorkUnit>: Send + Sync {
    /// Last processed unit, or `None` when nothing usable is stored.
    fn load(&self) -> Option<U>;

    /// Replaces the stored value with `unit`.
    fn save(&self, unit: &U) -> Result<(), PersistError>;
}

/// Cursor kept as a single line of plain text, overwritten atomically.
#[derive(Debug, Clone)]
pub struct FileCursorStore<U> {
    path: PathBuf,
    log: FeedLog,
    _unit: PhantomData<fn() -> U>,
}

impl<U> FileCursorStore<U> {
    pub fn new(path: impl Into<PathBuf>, log: FeedLog) -> Self {
        Self {
            path: path.into(),
            log,
            _unit: PhantomData,
        }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

impl<U: WorkUnit> CursorStore<U> for FileCursorStore<U> {
    fn load(&self) -> Option<U> {
        let content = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return None,
            Err(err) => {
                feed_warn!(self.log, "Failed to read cursor from {:?}: {}", self.path, err);
                return None;
            }
        };
        let unit = U::from_cursor(&content);
        if unit.is_none() {
            feed_warn!(
                self.log,
                "Ignoring unparsable cursor {:?} in {:?}",
                content.trim(),
                self.path
            );
        }
        unit
    }

    fn save(&self, unit: &U) -> Result<(), PersistError> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let filename = self
            .path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| PersistError::Directory {
                path: self.path.clone(),
                message: "cursor path has no file name".into(),
            })?;
        AtomicFileWriter::new(dir).write(&filename, unit.to_cursor().as_bytes())?;
        Ok(())
    }
}
