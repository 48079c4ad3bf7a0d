//! Crawler engine: HTTP, archive I/O, feed plugins and the fetch/daemon loops.
mod archive;
mod clock;
mod cursor;
mod cve;
mod daemon;
mod engine;
mod epss;
mod fetch;
mod missing;
mod persist;
mod plugin;
mod types;

pub use archive::Archive;
pub use clock::{Clock, FixedClock, Sleeper, SystemClock, TokioSleeper};
pub use cursor::{CursorStore, FileCursorStore};
pub use cve::{
    CvePlugin, CveRecord, CveSettings, ReferenceCapture, CVE_ENDPOINT, CVE_FIRST_YEAR,
    CVE_MAX_SEQUENCE,
};
pub use daemon::{Daemon, DaemonExit, DaemonMode, Schedule};
pub use engine::{FeedStores, FetchEngine};
pub use epss::{epss_first_date, EpssPlugin, EpssSettings, EPSS_ENDPOINT, EPSS_EXTENSION};
pub use fetch::{HttpFetcher, HttpSettings};
pub use missing::MissingUnitLog;
pub use persist::{append_line, ensure_dir, AtomicFileWriter, PersistError};
pub use plugin::FeedPlugin;
pub use types::{CycleReport, EngineHalt, FailureKind, FetchError, HttpResponse, Stored};
