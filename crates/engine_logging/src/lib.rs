#![deny(missing_docs)]
//! Shared logging utilities for the crawler workspace.
//!
//! This crate provides the `feed_*` logging macros, the [`FeedLog`] handle
//! that components receive at construction, and a minimal test initializer
//! for the global logger.

use std::fmt;
use std::sync::Arc;

use log::Level;

/// Logging capability scoped to one feed.
///
/// Every record emitted through a `FeedLog` carries the feed name as its log
/// target, so the output of concurrently running feeds stays distinguishable.
/// The handle is cheap to clone and is handed to each component by the daemon
/// that owns the feed.
#[derive(Debug, Clone)]
pub struct FeedLog {
    target: Arc<str>,
}

impl FeedLog {
    /// Creates a handle that logs under `feed`.
    pub fn new(feed: &str) -> Self {
        Self {
            target: Arc::from(feed),
        }
    }

    /// The log target (feed name) used for every record.
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Emits a pre-formatted record at `level`.
    pub fn emit(&self, level: Level, args: fmt::Arguments<'_>) {
        log::log!(target: self.target(), level, "{}", args);
    }
}

/// Logs an info-level message through a [`FeedLog`].
#[macro_export]
macro_rules! feed_info {
    ($log:expr, $($arg:tt)*) => {{
        $log.emit(log::Level::Info, format_args!($($arg)*));
    }};
}

/// Logs a debug-level message through a [`FeedLog`].
#[macro_export]
macro_rules! feed_debug {
    ($log:expr, $($arg:tt)*) => {{
        $log.emit(log::Level::Debug, format_args!($($arg)*));
    }};
}

/// Logs a warn-level message through a [`FeedLog`].
#[macro_export]
macro_rules! feed_warn {
    ($log:expr, $($arg:tt)*) => {{
        $log.emit(log::Level::Warn, format_args!($($arg)*));
    }};
}

/// Logs an error-level message through a [`FeedLog`].
#[macro_export]
macro_rules! feed_error {
    ($log:expr, $($arg:tt)*) => {{
        $log.emit(log::Level::Error, format_args!($($arg)*));
    }};
}

/// Initializes a simple terminal logger for use in unit tests.
///
/// This safely no-ops if another logger has already been initialized.
pub fn initialize_for_tests() {
    use simplelog::{ColorChoice, CombinedLogger, Config, TermLogger, TerminalMode};

    // Use debug level in debug builds, info in release builds.
    let level = if cfg!(debug_assertions) {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    // Ignore the error if a logger was already set by another test.
    let _ = CombinedLogger::init(vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )]);
}
