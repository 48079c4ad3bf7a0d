//! Crawler configuration: built-in per-feed defaults, overlaid by an optional
//! RON file, overlaid by command-line flags.
//!
//! ```ron
//! (
//!     cve: (storage_root: "/srv/cve", request_delay_secs: 2),
//!     epss: (mode: continuous_catch_up, max_retries: 5),
//! )
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crawler_core::RetryPolicy;
use crawler_engine::{DaemonMode, HttpSettings, Schedule, CVE_ENDPOINT, EPSS_ENDPOINT};
use ron::extensions::Extensions;
use serde::Deserialize;
use thiserror::Error;

pub const DEFAULT_CONFIG_FILE: &str = "crawler.ron";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid config file {path:?}: {message}")]
    Parse { path: PathBuf, message: String },
}

/// Fully resolved settings for one feed.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedConfig {
    pub enabled: bool,
    pub storage_root: PathBuf,
    pub endpoint: String,
    pub mode: DaemonMode,
    pub request_timeout: Duration,
    pub request_delay: Duration,
    pub retry_delay: Duration,
    pub poll_interval: Duration,
    pub rate_limit_cooldown: Duration,
    pub max_retries: u32,
    pub max_bytes: u64,
    pub cursor_file: &'static str,
    pub missing_file: &'static str,
}

impl FeedConfig {
    pub fn cve() -> Self {
        Self {
            enabled: true,
            storage_root: PathBuf::from("data/cve"),
            endpoint: CVE_ENDPOINT.to_string(),
            mode: DaemonMode::ContinuousCatchUp,
            request_timeout: Duration::from_secs(60),
            request_delay: Duration::from_secs(1),
            retry_delay: Duration::from_secs(1),
            poll_interval: Duration::from_secs(3600),
            rate_limit_cooldown: Duration::from_secs(60),
            max_retries: 9,
            max_bytes: 64 * 1024 * 1024,
            cursor_file: ".last_cve.txt",
            missing_file: "missing_units.txt",
        }
    }

    pub fn epss() -> Self {
        Self {
            enabled: true,
            storage_root: PathBuf::from("data/epss"),
            endpoint: EPSS_ENDPOINT.to_string(),
            mode: DaemonMode::BootstrapThenPoll,
            request_timeout: Duration::from_secs(60),
            request_delay: Duration::from_secs(6),
            retry_delay: Duration::from_secs(300),
            poll_interval: Duration::from_secs(86_400),
            rate_limit_cooldown: Duration::from_secs(300),
            max_retries: 9,
            max_bytes: 256 * 1024 * 1024,
            cursor_file: ".last_epss.txt",
            missing_file: "missing_dates.txt",
        }
    }

    pub fn cursor_path(&self) -> PathBuf {
        self.storage_root.join(self.cursor_file)
    }

    pub fn missing_path(&self) -> PathBuf {
        self.storage_root.join(self.missing_file)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            request_delay: self.request_delay,
            retry_delay: self.retry_delay,
            rate_limit_cooldown: self.rate_limit_cooldown,
            ..RetryPolicy::default()
        }
    }

    pub fn http_settings(&self) -> HttpSettings {
        HttpSettings {
            request_timeout: self.request_timeout,
            max_bytes: self.max_bytes,
            ..HttpSettings::default()
        }
    }

    pub fn schedule(&self) -> Schedule {
        Schedule {
            mode: self.mode,
            poll_interval: self.poll_interval,
        }
    }

    fn apply(&mut self, section: &FeedSection) {
        let secs = Duration::from_secs;
        if let Some(enabled) = section.enabled {
            self.enabled = enabled;
        }
        if let Some(root) = &section.storage_root {
            self.storage_root = root.clone();
        }
        if let Some(endpoint) = &section.endpoint {
            self.endpoint = endpoint.clone();
        }
        if let Some(mode) = section.mode {
            self.mode = mode;
        }
        if let Some(v) = section.request_timeout_secs {
            self.request_timeout = secs(v);
        }
        if let Some(v) = section.request_delay_secs {
            self.request_delay = secs(v);
        }
        if let Some(v) = section.retry_delay_secs {
            self.retry_delay = secs(v);
        }
        if let Some(v) = section.poll_interval_secs {
            self.poll_interval = secs(v);
        }
        if let Some(v) = section.rate_limit_cooldown_secs {
            self.rate_limit_cooldown = secs(v);
        }
        if let Some(v) = section.max_retries {
            self.max_retries = v;
        }
        if let Some(v) = section.max_bytes {
            self.max_bytes = v;
        }
    }
}

/// One feed's block in the config file; absent keys keep the defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FeedSection {
    enabled: Option<bool>,
    storage_root: Option<PathBuf>,
    endpoint: Option<String>,
    mode: Option<DaemonMode>,
    request_timeout_secs: Option<u64>,
    request_delay_secs: Option<u64>,
    retry_delay_secs: Option<u64>,
    poll_interval_secs: Option<u64>,
    rate_limit_cooldown_secs: Option<u64>,
    max_retries: Option<u32>,
    max_bytes: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ConfigFile {
    cve: FeedSection,
    epss: FeedSection,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CrawlerConfig {
    pub cve: FeedConfig,
    pub epss: FeedConfig,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            cve: FeedConfig::cve(),
            epss: FeedConfig::epss(),
        }
    }
}

impl CrawlerConfig {
    /// Loads `path`, or `crawler.ron` in the working directory when no path is
    /// given. Only an explicitly requested file has to exist.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let (path, required) = match path {
            Some(path) => (path.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
        };
        match fs::read_to_string(&path) {
            Ok(text) => Self::from_ron(&text, &path),
            Err(err) if err.kind() == io::ErrorKind::NotFound && !required => Ok(Self::default()),
            Err(source) => Err(ConfigError::Read { path, source }),
        }
    }

    pub fn from_ron(text: &str, origin: &Path) -> Result<Self, ConfigError> {
        let file: ConfigFile = ron::Options::default()
            .with_default_extension(Extensions::IMPLICIT_SOME)
            .from_str(text)
            .map_err(|err| ConfigError::Parse {
                path: origin.to_path_buf(),
                message: err.to_string(),
            })?;
        let mut config = Self::default();
        config.cve.apply(&file.cve);
        config.epss.apply(&file.epss);
        Ok(config)
    }
}
