use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use crawler_engine::DaemonMode;

use crate::config::CrawlerConfig;
use crate::logging::LogDestination;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FeedChoice {
    Cve,
    Epss,
    All,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    /// Full history once on an empty archive, then poll.
    BootstrapThenPoll,
    /// Catch up from the cursor every cycle.
    ContinuousCatchUp,
}

impl From<ModeArg> for DaemonMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::BootstrapThenPoll => DaemonMode::BootstrapThenPoll,
            ModeArg::ContinuousCatchUp => DaemonMode::ContinuousCatchUp,
        }
    }
}

/// Mirrors the CVE record service and the daily EPSS score files into local
/// archives, then keeps them current.
#[derive(Debug, Parser)]
#[command(name = "vulnfeed-crawler", version, about)]
pub struct Args {
    /// RON config file (defaults to ./crawler.ron when present).
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Which feed daemons to run.
    #[arg(long, value_enum, default_value_t = FeedChoice::All)]
    pub feed: FeedChoice,

    /// Archive root for the selected feed.
    #[arg(long)]
    pub storage_root: Option<PathBuf>,

    /// Scheduling mode override for the selected feeds.
    #[arg(long, value_enum)]
    pub mode: Option<ModeArg>,

    #[arg(long, value_enum, default_value_t = LogDestination::Terminal)]
    pub log: LogDestination,

    #[arg(long, default_value = "crawler.log")]
    pub log_file: PathBuf,

    /// Log debug output, including every request and pacing sleep.
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// Applies flag overrides and turns off feeds that were not selected.
    pub fn apply(&self, config: &mut CrawlerConfig) -> anyhow::Result<()> {
        let selected = match self.feed {
            FeedChoice::Cve => {
                config.epss.enabled = false;
                config.cve.enabled = true;
                vec![&mut config.cve]
            }
            FeedChoice::Epss => {
                config.cve.enabled = false;
                config.epss.enabled = true;
                vec![&mut config.epss]
            }
            FeedChoice::All => {
                if self.storage_root.is_some() {
                    anyhow::bail!("--storage-root needs --feed cve or --feed epss");
                }
                vec![&mut config.cve, &mut config.epss]
            }
        };
        for feed in selected {
            if let Some(root) = &self.storage_root {
                feed.storage_root = root.clone();
            }
            if let Some(mode) = self.mode {
                feed.mode = mode.into();
            }
        }
        Ok(())
    }
}
