mod cli;
mod config;
mod feeds;
mod logging;
mod shutdown;

use std::process::ExitCode;

use clap::Parser;
use crawler_engine::DaemonExit;
use log::{error, info, warn, LevelFilter};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::cli::Args;
use crate::config::CrawlerConfig;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let level = if args.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    logging::initialize(args.log, level, &args.log_file);

    match run(args).await {
        Ok(code) => code,
        Err(err) => {
            error!("{:#}", err);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> anyhow::Result<ExitCode> {
    let mut config = CrawlerConfig::load(args.config.as_deref())?;
    args.apply(&mut config)?;

    let cancel = CancellationToken::new();
    shutdown::listen(cancel.clone());

    let mut daemons = JoinSet::new();
    if config.cve.enabled {
        let daemon = feeds::cve_daemon(&config.cve)?;
        daemons.spawn(daemon.run(cancel.clone()));
    }
    if config.epss.enabled {
        let daemon = feeds::epss_daemon(&config.epss)?;
        daemons.spawn(daemon.run(cancel.clone()));
    }
    if daemons.is_empty() {
        warn!("No feed enabled, nothing to do");
        return Ok(ExitCode::SUCCESS);
    }

    let mut halted = false;
    while let Some(joined) = daemons.join_next().await {
        match joined {
            Ok(DaemonExit::Cancelled) => info!("Feed daemon stopped"),
            Ok(DaemonExit::Halted(halt)) => {
                error!("Feed daemon halted: {}", halt);
                halted = true;
            }
            Err(err) => {
                error!("Feed daemon task failed: {}", err);
                halted = true;
            }
        }
    }

    Ok(if halted {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}
