use std::sync::Arc;

use crawler_engine::{
    Archive, CvePlugin, CveSettings, Daemon, EpssPlugin, EpssSettings, FeedPlugin, FeedStores,
    FileCursorStore, HttpFetcher, MissingUnitLog, SystemClock, TokioSleeper,
};
use engine_logging::FeedLog;

use crate::config::FeedConfig;

fn feed_stores<U: crawler_core::WorkUnit>(config: &FeedConfig, feed: &str) -> FeedStores<U> {
    FeedStores {
        archive: Archive::new(&config.storage_root),
        cursor: Box::new(FileCursorStore::new(config.cursor_path(), FeedLog::new(feed))),
        missing: MissingUnitLog::new(config.missing_path()),
    }
}

pub fn cve_daemon(config: &FeedConfig) -> anyhow::Result<Daemon<CvePlugin>> {
    let http = HttpFetcher::new(config.http_settings())?;
    let plugin = CvePlugin::new(
        http,
        CveSettings {
            endpoint: config.endpoint.clone(),
            ..CveSettings::default()
        },
    );
    let stores = feed_stores(config, plugin.name());
    Ok(Daemon::new(
        plugin,
        stores,
        config.retry_policy(),
        config.schedule(),
        Arc::new(SystemClock),
        Arc::new(TokioSleeper),
    ))
}

pub fn epss_daemon(config: &FeedConfig) -> anyhow::Result<Daemon<EpssPlugin>> {
    let http = HttpFetcher::new(config.http_settings())?;
    let plugin = EpssPlugin::new(
        http,
        EpssSettings {
            endpoint: config.endpoint.clone(),
            ..EpssSettings::default()
        },
    );
    let stores = feed_stores(config, plugin.name());
    Ok(Daemon::new(
        plugin,
        stores,
        config.retry_policy(),
        config.schedule(),
        Arc::new(SystemClock),
        Arc::new(TokioSleeper),
    ))
}
