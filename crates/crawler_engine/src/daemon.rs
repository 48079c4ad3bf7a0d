use std::sync::Arc;
use std::time::Duration;

use crawler_core::RetryPolicy;
use engine_logging::{feed_error, feed_info, FeedLog};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::{Clock, CycleReport, EngineHalt, FeedPlugin, FeedStores, FetchEngine, Sleeper};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DaemonMode {
    /// Full-history pass on a pristine archive, then incremental polling from
    /// a resume point carried in memory.
    BootstrapThenPoll,
    /// Every cycle re-reads the resume point from the cursor and archive.
    ContinuousCatchUp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schedule {
    pub mode: DaemonMode,
    pub poll_interval: Duration,
}

/// Why [`Daemon::run`] returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DaemonExit {
    Cancelled,
    Halted(EngineHalt),
}

/// Outer polling loop for one feed. Owns the feed's engine and its logger.
pub struct Daemon<P: FeedPlugin> {
    engine: FetchEngine<P>,
    schedule: Schedule,
    clock: Arc<dyn Clock>,
    sleeper: Arc<dyn Sleeper>,
    log: FeedLog,
    started: bool,
    carried: Option<P::Unit>,
}

impl<P: FeedPlugin> Daemon<P> {
    pub fn new(
        plugin: P,
        stores: FeedStores<P::Unit>,
        policy: RetryPolicy,
        schedule: Schedule,
        clock: Arc<dyn Clock>,
        sleeper: Arc<dyn Sleeper>,
    ) -> Self {
        let log = FeedLog::new(plugin.name());
        let engine = FetchEngine::new(plugin, stores, policy, sleeper.clone(), log.clone());
        Self {
            engine,
            schedule,
            clock,
            sleeper,
            log,
            started: false,
            carried: None,
        }
    }

    pub fn engine(&self) -> &FetchEngine<P> {
        &self.engine
    }

    /// One pass from the resume point up to today.
    pub async fn run_cycle(&mut self) -> Result<CycleReport<P::Unit>, EngineHalt> {
        let today = self.clock.today();
        match self.schedule.mode {
            DaemonMode::ContinuousCatchUp => {
                let after = self.engine.resume_point();
                self.engine.run_from(after, today).await
            }
            DaemonMode::BootstrapThenPoll => {
                if !self.started {
                    self.started = true;
                    if self.engine.is_pristine() {
                        feed_info!(self.log, "Initialisation of the data population");
                        let report = self.engine.run_from(None, today).await?;
                        self.carried = report.last.clone();
                        feed_info!(self.log, "Initialisation completed");
                        return Ok(report);
                    }
                    self.carried = self.engine.resume_point();
                }
                feed_info!(self.log, "Maintaining...");
                let report = self.engine.run_from(self.carried.clone(), today).await?;
                if report.last > self.carried {
                    self.carried = report.last.clone();
                }
                Ok(report)
            }
        }
    }

    /// Runs cycles separated by the poll interval until `cancel` fires or the
    /// feed halts. Nothing else ends the loop.
    pub async fn run(mut self, cancel: CancellationToken) -> DaemonExit {
        feed_info!(self.log, "Crawler up");
        if let Err(err) = self.engine.archive().ensure_root() {
            feed_error!(
                self.log,
                "Storage root {:?} is not usable yet: {}",
                self.engine.archive().root(),
                err
            );
        }

        loop {
            let cycle = tokio::select! {
                _ = cancel.cancelled() => break,
                cycle = self.run_cycle() => cycle,
            };
            if let Err(halt) = cycle {
                feed_error!(self.log, "Feed stopped: {}", halt);
                return DaemonExit::Halted(halt);
            }

            feed_info!(
                self.log,
                "Going to sleep for {:?} due to normal stand-by mode",
                self.schedule.poll_interval
            );
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = self.sleeper.sleep(self.schedule.poll_interval) => {}
            }
            feed_info!(self.log, "Crawler woke up from stand-by mode");
        }

        feed_info!(self.log, "Crawler shutting down");
        DaemonExit::Cancelled
    }
}
