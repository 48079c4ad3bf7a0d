use std::collections::VecDeque;
use std::sync::Arc;

use chrono::NaiveDate;
use crawler_core::{update, Effect, Msg, Pause, Resolution, RetryPolicy, UnitState, WorkUnit};
use engine_logging::{feed_debug, feed_error, feed_info, feed_warn, FeedLog};

use crate::{Archive, CursorStore, CycleReport, EngineHalt, FeedPlugin, MissingUnitLog, Sleeper};

/// Durable state a feed owns: the archive tree, the cursor and the
/// missing-unit log.
pub struct FeedStores<U: WorkUnit> {
    pub archive: Archive,
    pub cursor: Box<dyn CursorStore<U>>,
    pub missing: MissingUnitLog,
}

/// Drives one feed from a resume point up to "today", one request at a time.
pub struct FetchEngine<P: FeedPlugin> {
    plugin: P,
    stores: FeedStores<P::Unit>,
    policy: RetryPolicy,
    sleeper: Arc<dyn Sleeper>,
    log: FeedLog,
    /// Highest unit ever handed to the cursor store by this engine.
    high_water: Option<P::Unit>,
}

impl<P: FeedPlugin> FetchEngine<P> {
    pub fn new(
        plugin: P,
        stores: FeedStores<P::Unit>,
        policy: RetryPolicy,
        sleeper: Arc<dyn Sleeper>,
        log: FeedLog,
    ) -> Self {
        let mut policy = policy;
        policy.storage = plugin.storage_policy();
        Self {
            plugin,
            stores,
            policy,
            sleeper,
            log,
            high_water: None,
        }
    }

    pub fn plugin(&self) -> &P {
        &self.plugin
    }

    pub fn archive(&self) -> &Archive {
        &self.stores.archive
    }

    /// Where the next pass should continue from: the stored cursor, or the
    /// archive's own contents, whichever is further along.
    pub fn resume_point(&self) -> Option<P::Unit> {
        let stored = self.stores.cursor.load();
        let discovered = self.plugin.discover_last_unit(&self.stores.archive);
        match (&stored, &discovered) {
            (Some(cursor), _) => feed_info!(self.log, "Resuming after {} (cursor)", cursor),
            (None, Some(found)) => feed_info!(self.log, "Resuming after {} (archive)", found),
            (None, None) => feed_info!(self.log, "No previous progress found"),
        }
        stored.max(discovered)
    }

    /// No cursor and no archived data: the feed has never run here.
    pub fn is_pristine(&self) -> bool {
        self.stores.cursor.load().is_none() && self.stores.archive.is_empty()
    }

    /// Resolves every unit after `after` that is available by `today`.
    pub async fn run_from(
        &mut self,
        after: Option<P::Unit>,
        today: NaiveDate,
    ) -> Result<CycleReport<P::Unit>, EngineHalt> {
        let floor = self.stores.cursor.load().max(after.clone());
        if floor > self.high_water {
            self.high_water = floor;
        }
        let feed = self.plugin.name();
        match &after {
            Some(unit) => feed_info!(self.log, "Retrieving {} data after {}", feed, unit),
            None => feed_info!(self.log, "Retrieving {} data from the beginning", feed),
        }

        let mut report = CycleReport::default();
        let mut position = after;
        while let Some(unit) = self.plugin.next_unit(position.as_ref(), today) {
            self.process_unit(&unit, &mut report).await?;
            position = Some(unit);
        }

        feed_info!(
            self.log,
            "Already up to date: {} stored, {} absent, {} skipped, {} retries, {} rate limits",
            report.stored,
            report.absent,
            report.skipped,
            report.retries,
            report.rate_limited
        );
        Ok(report)
    }

    async fn process_unit(
        &mut self,
        unit: &P::Unit,
        report: &mut CycleReport<P::Unit>,
    ) -> Result<Resolution, EngineHalt> {
        let mut state = UnitState::new();
        loop {
            feed_info!(self.log, "Request for {}", unit);
            let (msg, mut payload) = self.plugin.fetch(unit).await.into_parts();
            self.log_response(unit, &msg, report);

            let mut pending = VecDeque::from([msg]);
            let mut retry = false;
            while let Some(msg) = pending.pop_front() {
                let (next, effects) = update(state, msg, &self.policy);
                state = next;
                for effect in effects {
                    match effect {
                        Effect::Store => pending.push_back(self.store(unit, payload.take())),
                        Effect::SaveCursor => self.save_cursor(unit),
                        Effect::RecordMissing { reason } => self.record_missing(unit, &reason),
                        Effect::Sleep(pause) => {
                            if pause == Pause::Backoff {
                                report.retries += 1;
                            }
                            self.pause(pause).await;
                        }
                        Effect::Retry => retry = true,
                        Effect::Resolve(resolution) => {
                            match resolution {
                                Resolution::Stored => report.stored += 1,
                                Resolution::Absent => report.absent += 1,
                                Resolution::Skipped => report.skipped += 1,
                            }
                            report.last = Some(unit.clone());
                            return Ok(resolution);
                        }
                        Effect::Halt(reason) => {
                            feed_error!(self.log, "Stopping at {}: {}", unit, reason);
                            return Err(EngineHalt {
                                unit: unit.to_string(),
                                reason,
                            });
                        }
                    }
                }
            }

            if !retry {
                return Err(EngineHalt {
                    unit: unit.to_string(),
                    reason: "no decision reached for unit".to_string(),
                });
            }
        }
    }

    fn log_response(&self, unit: &P::Unit, msg: &Msg, report: &mut CycleReport<P::Unit>) {
        match msg {
            Msg::Fetched => feed_info!(self.log, "Data obtained for {}", unit),
            Msg::NotFound => feed_info!(self.log, "{} does not exist", unit),
            Msg::RateLimited => {
                report.rate_limited += 1;
                feed_warn!(self.log, "Rate limited while requesting {}", unit);
            }
            Msg::Transient(detail) => {
                feed_error!(self.log, "Request failed for {}: {}", unit, detail)
            }
            Msg::Fatal(detail) => feed_error!(self.log, "Fatal response for {}: {}", unit, detail),
            Msg::Stored | Msg::StoreFailed(_) => {}
        }
    }

    fn store(&self, unit: &P::Unit, payload: Option<P::Payload>) -> Msg {
        let Some(payload) = payload else {
            return Msg::StoreFailed("payload already consumed".to_string());
        };
        match self.plugin.write_payload(&self.stores.archive, unit, payload) {
            Ok(stored) => {
                feed_info!(
                    self.log,
                    "Data saved for {} in {:?} ({} bytes)",
                    unit,
                    stored.path,
                    stored.bytes
                );
                Msg::Stored
            }
            Err(err) => {
                feed_error!(self.log, "Cannot save data for {}: {}", unit, err);
                Msg::StoreFailed(err.to_string())
            }
        }
    }

    fn save_cursor(&mut self, unit: &P::Unit) {
        if self.high_water.as_ref() >= Some(unit) {
            feed_debug!(self.log, "Cursor already past {}, not saving", unit);
            return;
        }
        match self.stores.cursor.save(unit) {
            Ok(()) => self.high_water = Some(unit.clone()),
            Err(err) => feed_error!(self.log, "Failed to save cursor at {}: {}", unit, err),
        }
    }

    fn record_missing(&self, unit: &P::Unit, reason: &str) {
        feed_error!(self.log, "Skipping {}: {}", unit, reason);
        match self.stores.missing.record(&unit.to_string()) {
            Ok(()) => feed_info!(
                self.log,
                "Missing unit {} saved into {:?}",
                unit,
                self.stores.missing.path()
            ),
            Err(err) => feed_error!(self.log, "Failed to record missing unit {}: {}", unit, err),
        }
    }

    async fn pause(&self, pause: Pause) {
        let duration = self.policy.duration_of(pause);
        match pause {
            Pause::Pacing => {
                feed_info!(self.log, "Going to sleep for {:?} before the next request", duration)
            }
            Pause::Backoff => {
                feed_warn!(self.log, "Going to sleep for {:?} before retrying", duration)
            }
            Pause::Cooldown => {
                feed_warn!(self.log, "Going to sleep for {:?} due to too many requests", duration)
            }
        }
        self.sleeper.sleep(duration).await;
    }
}

impl<P: FeedPlugin> std::fmt::Debug for FetchEngine<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchEngine")
            .field("feed", &self.plugin.name())
            .field("archive", &self.stores.archive.root())
            .field("high_water", &self.high_water.as_ref().map(WorkUnit::to_cursor))
            .finish()
    }
}
