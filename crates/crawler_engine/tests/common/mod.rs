#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::NaiveDate;
use crawler_core::{CveId, Outcome, Partition, RetryPolicy, StorageFailurePolicy};
use crawler_engine::{
    Archive, FeedPlugin, FeedStores, FileCursorStore, HttpResponse, MissingUnitLog, PersistError,
    Sleeper, Stored,
};
use engine_logging::FeedLog;
use tokio_util::sync::CancellationToken;

pub const PACING: Duration = Duration::from_millis(1);
pub const BACKOFF: Duration = Duration::from_millis(2);
pub const COOLDOWN: Duration = Duration::from_millis(3);
pub const POLL: Duration = Duration::from_millis(4);

pub fn init_logging() {
    engine_logging::initialize_for_tests();
}

pub fn policy(max_retries: u32) -> RetryPolicy {
    RetryPolicy {
        max_retries,
        request_delay: PACING,
        retry_delay: BACKOFF,
        rate_limit_cooldown: COOLDOWN,
        storage: StorageFailurePolicy::SkipUnit,
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn file_stores<U: crawler_core::WorkUnit>(
    root: &std::path::Path,
    cursor_name: &str,
) -> FeedStores<U> {
    FeedStores {
        archive: Archive::new(root),
        cursor: Box::new(FileCursorStore::new(
            root.join(cursor_name),
            FeedLog::new("test"),
        )),
        missing: MissingUnitLog::new(root.join("missing_units.txt")),
    }
}

/// Records every requested sleep instead of waiting. Optionally cancels a
/// token once the poll interval has been slept `cancel_after` times.
#[derive(Default)]
pub struct RecordingSleeper {
    sleeps: Mutex<Vec<Duration>>,
    cancel: Option<(CancellationToken, usize)>,
}

impl RecordingSleeper {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn cancelling(token: CancellationToken, after_polls: usize) -> Arc<Self> {
        Arc::new(Self {
            sleeps: Mutex::new(Vec::new()),
            cancel: Some((token, after_polls)),
        })
    }

    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().unwrap().clone()
    }

    pub fn count(&self, duration: Duration) -> usize {
        self.sleeps().into_iter().filter(|d| *d == duration).count()
    }
}

#[async_trait::async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        let polls = {
            let mut sleeps = self.sleeps.lock().unwrap();
            sleeps.push(duration);
            sleeps.iter().filter(|d| **d == POLL).count()
        };
        if let Some((token, after)) = &self.cancel {
            if polls >= *after {
                token.cancel();
            }
        }
        tokio::task::yield_now().await;
    }
}

/// Feed over `CVE-2020-0001..=CVE-2020-{ceiling}` answering from a script.
/// Units without a script answer `NotFound`; stored payloads land in the
/// 2020-01-01 partition.
pub struct ScriptedFeed {
    pub ceiling: u32,
    script: Mutex<HashMap<CveId, VecDeque<Outcome<String>>>>,
    requests: Mutex<Vec<CveId>>,
    failing_writes: AtomicUsize,
    storage: StorageFailurePolicy,
}

impl ScriptedFeed {
    pub fn new(ceiling: u32) -> Self {
        Self {
            ceiling,
            script: Mutex::new(HashMap::new()),
            requests: Mutex::new(Vec::new()),
            failing_writes: AtomicUsize::new(0),
            storage: StorageFailurePolicy::SkipUnit,
        }
    }

    pub fn with_storage_policy(mut self, storage: StorageFailurePolicy) -> Self {
        self.storage = storage;
        self
    }

    pub fn failing_writes(self, count: usize) -> Self {
        self.failing_writes.store(count, Ordering::SeqCst);
        self
    }

    pub fn script(self, sequence: u32, outcomes: Vec<Outcome<String>>) -> Self {
        self.script
            .lock()
            .unwrap()
            .insert(CveId::new(2020, sequence), outcomes.into());
        self
    }

    pub fn requests(&self) -> Vec<CveId> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl FeedPlugin for ScriptedFeed {
    type Unit = CveId;
    type Payload = String;

    fn name(&self) -> &'static str {
        "scripted"
    }

    fn next_unit(&self, after: Option<&CveId>, _today: NaiveDate) -> Option<CveId> {
        match after {
            None => Some(CveId::new(2020, 1)),
            Some(id) => id.next_in_range(self.ceiling, 2020),
        }
    }

    async fn fetch(&self, unit: &CveId) -> Outcome<String> {
        self.requests.lock().unwrap().push(*unit);
        self.script
            .lock()
            .unwrap()
            .get_mut(unit)
            .and_then(VecDeque::pop_front)
            .unwrap_or(Outcome::NotFound)
    }

    fn classify(&self, _unit: &CveId, response: HttpResponse) -> Outcome<String> {
        Outcome::Success(response.text())
    }

    fn partition_key(&self, _unit: &CveId, _payload: &String) -> Option<Partition> {
        Partition::from_iso_date("2020-01-01")
    }

    fn write_payload(
        &self,
        archive: &Archive,
        unit: &CveId,
        payload: String,
    ) -> Result<Stored, PersistError> {
        let remaining = self.failing_writes.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failing_writes.store(remaining - 1, Ordering::SeqCst);
            return Err(PersistError::Io(std::io::Error::other("disk full")));
        }
        let partition = self
            .partition_key(unit, &payload)
            .ok_or_else(|| PersistError::Partition(unit.to_string()))?;
        archive.append_record(partition, &payload)
    }

    fn storage_policy(&self) -> StorageFailurePolicy {
        self.storage
    }
}
