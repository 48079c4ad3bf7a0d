use chrono::NaiveDate;
use crawler_core::{Outcome, Partition, StorageFailurePolicy};

use crate::{Archive, FeedPlugin, HttpFetcher, HttpResponse, PersistError, Stored};

pub const EPSS_ENDPOINT: &str = "https://epss.cyentia.com/epss_scores-{date}.csv.gz";
pub const EPSS_EXTENSION: &str = "csv.gz";

/// First day the score feed was published.
pub fn epss_first_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2021, 4, 14).unwrap_or(NaiveDate::MIN)
}

#[derive(Debug, Clone)]
pub struct EpssSettings {
    /// URL template with a `{date}` placeholder (`YYYY-MM-DD`).
    pub endpoint: String,
    pub first_date: NaiveDate,
    pub extension: String,
}

impl Default for EpssSettings {
    fn default() -> Self {
        Self {
            endpoint: EPSS_ENDPOINT.to_string(),
            first_date: epss_first_date(),
            extension: EPSS_EXTENSION.to_string(),
        }
    }
}

/// Daily bulk score files, one compressed blob per calendar day.
///
/// Days are fetched up to but excluding today, since the current day's file
/// is usually not published yet. Every non-200 answer goes through the
/// retry budget; there is no "not allocated" case for a past date.
pub struct EpssPlugin {
    http: HttpFetcher,
    settings: EpssSettings,
}

impl EpssPlugin {
    pub fn new(http: HttpFetcher, settings: EpssSettings) -> Self {
        Self { http, settings }
    }

    pub fn day_url(&self, date: &NaiveDate) -> String {
        self.settings
            .endpoint
            .replace("{date}", &date.format("%Y-%m-%d").to_string())
    }
}

#[async_trait::async_trait]
impl FeedPlugin for EpssPlugin {
    type Unit = NaiveDate;
    type Payload = Vec<u8>;

    fn name(&self) -> &'static str {
        "epss"
    }

    fn next_unit(&self, after: Option<&NaiveDate>, today: NaiveDate) -> Option<NaiveDate> {
        let candidate = match after {
            Some(date) => date.succ_opt()?.max(self.settings.first_date),
            None => self.settings.first_date,
        };
        (candidate < today).then_some(candidate)
    }

    async fn fetch(&self, unit: &NaiveDate) -> Outcome<Vec<u8>> {
        match self.http.get(&self.day_url(unit)).await {
            Ok(response) => self.classify(unit, response),
            Err(err) => Outcome::Transient(err.to_string()),
        }
    }

    fn classify(&self, _unit: &NaiveDate, response: HttpResponse) -> Outcome<Vec<u8>> {
        match response.status {
            200 => Outcome::Success(response.bytes),
            status => Outcome::Transient(format!("status code={status}")),
        }
    }

    fn partition_key(&self, unit: &NaiveDate, _payload: &Vec<u8>) -> Option<Partition> {
        Some(Partition::from_date(*unit))
    }

    fn write_payload(
        &self,
        archive: &Archive,
        unit: &NaiveDate,
        payload: Vec<u8>,
    ) -> Result<Stored, PersistError> {
        archive.write_blob(*unit, &self.settings.extension, &payload)
    }

    fn storage_policy(&self) -> StorageFailurePolicy {
        StorageFailurePolicy::RetryUnit
    }

    fn discover_last_unit(&self, archive: &Archive) -> Option<NaiveDate> {
        archive.discover_last_date(&self.settings.extension)
    }
}
