//! Per-record CVE feed.
//!
//! Identifiers are enumerated as `(year, sequence)` from the epoch year up to
//! the current year, each year covering sequences `1..=max_sequence`. A 404
//! only means the identifier was never allocated. Successful records are
//! enriched with the content of their references and appended, one JSON
//! object per line, to the file of the day the identifier was reserved.

use chrono::{Datelike, NaiveDate};
use crawler_core::{CveId, Outcome, Partition, StorageFailurePolicy};
use serde::Serialize;
use serde_json::Value;
use url::Url;

use crate::{Archive, FeedPlugin, HttpFetcher, HttpResponse, PersistError, Stored};

pub const CVE_ENDPOINT: &str = "https://cveawg.mitre.org/api/cve/CVE-{year}-{sequence}";
pub const CVE_FIRST_YEAR: i32 = 1999;
pub const CVE_MAX_SEQUENCE: u32 = 59_999;

#[derive(Debug, Clone)]
pub struct CveSettings {
    /// URL template with `{year}` and `{sequence}` placeholders.
    pub endpoint: String,
    pub first_year: i32,
    pub max_sequence: u32,
    pub follow_references: bool,
}

impl Default for CveSettings {
    fn default() -> Self {
        Self {
            endpoint: CVE_ENDPOINT.to_string(),
            first_year: CVE_FIRST_YEAR,
            max_sequence: CVE_MAX_SEQUENCE,
            follow_references: true,
        }
    }
}

/// One CVE record as returned by the API, possibly enriched with references.
#[derive(Debug, Clone, PartialEq)]
pub struct CveRecord {
    pub document: Value,
}

impl CveRecord {
    pub fn date_reserved(&self) -> Option<&str> {
        self.document
            .pointer("/cveMetadata/dateReserved")
            .and_then(Value::as_str)
    }

    pub fn reference_urls(&self) -> Vec<String> {
        self.document
            .pointer("/containers/cna/references")
            .and_then(Value::as_array)
            .map(|refs| {
                refs.iter()
                    .filter_map(|r| r.get("url").and_then(Value::as_str))
                    .map(ToOwned::to_owned)
                    .collect()
            })
            .unwrap_or_default()
    }

    fn attach_references(&mut self, captures: Vec<ReferenceCapture>) {
        if let Value::Object(map) = &mut self.document {
            let value = serde_json::to_value(captures).unwrap_or(Value::Array(Vec::new()));
            map.insert("added_references".to_string(), value);
        }
    }
}

/// What a single reference URL returned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReferenceCapture {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub struct CvePlugin {
    http: HttpFetcher,
    settings: CveSettings,
}

impl CvePlugin {
    pub fn new(http: HttpFetcher, settings: CveSettings) -> Self {
        Self { http, settings }
    }

    pub fn record_url(&self, id: &CveId) -> String {
        self.settings
            .endpoint
            .replace("{year}", &id.year.to_string())
            .replace("{sequence}", &format!("{:04}", id.sequence))
    }

    /// Fetches every reference once, in order. Failures are captured, never raised.
    pub async fn dereference(&self, urls: &[String]) -> Vec<ReferenceCapture> {
        let mut captures = Vec::with_capacity(urls.len());
        for url in urls {
            captures.push(self.capture_reference(url).await);
        }
        captures
    }

    async fn capture_reference(&self, url: &str) -> ReferenceCapture {
        let mut capture = ReferenceCapture {
            url: url.to_string(),
            status: None,
            body: None,
            error: None,
        };
        match Url::parse(url) {
            Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => {}
            Ok(parsed) => {
                capture.error = Some(format!("unsupported scheme {}", parsed.scheme()));
                return capture;
            }
            Err(err) => {
                capture.error = Some(format!("invalid url: {err}"));
                return capture;
            }
        }
        match self.http.get(url).await {
            Ok(response) => {
                capture.status = Some(response.status);
                if (200..300).contains(&response.status) {
                    capture.body = Some(response.text());
                }
            }
            Err(err) => capture.error = Some(err.to_string()),
        }
        capture
    }
}

#[async_trait::async_trait]
impl FeedPlugin for CvePlugin {
    type Unit = CveId;
    type Payload = CveRecord;

    fn name(&self) -> &'static str {
        "cve"
    }

    fn next_unit(&self, after: Option<&CveId>, today: NaiveDate) -> Option<CveId> {
        let last_year = today.year();
        match after {
            None if self.settings.first_year <= last_year => {
                Some(CveId::new(self.settings.first_year, 1))
            }
            None => None,
            Some(id) if id.year < self.settings.first_year => {
                Some(CveId::new(self.settings.first_year, 1))
            }
            Some(id) => id.next_in_range(self.settings.max_sequence, last_year),
        }
    }

    async fn fetch(&self, unit: &CveId) -> Outcome<CveRecord> {
        let url = self.record_url(unit);
        let response = match self.http.get(&url).await {
            Ok(response) => response,
            Err(err) => return Outcome::Transient(err.to_string()),
        };
        let mut outcome = self.classify(unit, response);
        if self.settings.follow_references {
            if let Outcome::Success(record) = &mut outcome {
                let urls = record.reference_urls();
                let captures = self.dereference(&urls).await;
                record.attach_references(captures);
            }
        }
        outcome
    }

    fn classify(&self, unit: &CveId, response: HttpResponse) -> Outcome<CveRecord> {
        match response.status {
            200 => {
                let document: Value = match serde_json::from_slice(&response.bytes) {
                    Ok(document) => document,
                    Err(err) => {
                        return Outcome::Transient(format!("invalid JSON for {unit}: {err}"))
                    }
                };
                let record = CveRecord { document };
                match record.date_reserved().and_then(Partition::from_iso_date) {
                    Some(_) => Outcome::Success(record),
                    None => Outcome::Transient(format!(
                        "{unit} has no usable cveMetadata.dateReserved"
                    )),
                }
            }
            404 => Outcome::NotFound,
            429 => Outcome::RateLimited,
            status => Outcome::Transient(format!("unexpected status {status}")),
        }
    }

    fn partition_key(&self, _unit: &CveId, payload: &CveRecord) -> Option<Partition> {
        payload.date_reserved().and_then(Partition::from_iso_date)
    }

    fn write_payload(
        &self,
        archive: &Archive,
        unit: &CveId,
        payload: CveRecord,
    ) -> Result<Stored, PersistError> {
        let partition = self
            .partition_key(unit, &payload)
            .ok_or_else(|| PersistError::Partition(unit.to_string()))?;
        let line = serde_json::to_string(&payload.document)
            .map_err(|err| PersistError::Encode(err.to_string()))?;
        archive.append_record(partition, &line)
    }

    fn storage_policy(&self) -> StorageFailurePolicy {
        StorageFailurePolicy::SkipUnit
    }
}
