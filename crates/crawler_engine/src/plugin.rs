use chrono::NaiveDate;
use crawler_core::{Outcome, Partition, StorageFailurePolicy, WorkUnit};

use crate::{Archive, HttpResponse, PersistError, Stored};

/// Everything that differs between feeds. The engine drives the shared
/// fetch/retry/cursor loop and calls back into the plugin for the rest.
#[async_trait::async_trait]
pub trait FeedPlugin: Send + Sync {
    type Unit: WorkUnit;
    type Payload: Send;

    /// Short feed name, used as the log target.
    fn name(&self) -> &'static str;

    /// Unit to fetch after `after` (or the feed's first unit when `None`),
    /// or `None` once the range that is available by `today` is exhausted.
    fn next_unit(&self, after: Option<&Self::Unit>, today: NaiveDate) -> Option<Self::Unit>;

    /// One request (plus any best-effort follow-ups) for `unit`.
    async fn fetch(&self, unit: &Self::Unit) -> Outcome<Self::Payload>;

    /// Maps a raw response to an outcome.
    fn classify(&self, unit: &Self::Unit, response: HttpResponse) -> Outcome<Self::Payload>;

    /// Archive partition a payload belongs to.
    fn partition_key(&self, unit: &Self::Unit, payload: &Self::Payload) -> Option<Partition>;

    fn write_payload(
        &self,
        archive: &Archive,
        unit: &Self::Unit,
        payload: Self::Payload,
    ) -> Result<Stored, PersistError>;

    fn storage_policy(&self) -> StorageFailurePolicy;

    /// Progress recoverable from the archive alone, for feeds whose file
    /// names encode their unit.
    fn discover_last_unit(&self, _archive: &Archive) -> Option<Self::Unit> {
        None
    }
}
