/// In-memory progress for the unit currently being fetched. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UnitState {
    retries: u32,
    rate_limited: u32,
}

impl UnitState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consecutive failures counted against the retry budget.
    pub fn retries(&self) -> u32 {
        self.retries
    }

    /// Rate-limit signals seen for this unit; not part of the retry budget.
    pub fn rate_limited(&self) -> u32 {
        self.rate_limited
    }

    pub(crate) fn record_failure(&mut self) -> u32 {
        self.retries += 1;
        self.retries
    }

    pub(crate) fn record_rate_limit(&mut self) {
        self.rate_limited += 1;
    }

    pub(crate) fn reset(&mut self) {
        self.retries = 0;
    }
}
