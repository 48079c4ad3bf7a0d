#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Write the fetched payload to the archive.
    Store,
    /// Persist the current unit as the cursor.
    SaveCursor,
    /// Append the current unit to the missing-unit log.
    RecordMissing { reason: String },
    Sleep(Pause),
    /// Request the same unit again.
    Retry,
    /// The unit is finished; move on to the next one.
    Resolve(Resolution),
    /// Stop the feed.
    Halt(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pause {
    /// Courtesy delay between two units.
    Pacing,
    /// Delay before retrying after a transient failure.
    Backoff,
    /// Mandatory wait after a rate-limit signal.
    Cooldown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Stored,
    Absent,
    Skipped,
}
