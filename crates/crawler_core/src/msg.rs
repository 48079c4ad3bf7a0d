#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// The request succeeded; the payload is waiting to be stored.
    Fetched,
    /// The unit does not exist upstream.
    NotFound,
    /// The server signalled overload.
    RateLimited,
    /// Network error, timeout or unexpected status.
    Transient(String),
    /// Unrecoverable condition for this feed.
    Fatal(String),
    /// The payload reached the archive.
    Stored,
    /// Writing the payload to the archive failed.
    StoreFailed(String),
}
