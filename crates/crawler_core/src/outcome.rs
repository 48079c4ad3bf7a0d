use crate::Msg;

/// Classified result of one network request for a work unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<P> {
    /// The unit exists; the payload is the full response.
    Success(P),
    /// The identifier is not (yet) allocated.
    NotFound,
    /// The server asked us to slow down.
    RateLimited,
    /// Network failure, timeout or an unexpected status.
    Transient(String),
    /// Nothing sensible can be done for this feed any more.
    Fatal(String),
}

impl<P> Outcome<P> {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, Outcome::RateLimited | Outcome::Transient(_))
    }

    /// Splits the outcome into the state-machine message and the payload,
    /// which stays with the caller until a `Store` effect asks for it.
    pub fn into_parts(self) -> (Msg, Option<P>) {
        match self {
            Outcome::Success(payload) => (Msg::Fetched, Some(payload)),
            Outcome::NotFound => (Msg::NotFound, None),
            Outcome::RateLimited => (Msg::RateLimited, None),
            Outcome::Transient(detail) => (Msg::Transient(detail), None),
            Outcome::Fatal(detail) => (Msg::Fatal(detail), None),
        }
    }

    pub fn map<Q>(self, f: impl FnOnce(P) -> Q) -> Outcome<Q> {
        match self {
            Outcome::Success(payload) => Outcome::Success(f(payload)),
            Outcome::NotFound => Outcome::NotFound,
            Outcome::RateLimited => Outcome::RateLimited,
            Outcome::Transient(detail) => Outcome::Transient(detail),
            Outcome::Fatal(detail) => Outcome::Fatal(detail),
        }
    }
}
