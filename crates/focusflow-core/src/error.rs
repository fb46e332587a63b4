use thiserror::Error;

/// Typed failures of the history engine.
///
/// Persistence failures are deliberately absent: durable reads/writes are
/// logged and tolerated (the in-memory collection stays usable) rather than
/// surfaced to the caller.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The input string contains no recognizable canonical video identifier.
    #[error("not a recognizable video link")]
    InvalidLink,

    /// Import or hydrate received data that is not a well-formed history
    /// array. The prior collection is left untouched.
    #[error("malformed history data: {0}")]
    MalformedHistory(String),

    /// A record id that is not present in the collection.
    #[error("no history record with id {0}")]
    RecordNotFound(String),

    /// The external study-aid generation failed or was unavailable.
    #[error("study aid generation failed: {0}")]
    Enrichment(String),
}
