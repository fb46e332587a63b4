use chrono::serde::ts_milliseconds;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One persisted entry in the watch history.
///
/// The serialized field names (`id`, `url`, `lastPlayed` as epoch millis,
/// `progress`, `duration`, `completed`, `notes`) are the wire shape shared by
/// durable storage, file export, and file import, so an exported file can be
/// re-imported losslessly.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionRecord {
    /// Opaque unique identifier, assigned at creation and stable for the
    /// record's lifetime.
    pub id: String,
    /// The link as stored for this record. Not the dedup key: canonical
    /// identity is re-derived from this string whenever records are compared.
    pub url: String,
    pub title: String,
    #[serde(rename = "lastPlayed", with = "ts_milliseconds")]
    pub last_played: DateTime<Utc>,
    /// Advisory watch position in seconds.
    pub progress: f64,
    /// Advisory total duration in seconds.
    pub duration: f64,
    pub completed: bool,
    pub notes: String,
}

impl SessionRecord {
    pub fn new(id: String, url: String, title: String, last_played: DateTime<Utc>) -> Self {
        Self {
            id,
            url,
            title,
            last_played,
            progress: 0.0,
            duration: 0.0,
            completed: false,
            notes: String::new(),
        }
    }

    /// Structural validity check used when accepting external data (import).
    ///
    /// `progress` and `duration` must be finite and non-negative, and the
    /// record id must be present.
    pub fn is_well_formed(&self) -> bool {
        !self.id.is_empty()
            && self.progress.is_finite()
            && self.progress >= 0.0
            && self.duration.is_finite()
            && self.duration >= 0.0
    }
}
