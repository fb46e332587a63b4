use serde::{Deserialize, Serialize};
use std::fmt;

/// Canonical video identifiers are exactly 11 characters long.
pub const VIDEO_ID_LEN: usize = 11;

/// Canonical video identifier: exactly 11 characters of `[A-Za-z0-9_-]`.
///
/// This is the dedup key for the whole history: every URL spelling of the
/// same video resolves to the same `VideoId`. Construction validates length
/// and alphabet; tokens of any other length are rejected, never truncated or
/// padded.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VideoId(String);

impl VideoId {
    /// Parse a bare token into a `VideoId`.
    ///
    /// Returns `None` unless the trimmed input is exactly [`VIDEO_ID_LEN`]
    /// characters from the allowed alphabet.
    pub fn parse(token: &str) -> Option<Self> {
        let token = token.trim();
        if token.len() != VIDEO_ID_LEN {
            return None;
        }
        if !token
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
        {
            return None;
        }
        Some(Self(token.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Canonical watch-page URL for this video.
    ///
    /// New history records store this normalized form rather than the raw
    /// pasted string.
    pub fn watch_url(&self) -> String {
        format!("https://www.youtube.com/watch?v={}", self.0)
    }

    /// Embed URL for the distraction-reduced player surface.
    pub fn embed_url(&self, autoplay: bool, controls: bool) -> String {
        format!(
            "https://www.youtube.com/embed/{}?autoplay={}&controls={}",
            self.0, autoplay as u8, controls as u8
        )
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
