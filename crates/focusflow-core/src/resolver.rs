use focusflow_models::VideoId;
use regex::Regex;
use std::sync::LazyLock;

// Matches the 11-character id after the known URL shapes: watch?v= (any
// query position), /embed/, /v/, /e/, /shorts/, /live/, and youtu.be/<id>.
// The trailing alternation rejects tokens longer than 11 characters instead
// of silently truncating them.
static URL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?:youtube\.com/(?:(?:v|e|embed|shorts|live)/|.*[?&]v=)|youtu\.be/)([A-Za-z0-9_-]{11})(?:[^A-Za-z0-9_-]|$)",
    )
    .expect("video URL pattern compiles")
});

/// Derive the canonical video identity from an arbitrary user-supplied
/// string.
///
/// Pure and deterministic: this is called both for fresh user input and to
/// re-derive identity from stored record URLs during dedup comparisons.
/// Structured URL patterns take precedence; a bare 11-character token is only
/// accepted when the whole trimmed input is the token itself. Empty input
/// resolves to `None` without error.
pub fn resolve(input: &str) -> Option<VideoId> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }
    if let Some(caps) = URL_PATTERN.captures(input) {
        return caps.get(1).and_then(|m| VideoId::parse(m.as_str()));
    }
    VideoId::parse(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ID: &str = "dQw4w9WgXcQ";

    fn resolved(input: &str) -> Option<String> {
        resolve(input).map(|id| id.as_str().to_string())
    }

    #[test]
    fn test_watch_url() {
        assert_eq!(resolved("https://www.youtube.com/watch?v=dQw4w9WgXcQ").as_deref(), Some(ID));
    }

    #[test]
    fn test_watch_url_with_extra_params() {
        assert_eq!(
            resolved("https://www.youtube.com/watch?v=dQw4w9WgXcQ&list=x&t=42").as_deref(),
            Some(ID)
        );
        assert_eq!(
            resolved("https://www.youtube.com/watch?app=desktop&v=dQw4w9WgXcQ").as_deref(),
            Some(ID)
        );
    }

    #[test]
    fn test_short_domain() {
        assert_eq!(resolved("https://youtu.be/dQw4w9WgXcQ").as_deref(), Some(ID));
        assert_eq!(resolved("https://youtu.be/dQw4w9WgXcQ?t=30").as_deref(), Some(ID));
    }

    #[test]
    fn test_embed_and_path_shapes() {
        assert_eq!(resolved("https://www.youtube.com/embed/dQw4w9WgXcQ").as_deref(), Some(ID));
        assert_eq!(resolved("https://www.youtube.com/v/dQw4w9WgXcQ").as_deref(), Some(ID));
        assert_eq!(resolved("https://www.youtube.com/e/dQw4w9WgXcQ").as_deref(), Some(ID));
        assert_eq!(resolved("https://www.youtube.com/shorts/dQw4w9WgXcQ").as_deref(), Some(ID));
        assert_eq!(resolved("https://www.youtube.com/live/dQw4w9WgXcQ").as_deref(), Some(ID));
    }

    #[test]
    fn test_embed_with_query() {
        assert_eq!(
            resolved("https://www.youtube.com/embed/dQw4w9WgXcQ?autoplay=0&controls=1").as_deref(),
            Some(ID)
        );
    }

    #[test]
    fn test_bare_token() {
        assert_eq!(resolved("dQw4w9WgXcQ").as_deref(), Some(ID));
        assert_eq!(resolved("  dQw4w9WgXcQ  ").as_deref(), Some(ID));
    }

    #[test]
    fn test_bare_token_wrong_length_fails() {
        assert!(resolve("dQw4w9WgXc").is_none()); // 10 chars
        assert!(resolve("dQw4w9WgXcQQ").is_none()); // 12 chars
    }

    #[test]
    fn test_overlong_token_in_url_is_rejected_not_truncated() {
        assert!(resolve("https://youtu.be/dQw4w9WgXcQQ").is_none());
        assert!(resolve("https://www.youtube.com/watch?v=dQw4w9WgXcQQ").is_none());
    }

    #[test]
    fn test_structured_pattern_takes_precedence() {
        // The path segment also happens to be 11 chars, but the v= parameter
        // names the video.
        assert_eq!(
            resolved("https://www.youtube.com/watch?v=dQw4w9WgXcQ#aaaaaaaaaaa").as_deref(),
            Some(ID)
        );
    }

    #[test]
    fn test_empty_and_garbage_input() {
        assert!(resolve("").is_none());
        assert!(resolve("   ").is_none());
        assert!(resolve("not a url at all").is_none());
        assert!(resolve("https://example.com/watch?v=dQw4w9WgXcQ-but-not-youtube").is_none());
    }

    #[test]
    fn test_deterministic() {
        for _ in 0..3 {
            assert_eq!(resolved("https://youtu.be/dQw4w9WgXcQ").as_deref(), Some(ID));
        }
    }
}
