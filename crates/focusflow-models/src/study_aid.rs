use serde::{Deserialize, Serialize};
use std::fmt;

/// The kinds of AI study aid that can be generated for the active session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StudyAidKind {
    /// A structured study plan built around the video.
    Plan,
    /// A short quiz to check understanding.
    Quiz,
    /// A refined summary of the user's own notes.
    Summary,
}

impl StudyAidKind {
    pub fn label(&self) -> &'static str {
        match self {
            StudyAidKind::Plan => "study plan",
            StudyAidKind::Quiz => "quiz",
            StudyAidKind::Summary => "summary",
        }
    }
}

impl fmt::Display for StudyAidKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serde_lowercase() {
        assert_eq!(serde_json::to_string(&StudyAidKind::Quiz).unwrap(), "\"quiz\"");
        let kind: StudyAidKind = serde_json::from_str("\"plan\"").unwrap();
        assert_eq!(kind, StudyAidKind::Plan);
    }
}
