use focusflow_models::StudyAidKind;

use crate::traits::StudyAidRequest;

pub(crate) const SYSTEM_INSTRUCTION: &str = "You are a study assistant helping a learner get \
the most out of a video they are watching. Be concrete and concise, and answer in plain text.";

/// Build the user prompt for one study-aid request from the active session's
/// title and notes.
pub fn build_prompt(request: &StudyAidRequest) -> String {
    let notes_context = if request.notes.trim().is_empty() {
        "The learner has not taken any notes yet.".to_string()
    } else {
        format!("The learner's notes so far:\n{}", request.notes.trim())
    };

    match request.kind {
        StudyAidKind::Plan => format!(
            "Create a short study plan for working through the video \"{}\". \
List the steps in order, with a suggested focus for each step.\n\n{}",
            request.title, notes_context
        ),
        StudyAidKind::Quiz => format!(
            "Write a quiz of five questions to check understanding of the video \"{}\". \
Put the answers after the questions.\n\n{}",
            request.title, notes_context
        ),
        StudyAidKind::Summary => format!(
            "Refine the learner's notes on the video \"{}\" into a clear, well-structured \
summary. Keep every fact from the notes and fill obvious gaps.\n\n{}",
            request.title, notes_context
        ),
    }
}
