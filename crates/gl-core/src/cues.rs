//! Literal phrases that couple prompt wording to control flow.

/// Marker the evaluator is asked to emit when the student is ready to move on
/// from an open question-and-answer step.
pub const PROCEED_CUE: &str = "READY_TO_PROCEED";

/// Case-insensitive markers of a correct (or partially correct) answer.
pub const CORRECTNESS_MARKERS: [&str; 3] = ["correct!", "tama!", "partially correct"];

/// Answer-entry instructions belong to the interaction log, never to a
/// narration bubble.
pub const ANSWER_ENTRY_INSTRUCTIONS: [&str; 4] = [
    "type your answer",
    "enter your answer",
    "i-type ang iyong sagot",
    "isulat ang iyong sagot",
];

pub fn contains_answer_entry_instruction(text: &str) -> bool {
    let lowered = text.to_lowercase();
    ANSWER_ENTRY_INSTRUCTIONS
        .iter()
        .any(|instruction| lowered.contains(instruction))
}

pub fn mentions_proceed_cue(text: &str) -> bool {
    text.contains(PROCEED_CUE)
}

/// `text` as the student should see it: without the proceed cue.
pub fn strip_proceed_cue(text: &str) -> String {
    if !mentions_proceed_cue(text) {
        return text.to_string();
    }
    text.replace(PROCEED_CUE, "").trim().to_string()
}
