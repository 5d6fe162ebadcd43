use std::collections::HashSet;

use gl_core::{DialogueState, NarrativeBubbleState, Role};
use tokio::sync::watch;

pub(crate) const NARRATION_PREFIX: &str = "»";
pub(crate) const THINKING_LINE: &str = "» ...";

/// Turns store snapshots into transcript lines, printing each log message
/// once it is final and each narration fragment once it is reached.
#[derive(Debug, Default)]
pub(crate) struct TranscriptPrinter {
    printed_log: HashSet<String>,
    printed_narration: HashSet<String>,
    thinking: bool,
}

impl TranscriptPrinter {
    pub(crate) fn dialogue_lines(&mut self, state: &DialogueState) -> Vec<String> {
        let mut lines = Vec::new();
        for message in &state.messages {
            if message.is_streaming {
                break;
            }
            if !self.printed_log.insert(message.id.clone()) {
                continue;
            }
            let speaker = match message.role {
                Role::Assistant => "tutor",
                Role::User => "you",
            };
            lines.push(format!("[{}] {}", speaker, message.content));
        }
        lines
    }

    pub(crate) fn narration_lines(&mut self, state: &NarrativeBubbleState) -> Vec<String> {
        let mut lines = Vec::new();
        if state.is_thinking && !self.thinking {
            lines.push(THINKING_LINE.to_string());
        }
        self.thinking = state.is_thinking;

        if !state.is_active {
            return lines;
        }
        for message in state.messages.iter().take(state.current_index + 1) {
            if self.printed_narration.insert(message.id.clone()) {
                lines.push(format!("{} {}", NARRATION_PREFIX, message.content));
            }
        }
        lines
    }
}

/// Prints the transcript until either store's engine goes away.
pub(crate) async fn print_transcript(
    mut dialogue: watch::Receiver<DialogueState>,
    mut narration: watch::Receiver<NarrativeBubbleState>,
) {
    let mut printer = TranscriptPrinter::default();
    loop {
        let dialogue_state = dialogue.borrow_and_update().clone();
        for line in printer.dialogue_lines(&dialogue_state) {
            println!("{}", line);
        }
        let narration_state = narration.borrow_and_update().clone();
        for line in printer.narration_lines(&narration_state) {
            println!("{}", line);
        }

        tokio::select! {
            changed = dialogue.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            changed = narration.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }
    }
}
