use gl_core::{ChatMessage, InteractionMessage};
use tracing::{debug, info};

use super::{DialogueEngine, EnginePhase, SubmitOutcome};

impl DialogueEngine {
    /// Hands a student reply to the step currently waiting for one.
    ///
    /// Replies are ignored while an explanation is streaming, when blank, or
    /// when no step is waiting.
    pub async fn send_student_message(&self, text: &str) -> SubmitOutcome {
        let text = text.trim();
        if text.is_empty() {
            return SubmitOutcome::Ignored;
        }

        let (ticket, step_index, step, user_message) = {
            let mut state = self.shared.state.lock().await;
            if self.shared.dialogue.borrow().is_streaming {
                debug!("reply ignored while streaming");
                return SubmitOutcome::Ignored;
            }
            let Some(step_index) = state.awaiting_step else {
                debug!("reply ignored, nothing is waiting");
                return SubmitOutcome::Ignored;
            };
            let Some(step) = state
                .module
                .as_ref()
                .and_then(|module| module.script.steps.get(step_index).cloned())
            else {
                return SubmitOutcome::Ignored;
            };
            let scenario = state.module.as_ref().map(|module| module.scenario.clone());

            let ticket = self.shared.guard.capture();
            state.awaiting_step = None;
            state.transcript.push(ChatMessage::user(text));

            if step.is_acknowledgment() {
                self.shared.router.clear();
                state.phase = EnginePhase::Advancing;
                (ticket, step_index, step, None)
            } else {
                let message = InteractionMessage::user(text);
                self.append_log(message.clone());
                if self.shared.router.shows_thinking(&step) {
                    self.shared.router.set_thinking(true);
                }
                state.phase = EnginePhase::EvaluatingAnswer;
                (ticket, step_index, step, scenario.map(|scenario| (scenario, message)))
            }
        };

        let Some((scenario, message)) = user_message else {
            debug!(step_index, "acknowledged");
            if !self
                .pause_for(self.shared.timing.acknowledgment_delay_ms, ticket)
                .await
            {
                return SubmitOutcome::Discarded;
            }
            if !self.advance_past(step_index, ticket).await {
                return SubmitOutcome::Discarded;
            }
            return SubmitOutcome::Acknowledged;
        };
        self.persist(&scenario, &message).await;

        let evaluation = match step.evaluation_context.as_deref() {
            Some(context) => self.evaluate(step_index, context, text, ticket).await,
            None => self.acknowledge_reply(text, ticket).await,
        };
        let Some(evaluation) = evaluation else {
            return SubmitOutcome::Discarded;
        };

        if !evaluation.can_proceed {
            let Some(mut state) = self.lock_live(ticket).await else {
                return SubmitOutcome::Discarded;
            };
            state.awaiting_step = Some(step_index);
            state.phase = EnginePhase::AwaitingUserInput;
            info!(step_index, attempt = ?evaluation.attempt, "answer needs another try");
            return SubmitOutcome::NeedsRetry {
                attempt: evaluation.attempt,
            };
        }

        // The verdict or encouragement stays up until it has been readable.
        let hold_ms = self
            .shared
            .timing
            .settle_delay_ms
            .max(evaluation.bubble_hold_ms);
        if !self.pause_for(hold_ms, ticket).await {
            return SubmitOutcome::Discarded;
        }
        if !self.advance_past(step_index, ticket).await {
            return SubmitOutcome::Discarded;
        }
        SubmitOutcome::Proceeded {
            attempt: evaluation.attempt,
        }
    }
}
