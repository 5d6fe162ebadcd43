use futures::StreamExt;
use gl_core::{strip_proceed_cue, ChatMessage, InteractionMessage, NarrationMessage, PacingHint};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::evaluator::{GradingInput, FALLBACK_ACKNOWLEDGMENT, FALLBACK_EXPLANATION};
use crate::guard::EpochTicket;

use super::DialogueEngine;

pub(super) struct Evaluation {
    pub(super) can_proceed: bool,
    pub(super) attempt: Option<u32>,
    /// How much longer the last bubble pushed for this answer needs on
    /// screen before the next step may replace it.
    pub(super) bubble_hold_ms: u64,
}

impl DialogueEngine {
    /// Grades one answer: verdict to the bubble, streamed explanation to the
    /// log, then the retry decision. `None` means the epoch ended mid-way.
    pub(super) async fn evaluate(
        &self,
        step_index: usize,
        context: &str,
        answer: &str,
        ticket: EpochTicket,
    ) -> Option<Evaluation> {
        let retry = self.shared.retry;
        let (character, transcript, scenario, attempt) = {
            let mut state = self.lock_live(ticket).await?;
            let module = state.module.as_ref()?;
            let character = module.character.clone();
            let scenario = module.scenario.clone();
            let attempt = if retry.is_question_loop(context) {
                None
            } else {
                let count = state.attempts.record(step_index, retry.max_attempts);
                Some((count, retry.hint_level(count)))
            };
            self.set_checking(true);
            (character, state.transcript.clone(), scenario, attempt)
        };
        debug!(step_index, attempt = ?attempt.map(|(count, _)| count), "grading answer");

        let input = GradingInput {
            character: &character,
            transcript: &transcript,
            evaluation_context: context,
            answer,
            attempt,
        };

        let verdict = self.shared.evaluator.verdict(input).await;
        let verdict = NarrationMessage::new(verdict, character.id.as_str(), PacingHint::Fast);
        let verdict_ms = verdict.total_ms();
        let verdict_shown_at = {
            let _state = self.lock_live(ticket).await?;
            self.shared.router.push_batch(vec![verdict]);
            Instant::now()
        };
        if !self
            .pause_for(self.shared.timing.settle_delay_ms, ticket)
            .await
        {
            return None;
        }

        let placeholder = InteractionMessage::streaming_placeholder();
        let placeholder_id = placeholder.id.clone();
        {
            let _state = self.lock_live(ticket).await?;
            self.shared.dialogue.send_modify(|dialogue| {
                dialogue.messages.push(placeholder);
                dialogue.is_streaming = true;
            });
        }

        let mut stream = self.shared.evaluator.explanation(input).await;
        let mut explanation = String::new();
        while let Some(chunk) = stream.next().await {
            match chunk {
                Ok(text) => {
                    let Some(_state) = self.lock_live(ticket).await else {
                        self.remove_log_message(&placeholder_id);
                        return None;
                    };
                    explanation.push_str(&text);
                    let shown = strip_proceed_cue(&explanation);
                    self.shared.dialogue.send_modify(|dialogue| {
                        if let Some(message) = dialogue
                            .messages
                            .iter_mut()
                            .find(|message| message.id == placeholder_id)
                        {
                            message.content = shown;
                        }
                    });
                }
                Err(error) => {
                    warn!(code = %error.code, "explanation stream failed: {}", error.message);
                    break;
                }
            }
        }
        if explanation.trim().is_empty() {
            explanation = FALLBACK_EXPLANATION.to_string();
        }

        let decision = retry.decide(context, attempt.map(|(count, _)| count), &explanation);
        // The cue steers control flow only; the student never sees it.
        let mut shown = strip_proceed_cue(&explanation);
        if shown.is_empty() {
            shown = FALLBACK_ACKNOWLEDGMENT.to_string();
        }

        let (finalized, bubble_hold_ms) = {
            let Some(mut state) = self.lock_live(ticket).await else {
                self.remove_log_message(&placeholder_id);
                return None;
            };
            let mut finalized = None;
            self.shared.dialogue.send_modify(|dialogue| {
                if let Some(message) = dialogue
                    .messages
                    .iter_mut()
                    .find(|message| message.id == placeholder_id)
                {
                    message.content.clone_from(&shown);
                    message.is_streaming = false;
                    finalized = Some(message.clone());
                }
                dialogue.is_streaming = false;
                dialogue.is_checking = false;
            });
            state.transcript.push(ChatMessage::assistant(shown.as_str()));

            let bubble_hold_ms = match &decision.encouragement {
                Some(encouragement) => {
                    info!(step_index, "revealing answer after final attempt");
                    let message = NarrationMessage::new(
                        encouragement.as_str(),
                        character.id.as_str(),
                        PacingHint::Normal,
                    );
                    let hold = message.total_ms();
                    self.shared.router.push_batch(vec![message]);
                    hold
                }
                None => {
                    let shown_ms = verdict_shown_at.elapsed().as_millis();
                    verdict_ms.saturating_sub(u64::try_from(shown_ms).unwrap_or(u64::MAX))
                }
            };
            (finalized, bubble_hold_ms)
        };
        if let Some(message) = finalized {
            self.persist(&scenario, &message).await;
        }

        Some(Evaluation {
            can_proceed: decision.can_proceed,
            attempt: attempt.map(|(count, _)| count),
            bubble_hold_ms,
        })
    }

    /// Replies to an ungraded answer and lets the module move on.
    pub(super) async fn acknowledge_reply(
        &self,
        reply: &str,
        ticket: EpochTicket,
    ) -> Option<Evaluation> {
        let (character, transcript, scenario) = {
            let state = self.lock_live(ticket).await?;
            let module = state.module.as_ref()?;
            self.set_checking(true);
            (
                module.character.clone(),
                state.transcript.clone(),
                module.scenario.clone(),
            )
        };

        let text = self
            .shared
            .evaluator
            .acknowledge(&character, &transcript, reply)
            .await;

        let message = {
            let mut state = self.lock_live(ticket).await?;
            self.shared.router.set_thinking(false);
            let message = InteractionMessage::assistant(text.as_str());
            self.shared.dialogue.send_modify(|dialogue| {
                dialogue.messages.push(message.clone());
                dialogue.is_checking = false;
            });
            state.transcript.push(ChatMessage::assistant(text));
            message
        };
        self.persist(&scenario, &message).await;

        Some(Evaluation {
            can_proceed: true,
            attempt: None,
            bubble_hold_ms: 0,
        })
    }
}
