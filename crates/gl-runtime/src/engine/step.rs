use gl_core::{ChatMessage, InteractionMessage, NarrationMessage, ScenarioKey};
use tracing::{debug, info};

use crate::guard::EpochTicket;
use crate::router::RoutePlan;

use super::{DialogueEngine, EnginePhase, EngineState};

impl DialogueEngine {
    /// Executes steps from `index` until one waits for the student, the
    /// module completes, or the epoch moves on.
    pub(super) async fn run_steps(&self, mut index: usize, ticket: EpochTicket) {
        loop {
            if !self.wait_while_paused(ticket).await {
                return;
            }

            let (step, plan, scenario) = {
                let Some(mut state) = self.lock_live(ticket).await else {
                    return;
                };
                let Some(module) = state.module.as_ref() else {
                    return;
                };
                let Some(step) = module.script.steps.get(index).cloned() else {
                    debug!(step_index = index, "script ended without a completion step");
                    self.complete_locked(&mut state);
                    return;
                };
                let character_id = module.character.id.clone();
                let scenario = module.scenario.clone();

                self.set_step_index(index);
                self.shared.router.enter_step(&step);
                if step.is_module_complete {
                    info!(step_index = index, "module complete");
                    self.complete_locked(&mut state);
                    return;
                }
                state.phase = EnginePhase::ExecutingStep;
                debug!(step_index = index, channel = ?step.channel, "executing step");

                let plan = self.shared.router.plan(&step, &character_id);
                if let RoutePlan::Narration(batch) = &plan {
                    self.shared.router.push_batch(batch.clone());
                    state.transcript.push(ChatMessage::assistant(step.messages.join(" ")));
                }
                (step, plan, scenario)
            };

            let live = match &plan {
                RoutePlan::Silent => true,
                RoutePlan::Narration(batch) => {
                    // A waiting step lands on its final fragment and stays there.
                    let paced = if step.wait_for_user {
                        &batch[..batch.len().saturating_sub(1)]
                    } else {
                        &batch[..]
                    };
                    self.pace_narration(paced, ticket).await
                }
                RoutePlan::Interaction(messages) => {
                    self.append_interaction(messages, &scenario, ticket).await
                }
            };
            if !live {
                return;
            }

            if step.wait_for_user {
                if let Some(mut state) = self.lock_live(ticket).await {
                    if let RoutePlan::Narration(batch) = &plan {
                        self.shared.router.show_progress(batch.len().saturating_sub(1));
                    }
                    state.phase = EnginePhase::AwaitingUserInput;
                    state.awaiting_step = Some(index);
                    debug!(step_index = index, "awaiting student input");
                }
                return;
            }

            if matches!(plan, RoutePlan::Interaction(_))
                && !self
                    .pause_for(self.shared.timing.interaction_advance_delay_ms, ticket)
                    .await
            {
                return;
            }

            let Some(mut state) = self.lock_live(ticket).await else {
                return;
            };
            state.phase = EnginePhase::Advancing;
            state.attempts.clear_step(index);
            index += 1;
        }
    }

    /// Moves the bubble through `batch`, holding each fragment for its
    /// display time plus gap.
    async fn pace_narration(&self, batch: &[NarrationMessage], ticket: EpochTicket) -> bool {
        for (position, message) in batch.iter().enumerate() {
            {
                let Some(_state) = self.lock_live(ticket).await else {
                    return false;
                };
                self.shared.router.show_progress(position);
            }
            if !self.pause_for(message.total_ms(), ticket).await {
                return false;
            }
        }
        true
    }

    async fn append_interaction(
        &self,
        messages: &[String],
        scenario: &ScenarioKey,
        ticket: EpochTicket,
    ) -> bool {
        for (position, content) in messages.iter().enumerate() {
            if position > 0
                && !self
                    .pause_for(self.shared.timing.interaction_message_delay_ms, ticket)
                    .await
            {
                return false;
            }
            let message = {
                let Some(mut state) = self.lock_live(ticket).await else {
                    return false;
                };
                let message = InteractionMessage::assistant(content.clone());
                self.append_log(message.clone());
                state.transcript.push(ChatMessage::assistant(content.clone()));
                message
            };
            self.persist(scenario, &message).await;
        }
        true
    }

    /// Re-enters the step chain after the student finished `step_index`.
    pub(super) async fn advance_past(&self, step_index: usize, ticket: EpochTicket) -> bool {
        {
            let Some(mut state) = self.lock_live(ticket).await else {
                return false;
            };
            state.phase = EnginePhase::Advancing;
            state.attempts.clear_step(step_index);
        }
        self.run_steps(step_index + 1, ticket).await;
        true
    }

    pub(super) fn complete_locked(&self, state: &mut EngineState) {
        state.phase = EnginePhase::Completed;
        state.awaiting_step = None;
        state.attempts.clear();
        self.shared.router.set_thinking(false);
    }
}
