use gl_core::{CharacterProfile, DialogueState, ScenarioKey};
use tracing::{debug, info, warn};

use super::{ActiveModule, DialogueEngine, EnginePhase, EngineState, StartOutcome};

impl DialogueEngine {
    /// Starts `module_id` from its first step, abandoning whatever was active.
    ///
    /// Unknown ids run the fallback script, which completes immediately. The
    /// call returns once the module first waits for the student or completes.
    pub async fn start_module(
        &self,
        module_id: &str,
        lesson_id: &str,
        character: CharacterProfile,
    ) -> StartOutcome {
        let (ticket, scenario) = {
            let mut state = self.shared.state.lock().await;
            if state.starting {
                debug!(module_id, "start already in progress");
                return StartOutcome::AlreadyStarting;
            }
            state.starting = true;

            let ticket = self.shared.guard.advance();
            let script = self.shared.registry.resolve(module_id).clone();
            if script.id != module_id {
                warn!(module_id, fallback = %script.id, "unknown module, using fallback script");
            }
            info!(
                module_id = %script.id,
                lesson_id,
                character = %character.id,
                epoch = ticket.value(),
                "starting module"
            );

            self.clear_locked(&mut state, Some(lesson_id.to_string()));
            let scenario = ScenarioKey::for_module(&character.id, lesson_id, &script.id);
            state.module = Some(ActiveModule {
                script,
                character,
                scenario: scenario.clone(),
            });
            state.phase = EnginePhase::ExecutingStep;
            (ticket, scenario)
        };

        let prior_messages = match self.shared.history.load(&scenario).await {
            Ok(messages) => messages.len(),
            Err(error) => {
                warn!(scenario = %scenario, code = %error.code, "history load failed: {}", error.message);
                0
            }
        };

        {
            let mut state = self.shared.state.lock().await;
            state.starting = false;
        }
        self.run_steps(0, ticket).await;
        StartOutcome::Started { prior_messages }
    }

    /// Abandons the active module and clears every store. In-flight work from
    /// before the reset produces no further effects.
    pub async fn reset(&self) {
        let mut state = self.shared.state.lock().await;
        let ticket = self.shared.guard.advance();
        info!(epoch = ticket.value(), "engine reset");
        state.module = None;
        self.clear_locked(&mut state, None);
    }

    /// Holds the current continuation at its next pacing point.
    pub fn pause(&self) {
        if self.shared.paused.send_if_modified(|paused| !std::mem::replace(paused, true)) {
            debug!("engine paused");
        }
        self.shared.router.set_paused(true);
    }

    pub fn resume(&self) {
        if self.shared.paused.send_if_modified(|paused| std::mem::replace(paused, false)) {
            debug!("engine resumed");
        }
        self.shared.router.set_paused(false);
    }

    fn clear_locked(&self, state: &mut EngineState, lesson_id: Option<String>) {
        state.attempts.clear();
        state.transcript.clear();
        state.awaiting_step = None;
        state.phase = EnginePhase::Idle;
        self.shared.dialogue.send_replace(DialogueState::default());
        self.shared.router.reset(lesson_id);
        self.shared.paused.send_replace(false);
    }
}
