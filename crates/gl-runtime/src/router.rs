//! Channel routing and the narration bubble store.
//!
//! Narration steps become one paced batch in the bubble store; interaction
//! steps are handed back to the engine to be appended to the log one message
//! at a time. The bubble mode only changes when a step boundary is crossed.

use gl_core::{
    semantic_split, BubbleMode, Channel, NarrationMessage, NarrativeBubbleState, ScriptStep,
    DEFAULT_SPLIT_LENGTH,
};
use tokio::sync::watch;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoutePlan {
    Narration(Vec<NarrationMessage>),
    Interaction(Vec<String>),
    Silent,
}

#[derive(Debug)]
pub struct ChannelRouter {
    narration: watch::Sender<NarrativeBubbleState>,
    mode: watch::Sender<BubbleMode>,
}

impl Default for ChannelRouter {
    fn default() -> Self {
        Self::new()
    }
}

impl ChannelRouter {
    pub fn new() -> Self {
        let (narration, _) = watch::channel(NarrativeBubbleState::default());
        let (mode, _) = watch::channel(BubbleMode::Greeting);
        Self { narration, mode }
    }

    pub fn subscribe_narration(&self) -> watch::Receiver<NarrativeBubbleState> {
        self.narration.subscribe()
    }

    pub fn subscribe_mode(&self) -> watch::Receiver<BubbleMode> {
        self.mode.subscribe()
    }

    pub fn narration(&self) -> NarrativeBubbleState {
        self.narration.borrow().clone()
    }

    pub fn mode(&self) -> BubbleMode {
        *self.mode.borrow()
    }

    pub fn plan(&self, step: &ScriptStep, character_id: &str) -> RoutePlan {
        if step.messages.is_empty() {
            return RoutePlan::Silent;
        }
        match step.channel {
            Channel::Narration => RoutePlan::Narration(
                semantic_split(&step.messages, DEFAULT_SPLIT_LENGTH)
                    .into_iter()
                    .map(|content| NarrationMessage::new(content, character_id, step.pacing_hint))
                    .collect(),
            ),
            Channel::Interaction => RoutePlan::Interaction(step.messages.clone()),
        }
    }

    /// Whether the "thinking" bubble should cover the wait for a reply to
    /// `step`. Plain acknowledgments get no reply, so no thinking bubble.
    pub fn shows_thinking(&self, step: &ScriptStep) -> bool {
        !step.is_acknowledgment()
    }

    pub fn enter_step(&self, step: &ScriptStep) {
        let mode = if step.is_module_complete {
            BubbleMode::Greeting
        } else {
            match step.channel {
                Channel::Narration => BubbleMode::Narrative,
                Channel::Interaction => BubbleMode::WaitingForNarrative,
            }
        };
        self.set_mode(mode);
    }

    pub fn set_mode(&self, mode: BubbleMode) {
        self.mode.send_if_modified(|current| {
            if *current == mode {
                return false;
            }
            *current = mode;
            true
        });
    }

    pub fn push_batch(&self, messages: Vec<NarrationMessage>) {
        self.narration.send_modify(|state| {
            state.messages = messages;
            state.current_index = 0;
            state.is_active = !state.messages.is_empty();
            state.is_thinking = false;
        });
    }

    pub fn show_progress(&self, index: usize) {
        self.narration.send_if_modified(|state| {
            if state.current_index == index || index >= state.messages.len() {
                return false;
            }
            state.current_index = index;
            true
        });
    }

    pub fn set_thinking(&self, thinking: bool) {
        self.narration.send_if_modified(|state| {
            if state.is_thinking == thinking {
                return false;
            }
            state.is_thinking = thinking;
            true
        });
    }

    pub fn set_paused(&self, paused: bool) {
        self.narration.send_if_modified(|state| {
            if state.is_paused == paused {
                return false;
            }
            state.is_paused = paused;
            true
        });
    }

    pub fn clear(&self) {
        self.narration.send_modify(|state| {
            state.messages.clear();
            state.current_index = 0;
            state.is_active = false;
            state.is_thinking = false;
        });
    }

    pub fn reset(&self, lesson_id: Option<String>) {
        self.narration.send_modify(|state| {
            *state = NarrativeBubbleState {
                lesson_id,
                ..NarrativeBubbleState::default()
            };
        });
        self.set_mode(BubbleMode::Greeting);
    }
}

#[cfg(test)]
mod router_tests {
    use super::*;
    use gl_core::PacingHint;

    #[test]
    fn narration_step_plans_a_split_batch() {
        let router = ChannelRouter::new();
        let long = "Arteries carry blood away from the heart under high pressure. \
                    Veins bring blood back to the heart with the help of valves. \
                    Capillaries connect them.";
        let step = ScriptStep::narration(["Short intro.", long]).paced(PacingHint::Slow);
        let RoutePlan::Narration(batch) = router.plan(&step, "ka-tala") else {
            panic!("narration step should plan a narration batch");
        };
        assert!(batch.len() > 2);
        assert_eq!(batch[0].content, "Short intro.");
        assert!(batch
            .iter()
            .all(|message| message.character_id == "ka-tala" && message.pacing_hint == PacingHint::Slow));
    }

    #[test]
    fn interaction_and_empty_steps_plan_accordingly() {
        let router = ChannelRouter::new();
        assert_eq!(
            router.plan(&ScriptStep::interaction(["Q1", "Q2"]), "x"),
            RoutePlan::Interaction(vec!["Q1".to_string(), "Q2".to_string()])
        );
        assert_eq!(router.plan(&ScriptStep::complete(), "x"), RoutePlan::Silent);
    }

    #[test]
    fn mode_changes_only_at_step_boundaries() {
        let router = ChannelRouter::new();
        let mut mode = router.subscribe_mode();
        assert_eq!(router.mode(), BubbleMode::Greeting);

        router.enter_step(&ScriptStep::narration(["a"]));
        assert_eq!(router.mode(), BubbleMode::Narrative);
        assert!(mode.has_changed().expect("sender alive"));
        mode.borrow_and_update();

        router.push_batch(vec![
            NarrationMessage::new("a", "x", PacingHint::Normal),
            NarrationMessage::new("b", "x", PacingHint::Normal),
        ]);
        router.show_progress(1);
        router.enter_step(&ScriptStep::narration(["c"]));
        assert!(!mode.has_changed().expect("sender alive"));

        router.enter_step(&ScriptStep::interaction(["q"]));
        assert_eq!(router.mode(), BubbleMode::WaitingForNarrative);
        router.enter_step(&ScriptStep::complete());
        assert_eq!(router.mode(), BubbleMode::Greeting);
    }

    #[test]
    fn batch_progress_and_clear_update_bubble_state() {
        let router = ChannelRouter::new();
        router.set_thinking(true);
        router.push_batch(vec![
            NarrationMessage::new("one", "x", PacingHint::Fast),
            NarrationMessage::new("two", "x", PacingHint::Fast),
        ]);
        let state = router.narration();
        assert!(state.is_active);
        assert!(!state.is_thinking);
        assert_eq!(state.current().map(|m| m.content.as_str()), Some("one"));

        router.show_progress(1);
        router.show_progress(7);
        assert_eq!(router.narration().current_index, 1);

        router.clear();
        let state = router.narration();
        assert!(state.messages.is_empty());
        assert!(!state.is_active);
    }

    #[test]
    fn thinking_is_suppressed_for_plain_acknowledgments() {
        let router = ChannelRouter::new();
        assert!(!router.shows_thinking(&ScriptStep::narration(["Ready?"]).waiting()));
        assert!(router.shows_thinking(&ScriptStep::interaction(["Why?"]).waiting()));
        assert!(router.shows_thinking(&ScriptStep::narration(["Q?"]).graded("ctx")));
    }

    #[test]
    fn reset_keeps_lesson_id_and_returns_to_greeting() {
        let router = ChannelRouter::new();
        router.enter_step(&ScriptStep::narration(["a"]));
        router.set_paused(true);
        router.reset(Some("bio-1".to_string()));
        let state = router.narration();
        assert_eq!(state.lesson_id.as_deref(), Some("bio-1"));
        assert!(!state.is_paused);
        assert_eq!(router.mode(), BubbleMode::Greeting);
    }
}
