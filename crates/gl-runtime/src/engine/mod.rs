use std::sync::Arc;
use std::time::Duration;

use gl_core::{
    BubbleMode, ChatMessage, CharacterProfile, DialogueState, InteractionMessage,
    NarrativeBubbleState, ScenarioKey, Script,
};
use gl_scripts::ScriptRegistry;
use tokio::sync::{watch, Mutex, MutexGuard};
use tracing::{debug, warn};

use crate::attempts::AttemptTracker;
use crate::config::{GenerationConfig, TimingConfig};
use crate::evaluator::AiEvaluator;
use crate::guard::{EpochTicket, RequestGuard};
use crate::ports::{HistoryStore, TextGenerator};
use crate::retry::RetryPolicy;
use crate::router::ChannelRouter;

mod boundary;
mod evaluate;
mod lifecycle;
mod step;


#[derive(Clone)]
pub struct DialogueEngineOptions {
    pub registry: Arc<ScriptRegistry>,
    pub generator: Arc<dyn TextGenerator>,
    pub history: Arc<dyn HistoryStore>,
    pub timing: TimingConfig,
    pub generation: GenerationConfig,
    pub retry: RetryPolicy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnginePhase {
    Idle,
    ExecutingStep,
    AwaitingUserInput,
    EvaluatingAnswer,
    Advancing,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    /// `prior_messages` is the stored history length for the scenario; zero
    /// means the student has never talked to this character here.
    Started { prior_messages: usize },
    AlreadyStarting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    Ignored,
    Acknowledged,
    Proceeded { attempt: Option<u32> },
    NeedsRetry { attempt: Option<u32> },
    Discarded,
}

#[derive(Debug, Clone)]
struct ActiveModule {
    script: Script,
    character: CharacterProfile,
    scenario: ScenarioKey,
}

#[derive(Debug)]
struct EngineState {
    module: Option<ActiveModule>,
    attempts: AttemptTracker,
    transcript: Vec<ChatMessage>,
    phase: EnginePhase,
    starting: bool,
    awaiting_step: Option<usize>,
}

impl EngineState {
    fn idle() -> Self {
        Self {
            module: None,
            attempts: AttemptTracker::new(),
            transcript: Vec::new(),
            phase: EnginePhase::Idle,
            starting: false,
            awaiting_step: None,
        }
    }
}

struct EngineShared {
    registry: Arc<ScriptRegistry>,
    history: Arc<dyn HistoryStore>,
    evaluator: AiEvaluator,
    timing: TimingConfig,
    retry: RetryPolicy,
    guard: RequestGuard,
    router: ChannelRouter,
    dialogue: watch::Sender<DialogueState>,
    paused: watch::Sender<bool>,
    state: Mutex<EngineState>,
}

/// Sequencer for guided lessons. Cheap to clone; clones drive the same
/// engine.
///
/// Every asynchronous chain captures an [`EpochTicket`] when it starts and
/// re-checks it, under the state lock, before each effect. `reset` and
/// `start_module` advance the epoch, so continuations from an abandoned
/// module fall silent instead of writing into the new one.
#[derive(Clone)]
pub struct DialogueEngine {
    shared: Arc<EngineShared>,
}

impl DialogueEngine {
    pub fn new(options: DialogueEngineOptions) -> Self {
        let (dialogue, _) = watch::channel(DialogueState::default());
        let (paused, _) = watch::channel(false);
        let evaluator = AiEvaluator::new(
            options.generator,
            options.generation,
            options.retry.max_attempts,
        )
        .with_stream_idle_timeout(Duration::from_millis(options.timing.stream_idle_timeout_ms));
        Self {
            shared: Arc::new(EngineShared {
                registry: options.registry,
                history: options.history,
                evaluator,
                timing: options.timing,
                retry: options.retry,
                guard: RequestGuard::new(),
                router: ChannelRouter::new(),
                dialogue,
                paused,
                state: Mutex::new(EngineState::idle()),
            }),
        }
    }

    pub fn registry(&self) -> &ScriptRegistry {
        &self.shared.registry
    }

    pub fn subscribe_dialogue(&self) -> watch::Receiver<DialogueState> {
        self.shared.dialogue.subscribe()
    }

    pub fn subscribe_narration(&self) -> watch::Receiver<NarrativeBubbleState> {
        self.shared.router.subscribe_narration()
    }

    pub fn subscribe_bubble_mode(&self) -> watch::Receiver<BubbleMode> {
        self.shared.router.subscribe_mode()
    }

    pub fn dialogue(&self) -> DialogueState {
        self.shared.dialogue.borrow().clone()
    }

    pub fn narration(&self) -> NarrativeBubbleState {
        self.shared.router.narration()
    }

    pub fn bubble_mode(&self) -> BubbleMode {
        self.shared.router.mode()
    }

    pub fn epoch(&self) -> u64 {
        self.shared.guard.current()
    }

    pub fn is_paused(&self) -> bool {
        *self.shared.paused.borrow()
    }

    pub async fn phase(&self) -> EnginePhase {
        self.shared.state.lock().await.phase
    }

    pub async fn attempt_count(&self, step_index: usize) -> u32 {
        self.shared.state.lock().await.attempts.count(step_index)
    }

    pub async fn active_script_id(&self) -> Option<String> {
        self.shared
            .state
            .lock()
            .await
            .module
            .as_ref()
            .map(|module| module.script.id.clone())
    }

    /// Locks engine state only if `ticket` still belongs to the live epoch.
    async fn lock_live(&self, ticket: EpochTicket) -> Option<MutexGuard<'_, EngineState>> {
        let state = self.shared.state.lock().await;
        if self.shared.guard.is_live(ticket) {
            Some(state)
        } else {
            debug!(
                epoch = ticket.value(),
                live = self.shared.guard.current(),
                "discarding stale continuation"
            );
            None
        }
    }

    /// Holds until the engine is not paused; false once the epoch moved on.
    async fn wait_while_paused(&self, ticket: EpochTicket) -> bool {
        let mut paused = self.shared.paused.subscribe();
        if paused.wait_for(|paused| !*paused).await.is_err() {
            return false;
        }
        self.shared.guard.is_live(ticket)
    }

    async fn pause_for(&self, millis: u64, ticket: EpochTicket) -> bool {
        if millis > 0 {
            tokio::time::sleep(Duration::from_millis(millis)).await;
        }
        self.wait_while_paused(ticket).await
    }

    async fn persist(&self, scenario: &ScenarioKey, message: &InteractionMessage) {
        if let Err(error) = self.shared.history.append(scenario, message).await {
            warn!(scenario = %scenario, code = %error.code, "history append failed: {}", error.message);
        }
    }

    fn append_log(&self, message: InteractionMessage) {
        self.shared.dialogue.send_modify(|dialogue| {
            dialogue.messages.push(message);
        });
    }

    fn set_step_index(&self, index: usize) {
        self.shared.dialogue.send_if_modified(|dialogue| {
            if index <= dialogue.current_step_index {
                return false;
            }
            dialogue.current_step_index = index;
            true
        });
    }

    fn set_checking(&self, checking: bool) {
        self.shared.dialogue.send_if_modified(|dialogue| {
            if dialogue.is_checking == checking {
                return false;
            }
            dialogue.is_checking = checking;
            true
        });
    }

    /// Removes a message by id without touching any other log state, so it is
    /// safe to call from a continuation whose epoch has already ended.
    fn remove_log_message(&self, id: &str) {
        self.shared.dialogue.send_if_modified(|dialogue| {
            let before = dialogue.messages.len();
            dialogue.messages.retain(|message| message.id != id);
            dialogue.messages.len() != before
        });
    }
}
