use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use gl_core::{CharacterProfile, InteractionMessage, LessonError, ScenarioKey, Script, ScriptStep};
use gl_scripts::ScriptRegistry;
use tokio::sync::Notify;

use crate::config::{GenerationConfig, TimingConfig};
use crate::engine::{DialogueEngine, DialogueEngineOptions};
use crate::ports::{GenerationRequest, HistoryStore, InMemoryHistoryStore, TextGenerator, TextStream};
use crate::retry::RetryPolicy;

pub(crate) const DEFAULT_REPLY: &str = "Okay.";

pub(crate) fn sample_character() -> CharacterProfile {
    CharacterProfile {
        id: "ka-tala".to_string(),
        name: "Ka Tala".to_string(),
        persona: "a patient science tutor from the barangay".to_string(),
    }
}

fn chunks(reply: &str) -> TextStream {
    let parts = reply
        .split_inclusive(' ')
        .map(|part| Ok(part.to_string()))
        .collect::<Vec<_>>();
    stream::iter(parts).boxed()
}

/// Replays queued replies in order and records every request it sees.
#[derive(Debug, Default)]
pub(crate) struct ScriptedGenerator {
    completions: Mutex<VecDeque<String>>,
    streams: Mutex<VecDeque<String>>,
    complete_requests: Mutex<Vec<GenerationRequest>>,
    stream_requests: Mutex<Vec<GenerationRequest>>,
}

impl ScriptedGenerator {
    pub(crate) fn with_replies<C, S>(completions: C, streams: S) -> Self
    where
        C: IntoIterator,
        C::Item: Into<String>,
        S: IntoIterator,
        S::Item: Into<String>,
    {
        Self {
            completions: Mutex::new(completions.into_iter().map(Into::into).collect()),
            streams: Mutex::new(streams.into_iter().map(Into::into).collect()),
            ..Self::default()
        }
    }

    pub(crate) fn complete_calls(&self) -> usize {
        self.complete_requests.lock().expect("requests lock").len()
    }

    pub(crate) fn stream_calls(&self) -> usize {
        self.stream_requests.lock().expect("requests lock").len()
    }

    pub(crate) fn stream_requests(&self) -> Vec<GenerationRequest> {
        self.stream_requests.lock().expect("requests lock").clone()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn complete(&self, request: &GenerationRequest) -> Result<String, LessonError> {
        self.complete_requests
            .lock()
            .expect("requests lock")
            .push(request.clone());
        Ok(self
            .completions
            .lock()
            .expect("replies lock")
            .pop_front()
            .unwrap_or_else(|| DEFAULT_REPLY.to_string()))
    }

    async fn stream(&self, request: &GenerationRequest) -> Result<TextStream, LessonError> {
        self.stream_requests
            .lock()
            .expect("requests lock")
            .push(request.clone());
        let reply = self
            .streams
            .lock()
            .expect("replies lock")
            .pop_front()
            .unwrap_or_else(|| DEFAULT_REPLY.to_string());
        Ok(chunks(&reply))
    }
}

#[derive(Debug, Default)]
pub(crate) struct FailingGenerator;

#[async_trait]
impl TextGenerator for FailingGenerator {
    async fn complete(&self, _request: &GenerationRequest) -> Result<String, LessonError> {
        Err(LessonError::new("PROVIDER_UNAVAILABLE", "generator offline"))
    }

    async fn stream(&self, _request: &GenerationRequest) -> Result<TextStream, LessonError> {
        Err(LessonError::new("PROVIDER_UNAVAILABLE", "generator offline"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum GatePoint {
    Verdict,
    Explanation,
}

/// Blocks at `gate_on` until released, signalling `entered` on arrival.
#[derive(Debug)]
pub(crate) struct GatedGenerator {
    gate_on: GatePoint,
    verdict: String,
    explanation: String,
    pub(crate) entered: Notify,
    pub(crate) release: Notify,
}

impl GatedGenerator {
    pub(crate) fn new(gate_on: GatePoint, verdict: &str, explanation: &str) -> Self {
        Self {
            gate_on,
            verdict: verdict.to_string(),
            explanation: explanation.to_string(),
            entered: Notify::new(),
            release: Notify::new(),
        }
    }

    async fn gate(&self, point: GatePoint) {
        if self.gate_on == point {
            self.entered.notify_one();
            self.release.notified().await;
        }
    }
}

#[async_trait]
impl TextGenerator for GatedGenerator {
    async fn complete(&self, _request: &GenerationRequest) -> Result<String, LessonError> {
        self.gate(GatePoint::Verdict).await;
        Ok(self.verdict.clone())
    }

    async fn stream(&self, _request: &GenerationRequest) -> Result<TextStream, LessonError> {
        self.gate(GatePoint::Explanation).await;
        Ok(chunks(&self.explanation))
    }
}

/// Opens the explanation stream, sends `partial` if any, then goes silent
/// without ever closing it.
#[derive(Debug, Default)]
pub(crate) struct StallingGenerator {
    partial: Option<String>,
}

impl StallingGenerator {
    pub(crate) fn after(partial: &str) -> Self {
        Self {
            partial: Some(partial.to_string()),
        }
    }
}

#[async_trait]
impl TextGenerator for StallingGenerator {
    async fn complete(&self, _request: &GenerationRequest) -> Result<String, LessonError> {
        Ok("Hmm.".to_string())
    }

    async fn stream(&self, _request: &GenerationRequest) -> Result<TextStream, LessonError> {
        let sent = self
            .partial
            .iter()
            .map(|text| Ok(text.clone()))
            .collect::<Vec<_>>();
        Ok(stream::iter(sent).chain(stream::pending()).boxed())
    }
}

/// History store whose first load blocks until released.
#[derive(Debug, Default)]
pub(crate) struct GatedHistoryStore {
    inner: InMemoryHistoryStore,
    pub(crate) entered: Notify,
    pub(crate) release: Notify,
}

#[async_trait]
impl HistoryStore for GatedHistoryStore {
    async fn load(&self, key: &ScenarioKey) -> Result<Vec<InteractionMessage>, LessonError> {
        self.entered.notify_one();
        self.release.notified().await;
        self.inner.load(key).await
    }

    async fn append(&self, key: &ScenarioKey, message: &InteractionMessage) -> Result<(), LessonError> {
        self.inner.append(key, message).await
    }
}

#[derive(Debug, Default)]
pub(crate) struct BrokenHistoryStore;

#[async_trait]
impl HistoryStore for BrokenHistoryStore {
    async fn load(&self, _key: &ScenarioKey) -> Result<Vec<InteractionMessage>, LessonError> {
        Err(LessonError::new("STORE_READ_FAILED", "disk unavailable"))
    }

    async fn append(&self, _key: &ScenarioKey, _message: &InteractionMessage) -> Result<(), LessonError> {
        Err(LessonError::new("STORE_WRITE_FAILED", "disk unavailable"))
    }
}

pub(crate) fn script(id: &str, steps: Vec<ScriptStep>) -> Script {
    Script {
        id: id.to_string(),
        title: id.to_string(),
        steps,
    }
}

pub(crate) fn engine_with(
    scripts: Vec<Script>,
    generator: Arc<dyn TextGenerator>,
    history: Arc<dyn HistoryStore>,
) -> DialogueEngine {
    let registry = ScriptRegistry::from_scripts(scripts).expect("test registry should build");
    DialogueEngine::new(DialogueEngineOptions {
        registry: Arc::new(registry),
        generator,
        history,
        timing: TimingConfig::default(),
        generation: GenerationConfig::default(),
        retry: RetryPolicy::default(),
    })
}

pub(crate) fn engine_with_builtins(generator: Arc<dyn TextGenerator>) -> DialogueEngine {
    DialogueEngine::new(DialogueEngineOptions {
        registry: Arc::new(ScriptRegistry::builtin()),
        generator,
        history: Arc::new(InMemoryHistoryStore::new()),
        timing: TimingConfig::default(),
        generation: GenerationConfig::default(),
        retry: RetryPolicy::default(),
    })
}
