//! Seams to the outside world: text generation and conversation history.

use std::collections::HashMap;

use async_trait::async_trait;
use futures::stream::BoxStream;
use gl_core::{ChatMessage, InteractionMessage, LessonError, ScenarioKey};
use tokio::sync::Mutex;

pub type TextStream = BoxStream<'static, Result<String, LessonError>>;

#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// Stateless text-generation client. Calls cannot be aborted; callers discard
/// results they no longer want.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn complete(&self, request: &GenerationRequest) -> Result<String, LessonError>;
    async fn stream(&self, request: &GenerationRequest) -> Result<TextStream, LessonError>;
}

#[async_trait]
pub trait HistoryStore: Send + Sync {
    async fn load(&self, key: &ScenarioKey) -> Result<Vec<InteractionMessage>, LessonError>;
    async fn append(&self, key: &ScenarioKey, message: &InteractionMessage)
        -> Result<(), LessonError>;
}

#[derive(Debug, Default)]
pub struct InMemoryHistoryStore {
    entries: Mutex<HashMap<ScenarioKey, Vec<InteractionMessage>>>,
}

impl InMemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl HistoryStore for InMemoryHistoryStore {
    async fn load(&self, key: &ScenarioKey) -> Result<Vec<InteractionMessage>, LessonError> {
        Ok(self
            .entries
            .lock()
            .await
            .get(key)
            .cloned()
            .unwrap_or_default())
    }

    async fn append(
        &self,
        key: &ScenarioKey,
        message: &InteractionMessage,
    ) -> Result<(), LessonError> {
        self.entries
            .lock()
            .await
            .entry(key.clone())
            .or_default()
            .push(message.clone());
        Ok(())
    }
}
