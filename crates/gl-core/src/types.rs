use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::pacing::{display_ms, gap_ms};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Channel {
    Narration,
    Interaction,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PacingHint {
    Fast,
    #[default]
    Normal,
    Slow,
}

/// One scripted unit of lesson dialogue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptStep {
    pub messages: Vec<String>,
    pub channel: Channel,
    pub wait_for_user: bool,
    pub evaluation_context: Option<String>,
    pub is_module_complete: bool,
    pub pacing_hint: PacingHint,
}

impl ScriptStep {
    pub fn narration<I, S>(messages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_channel(Channel::Narration, messages)
    }

    pub fn interaction<I, S>(messages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_channel(Channel::Interaction, messages)
    }

    pub fn complete() -> Self {
        Self {
            is_module_complete: true,
            ..Self::with_channel(Channel::Narration, Vec::<String>::new())
        }
    }

    fn with_channel<I, S>(channel: Channel, messages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            messages: messages.into_iter().map(Into::into).collect(),
            channel,
            wait_for_user: false,
            evaluation_context: None,
            is_module_complete: false,
            pacing_hint: PacingHint::Normal,
        }
    }

    pub fn waiting(mut self) -> Self {
        self.wait_for_user = true;
        self
    }

    /// Marks the step as a graded question. Graded steps always wait.
    pub fn graded(mut self, evaluation_context: impl Into<String>) -> Self {
        self.wait_for_user = true;
        self.evaluation_context = Some(evaluation_context.into());
        self
    }

    pub fn paced(mut self, pacing_hint: PacingHint) -> Self {
        self.pacing_hint = pacing_hint;
        self
    }

    pub fn is_acknowledgment(&self) -> bool {
        self.channel == Channel::Narration && self.wait_for_user && self.evaluation_context.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Script {
    pub id: String,
    pub title: String,
    pub steps: Vec<ScriptStep>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacterProfile {
    pub id: String,
    pub name: String,
    pub persona: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NarrationMessage {
    pub id: String,
    pub content: String,
    pub character_id: String,
    pub pacing_hint: PacingHint,
}

impl NarrationMessage {
    pub fn new(
        content: impl Into<String>,
        character_id: impl Into<String>,
        pacing_hint: PacingHint,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            content: content.into(),
            character_id: character_id.into(),
            pacing_hint,
        }
    }

    pub fn display_ms(&self) -> u64 {
        display_ms(&self.content)
    }

    pub fn gap_ms(&self) -> u64 {
        gap_ms(&self.content, self.pacing_hint)
    }

    pub fn total_ms(&self) -> u64 {
        self.display_ms() + self.gap_ms()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractionMessage {
    pub id: String,
    pub role: Role,
    pub content: String,
    pub channel: Channel,
    pub is_streaming: bool,
    pub timestamp: DateTime<Utc>,
}

impl InteractionMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self::build(Role::User, content.into(), false)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::build(Role::Assistant, content.into(), false)
    }

    pub fn streaming_placeholder() -> Self {
        Self::build(Role::Assistant, String::new(), true)
    }

    fn build(role: Role, content: String, is_streaming: bool) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role,
            content,
            channel: Channel::Interaction,
            is_streaming,
            timestamp: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DialogueState {
    pub messages: Vec<InteractionMessage>,
    pub is_streaming: bool,
    pub is_checking: bool,
    pub current_step_index: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NarrativeBubbleState {
    pub messages: Vec<NarrationMessage>,
    pub current_index: usize,
    pub is_active: bool,
    pub is_paused: bool,
    pub is_thinking: bool,
    pub lesson_id: Option<String>,
}

impl NarrativeBubbleState {
    pub fn current(&self) -> Option<&NarrationMessage> {
        self.messages.get(self.current_index)
    }
}

/// What the ambient chat affordance should show.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BubbleMode {
    #[default]
    Greeting,
    WaitingForNarrative,
    Narrative,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// Conversation context with isolated history: a character at a screen location.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioKey {
    pub character_id: String,
    pub location: String,
}

impl ScenarioKey {
    pub fn new(character_id: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            character_id: character_id.into(),
            location: location.into(),
        }
    }

    pub fn for_module(character_id: &str, lesson_id: &str, module_id: &str) -> Self {
        Self::new(character_id, format!("{}/{}", lesson_id, module_id))
    }
}

impl std::fmt::Display for ScenarioKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.character_id, self.location)
    }
}
