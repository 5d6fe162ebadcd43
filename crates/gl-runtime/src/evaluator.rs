//! Prompt construction and fallbacks for the two-call grading protocol: a
//! short verdict for the narration bubble, then a streamed explanation for the
//! interaction log.

use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use gl_core::{ChatMessage, CharacterProfile, LessonError};
use tracing::warn;

use crate::config::{GenerationConfig, GenerationSettings};
use crate::ports::{GenerationRequest, TextGenerator, TextStream};
use crate::retry::HintLevel;

pub const FALLBACK_VERDICT: &str = "Let's see...";
pub const FALLBACK_EXPLANATION: &str =
    "I couldn't check that answer just now. Let's keep going, and try telling me your answer once more.";
pub const FALLBACK_ACKNOWLEDGMENT: &str = "Thanks for sharing that! Let's keep going.";

const MAX_VERDICT_WORDS: usize = 5;
pub const DEFAULT_STREAM_IDLE_TIMEOUT: Duration = Duration::from_secs(20);

/// Everything the evaluator needs to grade one answer.
#[derive(Debug, Clone, Copy)]
pub struct GradingInput<'a> {
    pub character: &'a CharacterProfile,
    pub transcript: &'a [ChatMessage],
    pub evaluation_context: &'a str,
    pub answer: &'a str,
    /// `None` for open question time, which is neither counted nor hinted.
    pub attempt: Option<(u32, HintLevel)>,
}

#[derive(Clone)]
pub struct AiEvaluator {
    generator: Arc<dyn TextGenerator>,
    generation: GenerationConfig,
    max_attempts: u32,
    stream_idle_timeout: Duration,
}

impl AiEvaluator {
    pub fn new(generator: Arc<dyn TextGenerator>, generation: GenerationConfig, max_attempts: u32) -> Self {
        Self {
            generator,
            generation,
            max_attempts,
            stream_idle_timeout: DEFAULT_STREAM_IDLE_TIMEOUT,
        }
    }

    pub fn with_stream_idle_timeout(mut self, stream_idle_timeout: Duration) -> Self {
        self.stream_idle_timeout = stream_idle_timeout;
        self
    }

    pub async fn verdict(&self, input: GradingInput<'_>) -> String {
        let request = self.verdict_request(input);
        match self.generator.complete(&request).await {
            Ok(text) => normalize_verdict(&text).unwrap_or_else(|| FALLBACK_VERDICT.to_string()),
            Err(error) => {
                warn!(code = %error.code, "verdict generation failed: {}", error.message);
                FALLBACK_VERDICT.to_string()
            }
        }
    }

    /// Streams the explanation. A stream that fails to open, or to open in
    /// time, yields the fallback text; one that goes quiet mid-way ends with a
    /// `PROVIDER_STREAM_IDLE` error after the text already sent.
    pub async fn explanation(&self, input: GradingInput<'_>) -> TextStream {
        let request = self.explanation_request(input);
        let opened = tokio::time::timeout(self.stream_idle_timeout, self.generator.stream(&request))
            .await
            .unwrap_or_else(|_| Err(idle_error(self.stream_idle_timeout)));
        match opened {
            Ok(stream) => with_idle_timeout(stream, self.stream_idle_timeout),
            Err(error) => {
                warn!(code = %error.code, "explanation generation failed: {}", error.message);
                stream::iter(vec![Ok(FALLBACK_EXPLANATION.to_string())]).boxed()
            }
        }
    }

    pub async fn acknowledge(
        &self,
        character: &CharacterProfile,
        transcript: &[ChatMessage],
        reply: &str,
    ) -> String {
        let request = self.acknowledgment_request(character, transcript, reply);
        match self.generator.complete(&request).await {
            Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
            Ok(_) => FALLBACK_ACKNOWLEDGMENT.to_string(),
            Err(error) => {
                warn!(code = %error.code, "acknowledgment generation failed: {}", error.message);
                FALLBACK_ACKNOWLEDGMENT.to_string()
            }
        }
    }

    pub fn verdict_request(&self, input: GradingInput<'_>) -> GenerationRequest {
        let instructions = format!(
            "{} Reply with a verdict of one to {} words only, in English or Filipino, such as \
             \"Tama!\", \"Almost there!\" or \"Not quite.\" Do not explain.",
            persona_line(input.character),
            MAX_VERDICT_WORDS
        );
        request(
            vec![
                ChatMessage::system(instructions),
                ChatMessage::user(format!(
                    "Evaluation context: {}\nStudent answer: {}",
                    input.evaluation_context, input.answer
                )),
            ],
            self.generation.verdict,
        )
    }

    pub fn explanation_request(&self, input: GradingInput<'_>) -> GenerationRequest {
        let mut instructions = persona_line(input.character);
        let attempt_line = match input.attempt {
            Some((attempt, level)) => {
                instructions.push_str(
                    " Explain in two to five sentences. Start with \"Correct!\" when the answer is \
                     fully right and \"Partially correct!\" when it is partly right; otherwise do \
                     not use either phrase. ",
                );
                instructions.push_str(hint_instruction(level));
                format!("Attempt {} of {}\n", attempt, self.max_attempts)
            }
            None => {
                instructions.push_str(" Reply to the student in two to four sentences.");
                String::new()
            }
        };

        let mut messages = vec![ChatMessage::system(instructions)];
        messages.extend(input.transcript.iter().cloned());
        messages.push(ChatMessage::user(format!(
            "Evaluation context: {}\n{}Student answer: {}",
            input.evaluation_context, attempt_line, input.answer
        )));
        request(messages, self.generation.explanation)
    }

    pub fn acknowledgment_request(
        &self,
        character: &CharacterProfile,
        transcript: &[ChatMessage],
        reply: &str,
    ) -> GenerationRequest {
        let instructions = format!(
            "{} The student just replied to an open question. Respond warmly in one or two \
             sentences and do not ask a new question.",
            persona_line(character)
        );
        let mut messages = vec![ChatMessage::system(instructions)];
        messages.extend(transcript.iter().cloned());
        messages.push(ChatMessage::user(reply.to_string()));
        request(messages, self.generation.acknowledgment)
    }
}

fn request(messages: Vec<ChatMessage>, settings: GenerationSettings) -> GenerationRequest {
    GenerationRequest {
        messages,
        temperature: settings.temperature,
        max_tokens: settings.max_tokens,
    }
}

fn idle_error(limit: Duration) -> LessonError {
    LessonError::new(
        "PROVIDER_STREAM_IDLE",
        format!("no generated text within {} ms", limit.as_millis()),
    )
}

/// Ends `inner` with an idle error once it stays silent for `limit`.
fn with_idle_timeout(inner: TextStream, limit: Duration) -> TextStream {
    stream::unfold(Some(inner), move |state| async move {
        let mut inner = state?;
        match tokio::time::timeout(limit, inner.next()).await {
            Ok(Some(item)) => Some((item, Some(inner))),
            Ok(None) => None,
            Err(_) => Some((Err(idle_error(limit)), None)),
        }
    })
    .boxed()
}

fn persona_line(character: &CharacterProfile) -> String {
    format!(
        "You are {}, {}. You are tutoring a Grade 9 science student.",
        character.name, character.persona
    )
}

fn hint_instruction(level: HintLevel) -> &'static str {
    match level {
        HintLevel::Gentle => {
            "If the answer is wrong, give a gentle hint and do not reveal the answer."
        }
        HintLevel::Specific => {
            "If the answer is wrong, give a more specific hint that narrows it down, still without \
             stating the answer."
        }
        HintLevel::Reveal => {
            "This is the final attempt. Whatever the answer, reveal the correct answer and explain \
             it kindly."
        }
    }
}

/// First line of the reply, cut to the verdict word limit.
fn normalize_verdict(text: &str) -> Option<String> {
    let line = text.lines().map(str::trim).find(|line| !line.is_empty())?;
    let words = line.split_whitespace().take(MAX_VERDICT_WORDS).collect::<Vec<_>>();
    Some(words.join(" "))
}
