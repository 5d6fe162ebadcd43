//! Deterministic generator for playing lessons without network access.
//!
//! It reads the evaluation prompt the runtime builds, compares the student
//! answer against the step's `Expected answer:` clause by keyword, and
//! replies with short canned text in the tutor's voice.

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use gl_core::{mentions_proceed_cue, ChatRole, LessonError, PROCEED_CUE};
use gl_runtime::{GenerationRequest, TextGenerator, TextStream};

const CONTEXT_PREFIX: &str = "Evaluation context:";
const ANSWER_PREFIX: &str = "Student answer:";
const EXPECTED_MARKER: &str = "expected answer:";
const READY_PHRASES: [&str; 8] = [
    "no more",
    "no question",
    "ready",
    "done",
    "move on",
    "continue",
    "wala na",
    "tapos na",
];
const STOP_WORDS: [&str; 8] = ["the", "and", "are", "for", "with", "that", "its", "from"];

#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineGenerator;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Prompt {
    context: String,
    answer: String,
    attempt: Option<(u32, u32)>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Grade {
    Correct,
    Incorrect { reveal: bool },
    Question { ready: bool },
}

impl OfflineGenerator {
    pub fn new() -> Self {
        Self
    }

    fn verdict(prompt: &Prompt) -> String {
        match grade(prompt) {
            Grade::Correct => "Tama!".to_string(),
            Grade::Incorrect { reveal: true } => "Let's look together.".to_string(),
            Grade::Incorrect { reveal: false } => "Not quite.".to_string(),
            Grade::Question { .. } => "Good question!".to_string(),
        }
    }

    fn explanation(prompt: &Prompt) -> String {
        let expected = expected_answer(&prompt.context);
        match (grade(prompt), expected) {
            (Grade::Correct, Some(expected)) => {
                format!("Correct! The answer is {expected}. Nice work remembering that.")
            }
            (Grade::Correct, None) => "Correct! That's a thoughtful answer.".to_string(),
            (Grade::Incorrect { reveal: true }, Some(expected)) => format!(
                "The answer is {expected}. Keep that in mind, it will come up again."
            ),
            (Grade::Incorrect { reveal: true }, None) => {
                "Let's review this part of the lesson together once more.".to_string()
            }
            (Grade::Incorrect { reveal: false }, _) => {
                "Not quite. Think again about the key idea in the question and try once more."
                    .to_string()
            }
            (Grade::Question { ready: true }, _) => {
                format!("You did great today, see you in the next module! {PROCEED_CUE}")
            }
            (Grade::Question { ready: false }, _) => {
                "That's a good question. Look back at what we just covered, and ask me anything \
                 else, or tell me when you're ready to move on."
                    .to_string()
            }
        }
    }
}

#[async_trait]
impl TextGenerator for OfflineGenerator {
    async fn complete(&self, request: &GenerationRequest) -> Result<String, LessonError> {
        Ok(match parse_prompt(request) {
            Some(prompt) => Self::verdict(&prompt),
            None => "Thanks for sharing that! That's a nice connection to our lesson.".to_string(),
        })
    }

    async fn stream(&self, request: &GenerationRequest) -> Result<TextStream, LessonError> {
        let prompt = parse_prompt(request).ok_or_else(|| {
            LessonError::new(
                "PROVIDER_OFFLINE_UNSUPPORTED",
                "offline generator can only stream answer explanations",
            )
        })?;
        let text = Self::explanation(&prompt);
        let chunks = text
            .split_inclusive(' ')
            .map(|chunk| Ok(chunk.to_string()))
            .collect::<Vec<_>>();
        Ok(stream::iter(chunks).boxed())
    }
}

fn parse_prompt(request: &GenerationRequest) -> Option<Prompt> {
    let last_user = request
        .messages
        .iter()
        .rev()
        .find(|message| message.role == ChatRole::User)?;
    let mut context = None;
    let mut answer = None;
    let mut attempt = None;
    for line in last_user.content.lines() {
        if let Some(rest) = line.strip_prefix(CONTEXT_PREFIX) {
            context = Some(rest.trim().to_string());
        } else if let Some(rest) = line.strip_prefix(ANSWER_PREFIX) {
            answer = Some(rest.trim().to_string());
        } else if let Some(rest) = line.strip_prefix("Attempt ") {
            attempt = parse_attempt(rest);
        }
    }
    Some(Prompt {
        context: context?,
        answer: answer?,
        attempt,
    })
}

fn parse_attempt(rest: &str) -> Option<(u32, u32)> {
    let (current, max) = rest.split_once(" of ")?;
    Some((current.trim().parse().ok()?, max.trim().parse().ok()?))
}

fn grade(prompt: &Prompt) -> Grade {
    let answer = prompt.answer.to_lowercase();
    if mentions_proceed_cue(&prompt.context) {
        let ready = READY_PHRASES.iter().any(|phrase| answer.contains(phrase))
            || matches!(answer.trim(), "no" | "none" | "nope" | "wala");
        return Grade::Question { ready };
    }

    let Some(expected) = expected_answer(&prompt.context) else {
        return Grade::Correct;
    };
    let answer_words = keywords(&answer);
    if keywords(&expected)
        .iter()
        .any(|keyword| answer_words.contains(keyword))
    {
        return Grade::Correct;
    }
    let reveal = prompt
        .attempt
        .is_some_and(|(current, max)| current >= max);
    Grade::Incorrect { reveal }
}

/// Text after `Expected answer:` up to the end of that sentence.
fn expected_answer(context: &str) -> Option<String> {
    let lowered = context.to_lowercase();
    let start = lowered.find(EXPECTED_MARKER)? + EXPECTED_MARKER.len();
    let rest = context.get(start..)?.trim_start();
    let end = rest.find(". ").unwrap_or(rest.len());
    let expected = rest[..end].trim().trim_end_matches('.');
    (!expected.is_empty()).then(|| expected.to_string())
}

fn keywords(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|word| word.len() >= 3 && !STOP_WORDS.contains(word))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod offline_tests {
    use super::*;
    use futures::StreamExt;
    use gl_core::ChatMessage;

    fn request(context: &str, answer: &str, attempt: Option<&str>) -> GenerationRequest {
        let attempt_line = attempt.map(|line| format!("{line}\n")).unwrap_or_default();
        GenerationRequest {
            messages: vec![
                ChatMessage::system("You are Ka Tala."),
                ChatMessage::user(format!(
                    "{CONTEXT_PREFIX} {context}\n{attempt_line}{ANSWER_PREFIX} {answer}"
                )),
            ],
            temperature: 0.3,
            max_tokens: 20,
        }
    }

    async fn explanation(request: &GenerationRequest) -> String {
        OfflineGenerator
            .stream(request)
            .await
            .expect("stream")
            .map(|chunk| chunk.expect("chunk"))
            .collect::<Vec<_>>()
            .await
            .concat()
    }

    const CONTEXT: &str = "Question: Which gas do plants take in? Expected answer: carbon dioxide (CO2). Oxygen is wrong.";

    #[test]
    fn expected_answer_stops_at_sentence_end() {
        assert_eq!(
            expected_answer(CONTEXT).as_deref(),
            Some("carbon dioxide (CO2)")
        );
        assert_eq!(expected_answer("No marker here."), None);
    }

    #[tokio::test]
    async fn matching_keyword_is_graded_correct() {
        let generator = OfflineGenerator::new();
        let request = request(CONTEXT, "I think it's CO2", Some("Attempt 1 of 3"));
        assert_eq!(generator.complete(&request).await.expect("verdict"), "Tama!");
        assert!(explanation(&request).await.starts_with("Correct! The answer is carbon dioxide"));
    }

    #[tokio::test]
    async fn wrong_answer_hints_then_reveals_on_last_attempt() {
        let first = request(CONTEXT, "oxygen", Some("Attempt 1 of 3"));
        let text = explanation(&first).await;
        assert!(text.starts_with("Not quite."));
        assert!(!text.to_lowercase().contains("correct!"));

        let last = request(CONTEXT, "oxygen", Some("Attempt 3 of 3"));
        assert!(explanation(&last).await.contains("carbon dioxide"));
    }

    #[tokio::test]
    async fn question_time_ends_only_when_the_student_is_ready() {
        let context = format!("Open question time. End with {PROCEED_CUE} when they are done.");
        let asking = request(&context, "why is the sky blue?", None);
        assert!(!mentions_proceed_cue(&explanation(&asking).await));

        let done = request(&context, "No more questions, I'm ready", None);
        assert!(mentions_proceed_cue(&explanation(&done).await));
    }

    #[tokio::test]
    async fn acknowledgment_requests_get_a_warm_reply() {
        let request = GenerationRequest {
            messages: vec![
                ChatMessage::system("You are Ka Tala."),
                ChatMessage::user("At my lola's garden"),
            ],
            temperature: 0.7,
            max_tokens: 120,
        };
        let reply = OfflineGenerator.complete(&request).await.expect("reply");
        assert!(reply.starts_with("Thanks for sharing"));
        let error = OfflineGenerator.stream(&request).await.err().expect("unsupported");
        assert_eq!(error.code, "PROVIDER_OFFLINE_UNSUPPORTED");
    }
}
