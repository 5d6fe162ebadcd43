//! Graduated-hint retry policy for graded answers.

use gl_core::{mentions_proceed_cue, CORRECTNESS_MARKERS};
use serde::{Deserialize, Serialize};

pub const REVEAL_ENCOURAGEMENT: &str =
    "That one was tricky, and you kept at it. Let's look at the answer together and keep going!";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HintLevel {
    Gentle,
    Specific,
    Reveal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryDecision {
    pub can_proceed: bool,
    pub revealed: bool,
    pub encouragement: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RetryPolicy {
    pub max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_attempts: 3 }
    }
}

impl RetryPolicy {
    pub fn hint_level(&self, attempt: u32) -> HintLevel {
        if attempt >= self.max_attempts {
            HintLevel::Reveal
        } else if attempt <= 1 {
            HintLevel::Gentle
        } else {
            HintLevel::Specific
        }
    }

    /// End-of-module question time: the step's context tells the evaluator to
    /// emit the proceed cue once the student is ready.
    pub fn is_question_loop(&self, evaluation_context: &str) -> bool {
        mentions_proceed_cue(evaluation_context)
    }

    pub fn signals_correct(&self, explanation: &str) -> bool {
        let lowered = explanation.to_lowercase();
        CORRECTNESS_MARKERS
            .iter()
            .any(|marker| lowered.contains(marker))
    }

    /// `attempt` is `None` for question-loop steps, which are not counted.
    pub fn decide(
        &self,
        evaluation_context: &str,
        attempt: Option<u32>,
        explanation: &str,
    ) -> RetryDecision {
        if self.is_question_loop(evaluation_context) {
            return RetryDecision {
                can_proceed: mentions_proceed_cue(explanation),
                revealed: false,
                encouragement: None,
            };
        }

        match attempt {
            Some(attempt) if attempt >= self.max_attempts => RetryDecision {
                can_proceed: true,
                revealed: true,
                encouragement: Some(REVEAL_ENCOURAGEMENT.to_string()),
            },
            _ => RetryDecision {
                can_proceed: self.signals_correct(explanation),
                revealed: false,
                encouragement: None,
            },
        }
    }
}
