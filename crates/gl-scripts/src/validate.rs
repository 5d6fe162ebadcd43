//! Content hygiene checks for lesson scripts. These run as tests and from
//! `gl-cli validate`, never on the engine's hot path.

use gl_core::{contains_answer_entry_instruction, Channel, Script};
use serde::Serialize;

use crate::registry::ScriptRegistry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssueKind {
    EmptyScript,
    NarrationAnswerInstruction,
    EvaluationWithoutWait,
    SilentInteractionWait,
    StepAfterCompletion,
    MissingCompletion,
}

impl IssueKind {
    pub fn code(&self) -> &'static str {
        match self {
            Self::EmptyScript => "EMPTY_SCRIPT",
            Self::NarrationAnswerInstruction => "NARRATION_ANSWER_INSTRUCTION",
            Self::EvaluationWithoutWait => "EVALUATION_WITHOUT_WAIT",
            Self::SilentInteractionWait => "SILENT_INTERACTION_WAIT",
            Self::StepAfterCompletion => "STEP_AFTER_COMPLETION",
            Self::MissingCompletion => "MISSING_COMPLETION",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptIssue {
    pub script_id: String,
    pub step_index: Option<usize>,
    pub kind: IssueKind,
}

pub fn validate_script(script: &Script) -> Vec<ScriptIssue> {
    let issue = |step_index: Option<usize>, kind: IssueKind| ScriptIssue {
        script_id: script.id.clone(),
        step_index,
        kind,
    };

    if script.steps.is_empty() {
        return vec![issue(None, IssueKind::EmptyScript)];
    }

    let mut issues = Vec::new();
    let mut completion_index = None;

    for (index, step) in script.steps.iter().enumerate() {
        if completion_index.is_some() {
            issues.push(issue(Some(index), IssueKind::StepAfterCompletion));
        }
        if step.is_module_complete && completion_index.is_none() {
            completion_index = Some(index);
        }

        if step.channel == Channel::Narration
            && step
                .messages
                .iter()
                .any(|message| contains_answer_entry_instruction(message))
        {
            issues.push(issue(Some(index), IssueKind::NarrationAnswerInstruction));
        }

        if step.evaluation_context.is_some() && !step.wait_for_user {
            issues.push(issue(Some(index), IssueKind::EvaluationWithoutWait));
        }

        if step.channel == Channel::Interaction && step.wait_for_user && step.messages.is_empty() {
            issues.push(issue(Some(index), IssueKind::SilentInteractionWait));
        }
    }

    if completion_index.is_none() {
        issues.push(issue(None, IssueKind::MissingCompletion));
    }

    issues
}

pub fn validate_registry(registry: &ScriptRegistry) -> Vec<ScriptIssue> {
    registry
        .scripts()
        .chain(std::iter::once(registry.fallback()))
        .flat_map(validate_script)
        .collect()
}
