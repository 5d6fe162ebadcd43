use gl_core::Script;

mod chemical_bonding;
mod circulatory_system;
mod photosynthesis;
mod volcanoes;

pub(crate) fn builtin_scripts() -> Vec<Script> {
    vec![
        circulatory_system::script(),
        photosynthesis::script(),
        volcanoes::script(),
        chemical_bonding::script(),
    ]
}

/// Shared wording for the closing question-and-answer step.
pub(crate) fn closing_questions_context(topic: &str) -> String {
    format!(
        "Open question time about {topic}. Answer the student's follow-up questions in two to four \
         sentences. Do not grade them. Only when the student clearly says they have no more \
         questions or are ready to continue, end your reply with {cue}.",
        topic = topic,
        cue = gl_core::PROCEED_CUE,
    )
}
