use gl_core::{PacingHint, Script, ScriptStep};

use super::closing_questions_context;

pub(crate) fn script() -> Script {
    Script {
        id: "photosynthesis".to_string(),
        title: "Photosynthesis: How Plants Make Food".to_string(),
        steps: vec![
            ScriptStep::narration([
                "Let's talk about how plants feed themselves.",
                "They don't eat like we do.",
            ])
            .paced(PacingHint::Fast),
            ScriptStep::narration([
                "Photosynthesis is the process where green plants use light energy to turn carbon \
                 dioxide and water into glucose. Oxygen is released as a by-product.\n\n\
                 It happens inside chloroplasts. The green pigment chlorophyll captures the light \
                 that powers the whole reaction.",
            ]),
            ScriptStep::narration(["Ready for a quick check? Just say so when you are."]).waiting(),
            ScriptStep::interaction(["Which gas do plants take in from the air during photosynthesis?"])
                .graded(
                    "Question: Which gas do plants take in from the air during photosynthesis? \
                     Expected answer: carbon dioxide (CO2). Accept 'CO2'. Oxygen is incorrect \
                     because it is released, not absorbed.",
                ),
            ScriptStep::narration([
                "Nice work so far.",
                "Now, the glucose a plant makes is stored as starch or used for energy in cellular \
                 respiration. Respiration runs day and night, while photosynthesis needs light.",
            ]),
            ScriptStep::interaction([
                "Where do you see photosynthesis happening around your home or school?",
            ])
            .waiting(),
            ScriptStep::narration(["Here's a trickier one. What pigment makes leaves green?"])
                .graded(
                    "Question: What pigment makes leaves green and captures light? \
                     Expected answer: chlorophyll. Chloroplast is the organelle, not the pigment; \
                     treat it as partially correct.",
                )
                .paced(PacingHint::Slow),
            ScriptStep::interaction([
                "Any questions about photosynthesis before we wrap up?",
                "Ask away, or tell me when you're ready to move on.",
            ])
            .graded(closing_questions_context("photosynthesis")),
            ScriptStep::complete(),
        ],
    }
}
