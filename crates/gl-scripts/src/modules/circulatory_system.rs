use gl_core::{PacingHint, Script, ScriptStep};

use super::closing_questions_context;

pub(crate) fn script() -> Script {
    Script {
        id: "circulatory_system".to_string(),
        title: "The Circulatory System".to_string(),
        steps: vec![
            ScriptStep::narration([
                "Put your hand on your chest.",
                "Feel that beat? That's your heart at work.",
            ])
            .paced(PacingHint::Fast),
            ScriptStep::narration([
                "The circulatory system moves blood around your body. It has three main parts: the \
                 heart, the blood vessels, and the blood itself. Arteries carry blood away from \
                 the heart. Veins bring it back. Capillaries connect the two and are where \
                 exchange with the cells happens.",
            ]),
            ScriptStep::narration(["Let me know when you're ready for a question."]).waiting(),
            ScriptStep::interaction(["Which blood vessels carry blood away from the heart?"]).graded(
                "Question: Which blood vessels carry blood away from the heart? \
                 Expected answer: arteries. Veins return blood to the heart; capillaries connect \
                 arteries and veins.",
            ),
            ScriptStep::narration([
                "The heart has four chambers: two atria on top and two ventricles below.\n\n\
                 The right side pumps blood to the lungs to pick up oxygen. The left side pumps \
                 oxygen-rich blood out to the rest of the body.",
            ])
            .paced(PacingHint::Slow),
            ScriptStep::interaction(["Why do you think your heart beats faster when you run?"])
                .waiting(),
            ScriptStep::interaction([
                "Which chamber of the heart pumps oxygen-rich blood to the whole body?",
            ])
            .graded(
                "Question: Which chamber pumps oxygen-rich blood to the whole body? \
                 Expected answer: the left ventricle. 'Left side' or 'ventricle' alone is \
                 partially correct.",
            ),
            ScriptStep::interaction([
                "Do you have any questions about the heart and blood vessels?",
                "Ask me anything, or tell me when you're ready to continue.",
            ])
            .graded(closing_questions_context("the circulatory system")),
            ScriptStep::complete(),
        ],
    }
}
