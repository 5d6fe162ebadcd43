use gl_core::{PacingHint, Script, ScriptStep};

use super::closing_questions_context;

pub(crate) fn script() -> Script {
    Script {
        id: "chemical_bonding".to_string(),
        title: "Ionic and Covalent Bonds".to_string(),
        steps: vec![
            ScriptStep::narration([
                "Atoms rarely like to be alone.",
                "They bond to become more stable.",
            ])
            .paced(PacingHint::Fast),
            ScriptStep::narration([
                "In an ionic bond, one atom gives electrons to another. The metal becomes a \
                 positive ion and the nonmetal becomes a negative ion, and the opposite charges \
                 attract. Table salt, sodium chloride, is held together this way.",
            ]),
            ScriptStep::narration([
                "In a covalent bond, two nonmetal atoms share electrons instead of transferring \
                 them. Water and carbon dioxide are covalent compounds.",
            ]),
            ScriptStep::narration(["Tell me when you're ready for a question."]).waiting(),
            ScriptStep::interaction(["What kind of bond forms when electrons are shared between atoms?"])
                .graded(
                    "Question: What kind of bond forms when atoms share electrons? \
                     Expected answer: a covalent bond. Ionic is incorrect because ionic bonds \
                     transfer electrons.",
                ),
            ScriptStep::narration([
                "Here's the pattern to remember: metal plus nonmetal usually means ionic. Nonmetal \
                 plus nonmetal usually means covalent.",
            ])
            .paced(PacingHint::Slow),
            ScriptStep::narration(["So what type of bond holds sodium chloride together?"]).graded(
                "Question: What type of bond holds sodium chloride together? \
                 Expected answer: an ionic bond, because sodium (a metal) transfers an electron \
                 to chlorine (a nonmetal).",
            ),
            ScriptStep::interaction(["Can you name a compound at home that might be covalent?"])
                .waiting(),
            ScriptStep::interaction([
                "Any questions about chemical bonds?",
                "Ask me, or let me know when you're ready to wrap up.",
            ])
            .graded(closing_questions_context("chemical bonding")),
            ScriptStep::complete(),
        ],
    }
}
