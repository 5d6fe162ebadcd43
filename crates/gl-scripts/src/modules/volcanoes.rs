use gl_core::{PacingHint, Script, ScriptStep};

use super::closing_questions_context;

pub(crate) fn script() -> Script {
    Script {
        id: "volcanoes".to_string(),
        title: "Volcanoes of the Philippines".to_string(),
        steps: vec![
            ScriptStep::narration([
                "The Philippines sits on the Pacific Ring of Fire.",
                "That's why we have so many volcanoes!",
            ])
            .paced(PacingHint::Fast),
            ScriptStep::narration([
                "A volcano forms where magma from deep inside the Earth finds a way to the surface. \
                 Magma that reaches the surface is called lava. Gases trapped in the magma build \
                 pressure, and that pressure drives an eruption.",
            ]),
            ScriptStep::narration([
                "Volcanoes can be active or inactive. Mayon and Taal are active volcanoes that have \
                 erupted in recorded history.",
            ])
            .paced(PacingHint::Slow),
            ScriptStep::narration(["Ready to test yourself? Say the word."]).waiting(),
            ScriptStep::interaction(["What do we call magma once it reaches the Earth's surface?"])
                .graded(
                    "Question: What do we call magma once it reaches the Earth's surface? \
                     Expected answer: lava.",
                ),
            ScriptStep::narration([
                "Viscosity matters too. Magma rich in silica is thick and traps gas, so eruptions \
                 tend to be explosive. Runny, low-silica magma lets gas escape and flows gently.",
            ]),
            ScriptStep::interaction(["Why might thick, silica-rich magma cause a more explosive eruption?"])
                .graded(
                    "Question: Why does thick, silica-rich magma cause explosive eruptions? \
                     Expected answer: high viscosity traps gases, so pressure builds until it is \
                     released violently. Mentioning only 'thick' without gas pressure is \
                     partially correct.",
                ),
            ScriptStep::interaction(["Have you or your family ever experienced ashfall? What was it like?"])
                .waiting(),
            ScriptStep::interaction([
                "Any questions about volcanoes?",
                "Ask away, or tell me when you're ready to finish.",
            ])
            .graded(closing_questions_context("volcanoes")),
            ScriptStep::complete(),
        ],
    }
}
