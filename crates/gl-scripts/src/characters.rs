use gl_core::CharacterProfile;

pub const DEFAULT_CHARACTER_ID: &str = "ka-tala";

pub fn roster() -> Vec<CharacterProfile> {
    vec![
        CharacterProfile {
            id: DEFAULT_CHARACTER_ID.to_string(),
            name: "Ka Tala".to_string(),
            persona: "a warm, patient science tutor who mixes English with a little Filipino and \
                      celebrates every small win"
                .to_string(),
        },
        CharacterProfile {
            id: "doc-bato".to_string(),
            name: "Doc Bato".to_string(),
            persona: "an enthusiastic volcanologist who loves field stories and explains ideas \
                      with everyday Philippine examples"
                .to_string(),
        },
        CharacterProfile {
            id: "ate-lia".to_string(),
            name: "Ate Lia".to_string(),
            persona: "a calm older-sister figure who studies medicine and keeps explanations short \
                      and concrete"
                .to_string(),
        },
    ]
}

pub fn default_character() -> CharacterProfile {
    character_or_default(DEFAULT_CHARACTER_ID)
}

pub fn character_or_default(id: &str) -> CharacterProfile {
    let mut characters = roster();
    let index = characters
        .iter()
        .position(|character| character.id == id)
        .unwrap_or(0);
    characters.swap_remove(index)
}

#[cfg(test)]
mod characters_tests {
    use super::*;

    #[test]
    fn known_character_is_returned() {
        assert_eq!(character_or_default("doc-bato").name, "Doc Bato");
    }

    #[test]
    fn unknown_character_falls_back_to_default() {
        assert_eq!(character_or_default("nobody").id, DEFAULT_CHARACTER_ID);
        assert_eq!(default_character().id, DEFAULT_CHARACTER_ID);
    }
}
