use std::collections::BTreeMap;

use gl_core::{LessonError, Script, ScriptStep};

use crate::modules::builtin_scripts;

pub const FALLBACK_SCRIPT_ID: &str = "generic_completion";

/// Single-step script used for any module id the registry does not know.
pub fn fallback_script() -> Script {
    Script {
        id: FALLBACK_SCRIPT_ID.to_string(),
        title: "Module Complete".to_string(),
        steps: vec![ScriptStep::complete()],
    }
}

/// Closed set of lesson scripts keyed by module id.
#[derive(Debug, Clone)]
pub struct ScriptRegistry {
    scripts: BTreeMap<String, Script>,
    fallback: Script,
}

impl ScriptRegistry {
    pub fn builtin() -> Self {
        let scripts = builtin_scripts()
            .into_iter()
            .map(|script| (script.id.clone(), script))
            .collect();
        Self {
            scripts,
            fallback: fallback_script(),
        }
    }

    pub fn from_scripts(scripts: impl IntoIterator<Item = Script>) -> Result<Self, LessonError> {
        let mut by_id = BTreeMap::new();
        for script in scripts {
            if script.id == FALLBACK_SCRIPT_ID {
                return Err(LessonError::new(
                    "REGISTRY_RESERVED_ID",
                    format!("Script id \"{}\" is reserved for the fallback.", script.id),
                ));
            }
            if by_id.contains_key(&script.id) {
                return Err(LessonError::new(
                    "REGISTRY_DUPLICATE_SCRIPT",
                    format!("Script \"{}\" is registered twice.", script.id),
                ));
            }
            by_id.insert(script.id.clone(), script);
        }
        Ok(Self {
            scripts: by_id,
            fallback: fallback_script(),
        })
    }

    pub fn get(&self, module_id: &str) -> Option<&Script> {
        self.scripts.get(module_id)
    }

    pub fn resolve(&self, module_id: &str) -> &Script {
        self.get(module_id).unwrap_or(&self.fallback)
    }

    pub fn contains(&self, module_id: &str) -> bool {
        self.scripts.contains_key(module_id)
    }

    pub fn module_ids(&self) -> impl Iterator<Item = &str> {
        self.scripts.keys().map(String::as_str)
    }

    pub fn scripts(&self) -> impl Iterator<Item = &Script> {
        self.scripts.values()
    }

    pub fn fallback(&self) -> &Script {
        &self.fallback
    }

    pub fn len(&self) -> usize {
        self.scripts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scripts.is_empty()
    }
}

impl Default for ScriptRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
