pub mod characters;
mod modules;
pub mod registry;
pub mod validate;

pub use characters::{character_or_default, default_character, roster, DEFAULT_CHARACTER_ID};
pub use registry::{fallback_script, ScriptRegistry, FALLBACK_SCRIPT_ID};
pub use validate::{validate_registry, validate_script, IssueKind, ScriptIssue};
