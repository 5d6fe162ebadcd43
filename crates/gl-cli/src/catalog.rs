use std::io::Write;

use gl_core::LessonError;
use gl_scripts::{validate_registry, ScriptRegistry};

use crate::map_cli_io;

pub(crate) fn run_modules(registry: &ScriptRegistry, writer: &mut dyn Write) -> Result<i32, LessonError> {
    for script in registry.scripts() {
        writeln!(writer, "MODULE:{}|{}", script.id, script.title).map_err(map_cli_io)?;
    }
    Ok(0)
}

pub(crate) fn run_validate(registry: &ScriptRegistry, writer: &mut dyn Write) -> Result<i32, LessonError> {
    let issues = validate_registry(registry);
    if issues.is_empty() {
        writeln!(writer, "RESULT:OK").map_err(map_cli_io)?;
        return Ok(0);
    }

    for issue in issues {
        let step = issue
            .step_index
            .map(|index| index.to_string())
            .unwrap_or_else(|| "-".to_string());
        writeln!(writer, "ISSUE:{}|{}|{}", issue.script_id, step, issue.kind.code())
            .map_err(map_cli_io)?;
    }
    Ok(1)
}
