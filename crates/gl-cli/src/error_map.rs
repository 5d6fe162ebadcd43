use std::fmt::Display;

use gl_core::LessonError;

fn map_error(code: &'static str, error: impl Display) -> LessonError {
    LessonError::new(code, error.to_string())
}

pub(crate) fn emit_error(error: LessonError) -> i32 {
    println!("RESULT:ERROR");
    println!("ERROR_CODE:{}", error.code);
    println!(
        "ERROR_MSG_JSON:{}",
        serde_json::to_string(&error.message).unwrap_or_else(|_| "\"Unknown error\"".to_string())
    );
    1
}

pub(crate) fn map_cli_io(error: std::io::Error) -> LessonError {
    map_error("CLI_IO", error)
}

pub(crate) fn map_cli_runtime(error: std::io::Error) -> LessonError {
    map_error("CLI_RUNTIME", error)
}
