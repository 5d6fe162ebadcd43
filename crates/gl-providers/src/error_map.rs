use std::fmt::Display;

use gl_core::LessonError;

fn map_error(code: &'static str, error: impl Display) -> LessonError {
    LessonError::new(code, error.to_string())
}

pub(crate) fn map_store_read(error: std::io::Error) -> LessonError {
    map_error("STORE_READ_FAILED", error)
}

pub(crate) fn map_store_write(error: std::io::Error) -> LessonError {
    map_error("STORE_WRITE_FAILED", error)
}

pub(crate) fn map_store_invalid(error: serde_json::Error) -> LessonError {
    map_error("STORE_INVALID", error)
}

pub(crate) fn map_store_encode(error: serde_json::Error) -> LessonError {
    map_error("STORE_ENCODE_FAILED", error)
}

pub(crate) fn map_provider_client(error: reqwest::Error) -> LessonError {
    map_error("PROVIDER_CLIENT", error)
}

/// Keeps the whole `anyhow` context chain in the message.
pub(crate) fn map_provider(code: &'static str, error: anyhow::Error) -> LessonError {
    LessonError::new(code, format!("{error:#}"))
}
