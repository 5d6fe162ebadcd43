use std::path::{Path, PathBuf};
use std::time::Duration;

use gl_core::LessonError;
use gl_runtime::{GenerationConfig, RetryPolicy, TimingConfig};
use serde::Deserialize;
use tracing::info;

pub const ENV_API_BASE_URL: &str = "GL_API_BASE_URL";
pub const ENV_API_KEY: &str = "GL_API_KEY";
pub const ENV_MODEL: &str = "GL_MODEL";
pub const ENV_HISTORY_DIR: &str = "GL_HISTORY_DIR";
pub const ENV_REQUEST_TIMEOUT_SECS: &str = "GL_REQUEST_TIMEOUT_SECS";

#[derive(Debug, Clone, PartialEq)]
pub struct LessonConfig {
    pub api_base_url: String,
    /// No key means lessons run on the offline generator.
    pub api_key: Option<String>,
    pub model: String,
    /// No directory means history is kept in memory for the session only.
    pub history_dir: Option<PathBuf>,
    pub request_timeout: Duration,
    pub timing: TimingConfig,
    pub generation: GenerationConfig,
    pub retry: RetryPolicy,
}

impl Default for LessonConfig {
    fn default() -> Self {
        Self {
            api_base_url: gl_providers::openai::DEFAULT_BASE_URL.to_string(),
            api_key: None,
            model: gl_providers::openai::DEFAULT_MODEL.to_string(),
            history_dir: None,
            request_timeout: gl_providers::openai::DEFAULT_REQUEST_TIMEOUT,
            timing: TimingConfig::default(),
            generation: GenerationConfig::default(),
            retry: RetryPolicy::default(),
        }
    }
}

/// Optional sections of a `--config` JSON file.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct ConfigOverlay {
    model: Option<String>,
    timing: Option<TimingConfig>,
    generation: Option<GenerationConfig>,
    retry: Option<RetryPolicy>,
}

impl LessonConfig {
    pub fn from_env() -> Result<Self, LessonError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, LessonError> {
        let read = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let mut config = Self::default();
        if let Some(base_url) = read(ENV_API_BASE_URL) {
            config.api_base_url = base_url;
        }
        config.api_key = read(ENV_API_KEY);
        if let Some(model) = read(ENV_MODEL) {
            config.model = model;
        }
        config.history_dir = read(ENV_HISTORY_DIR).map(PathBuf::from);
        if let Some(raw) = read(ENV_REQUEST_TIMEOUT_SECS) {
            let secs = raw.parse::<u64>().map_err(|_| {
                LessonError::new(
                    "CONFIG_INVALID_TIMEOUT",
                    format!("{} must be a whole number of seconds, got \"{}\".", ENV_REQUEST_TIMEOUT_SECS, raw),
                )
            })?;
            config.request_timeout = Duration::from_secs(secs);
        }
        Ok(config)
    }

    pub fn load_overlay(&mut self, path: &Path) -> Result<(), LessonError> {
        let raw = std::fs::read_to_string(path).map_err(|error| {
            LessonError::new(
                "CONFIG_READ_FAILED",
                format!("Cannot read config file {}: {}", path.display(), error),
            )
        })?;
        self.apply_overlay_json(&raw)
    }

    pub fn apply_overlay_json(&mut self, raw: &str) -> Result<(), LessonError> {
        let overlay: ConfigOverlay = serde_json::from_str(raw)
            .map_err(|error| LessonError::new("CONFIG_INVALID", error.to_string()))?;
        if let Some(model) = overlay.model {
            self.model = model;
        }
        if let Some(timing) = overlay.timing {
            self.timing = timing;
        }
        if let Some(generation) = overlay.generation {
            self.generation = generation;
        }
        if let Some(retry) = overlay.retry {
            if retry.max_attempts == 0 {
                return Err(LessonError::new(
                    "CONFIG_INVALID",
                    "retry.maxAttempts must be at least 1.",
                ));
            }
            self.retry = retry;
        }
        Ok(())
    }

    pub fn is_offline(&self) -> bool {
        self.api_key.is_none()
    }

    pub fn log_summary(&self) {
        fn preview(key: &str) -> String {
            let shown = key.chars().take(5).collect::<String>();
            format!("{}...({} chars)", shown, key.chars().count())
        }
        info!(
            base_url = %self.api_base_url,
            model = %self.model,
            api_key = %self.api_key.as_deref().map(preview).unwrap_or_else(|| "<offline>".to_string()),
            history_dir = ?self.history_dir,
            max_attempts = self.retry.max_attempts,
            "lesson config loaded"
        );
    }
}
