use std::sync::Arc;

use gl_core::LessonError;
use gl_providers::{JsonFileHistoryStore, OfflineGenerator, OpenAiCompatibleClient, ProviderSettings};
use gl_runtime::{
    DialogueEngine, DialogueEngineOptions, HistoryStore, InMemoryHistoryStore, TextGenerator,
};
use gl_scripts::ScriptRegistry;
use tracing::info;

pub mod config;

pub use config::LessonConfig;

#[derive(Clone)]
pub struct CreateLessonEngineOptions {
    pub config: LessonConfig,
    /// Defaults to the built-in Grade 9 science modules.
    pub registry: Option<Arc<ScriptRegistry>>,
    /// Use the offline generator even when an API key is configured.
    pub force_offline: bool,
}

impl CreateLessonEngineOptions {
    pub fn new(config: LessonConfig) -> Self {
        Self {
            config,
            registry: None,
            force_offline: false,
        }
    }
}

pub fn build_generator(
    config: &LessonConfig,
    force_offline: bool,
) -> Result<Arc<dyn TextGenerator>, LessonError> {
    match (&config.api_key, force_offline) {
        (Some(api_key), false) => {
            info!(model = %config.model, "using OpenAI-compatible generator");
            let client = OpenAiCompatibleClient::new(ProviderSettings {
                base_url: config.api_base_url.clone(),
                api_key: api_key.clone(),
                model: config.model.clone(),
                request_timeout: config.request_timeout,
            })?;
            Ok(Arc::new(client))
        }
        _ => {
            info!("using offline generator");
            Ok(Arc::new(OfflineGenerator::new()))
        }
    }
}

pub fn build_history_store(config: &LessonConfig) -> Arc<dyn HistoryStore> {
    match &config.history_dir {
        Some(dir) => Arc::new(JsonFileHistoryStore::new(dir.clone())),
        None => Arc::new(InMemoryHistoryStore::new()),
    }
}

pub fn create_lesson_engine(
    options: CreateLessonEngineOptions,
) -> Result<DialogueEngine, LessonError> {
    let CreateLessonEngineOptions {
        config,
        registry,
        force_offline,
    } = options;
    let generator = build_generator(&config, force_offline)?;
    let history = build_history_store(&config);
    let registry = registry.unwrap_or_else(|| Arc::new(ScriptRegistry::builtin()));

    Ok(DialogueEngine::new(DialogueEngineOptions {
        registry,
        generator,
        history,
        timing: config.timing,
        generation: config.generation,
        retry: config.retry,
    }))
}
