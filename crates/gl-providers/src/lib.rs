mod error_map;
pub mod file_store;
pub mod offline;
pub mod openai;

pub use file_store::JsonFileHistoryStore;
pub use offline::OfflineGenerator;
pub use openai::{OpenAiCompatibleClient, ProviderSettings};
