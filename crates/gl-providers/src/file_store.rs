use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use gl_core::{InteractionMessage, LessonError, ScenarioKey};
use gl_runtime::HistoryStore;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::debug;

use crate::error_map::{map_store_encode, map_store_invalid, map_store_read, map_store_write};

/// One JSON array of log messages per scenario, under `root`.
#[derive(Debug)]
pub struct JsonFileHistoryStore {
    root: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileHistoryStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, key: &ScenarioKey) -> PathBuf {
        self.root.join(format!(
            "{}__{}.json",
            escape(&key.character_id),
            escape(&key.location)
        ))
    }

    async fn read(&self, path: &Path) -> Result<Vec<InteractionMessage>, LessonError> {
        match fs::read_to_string(path).await {
            Ok(raw) => serde_json::from_str(&raw).map_err(map_store_invalid),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(error) => Err(map_store_read(error)),
        }
    }
}

#[async_trait]
impl HistoryStore for JsonFileHistoryStore {
    async fn load(&self, key: &ScenarioKey) -> Result<Vec<InteractionMessage>, LessonError> {
        self.read(&self.path_for(key)).await
    }

    async fn append(&self, key: &ScenarioKey, message: &InteractionMessage) -> Result<(), LessonError> {
        let _guard = self.write_lock.lock().await;
        let path = self.path_for(key);
        let mut messages = self.read(&path).await?;
        messages.push(message.clone());

        fs::create_dir_all(&self.root).await.map_err(map_store_write)?;
        let payload = serde_json::to_string_pretty(&messages).map_err(map_store_encode)?;
        fs::write(&path, payload).await.map_err(map_store_write)?;
        debug!(scenario = %key, count = messages.len(), "history appended");
        Ok(())
    }
}

/// Percent-encodes every byte outside `[A-Za-z0-9-]`. `_` is encoded too,
/// so the `__` separator never occurs inside an escaped part.
fn escape(part: &str) -> String {
    let mut escaped = String::with_capacity(part.len());
    for byte in part.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' {
            escaped.push(char::from(byte));
        } else {
            let _ = write!(escaped, "%{:02X}", byte);
        }
    }
    escaped
}

#[cfg(test)]
mod file_store_tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_root(name: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time")
            .as_nanos();
        std::env::temp_dir().join(format!("guided-lesson-{}-{}", name, nanos))
    }

    #[test]
    fn scenario_paths_are_escaped() {
        let store = JsonFileHistoryStore::new("/tmp/history");
        let key = ScenarioKey::for_module("ka-tala", "bio 1", "photosynthesis");
        assert_eq!(
            store.path_for(&key),
            PathBuf::from("/tmp/history/ka-tala__bio%201%2Fphotosynthesis.json")
        );
    }

    #[test]
    fn escaping_keeps_distinct_scenarios_apart() {
        let store = JsonFileHistoryStore::new("/tmp/history");
        let pairs = [
            (
                ScenarioKey::for_module("ka-tala", "bio", "chemical_bonding"),
                ScenarioKey::for_module("ka-tala", "bio/chemical", "bonding"),
            ),
            (
                ScenarioKey::for_module("ka-tala", "bio 1", "cells"),
                ScenarioKey::for_module("ka-tala", "bio_1", "cells"),
            ),
            (
                ScenarioKey::new("ka_tala", "cells"),
                ScenarioKey::new("ka", "tala__cells"),
            ),
        ];
        for (left, right) in pairs {
            assert_ne!(store.path_for(&left), store.path_for(&right), "{left} vs {right}");
        }
    }

    #[tokio::test]
    async fn lookalike_scenarios_keep_separate_histories() {
        let root = temp_root("lookalike");
        let store = JsonFileHistoryStore::new(&root);
        let nested = ScenarioKey::for_module("ka-tala", "bio", "chemical_bonding");
        let flat = ScenarioKey::for_module("ka-tala", "bio/chemical", "bonding");

        store
            .append(&nested, &InteractionMessage::assistant("What is an ionic bond?"))
            .await
            .expect("append");
        store
            .append(&flat, &InteractionMessage::assistant("What is a covalent bond?"))
            .await
            .expect("append");

        let nested_log = store.load(&nested).await.expect("load");
        let flat_log = store.load(&flat).await.expect("load");
        assert_eq!(nested_log.len(), 1);
        assert_eq!(nested_log[0].content, "What is an ionic bond?");
        assert_eq!(flat_log.len(), 1);
        assert_eq!(flat_log[0].content, "What is a covalent bond?");
        let _ = std::fs::remove_dir_all(root);
    }

    #[tokio::test]
    async fn missing_file_loads_as_empty_history() {
        let store = JsonFileHistoryStore::new(temp_root("missing"));
        let key = ScenarioKey::new("ka-tala", "nowhere");
        assert!(store.load(&key).await.expect("load").is_empty());
    }

    #[tokio::test]
    async fn appended_messages_round_trip_per_scenario() {
        let root = temp_root("append");
        let store = JsonFileHistoryStore::new(&root);
        let volcano = ScenarioKey::for_module("ka-tala", "earth-1", "volcanoes");
        let bonds = ScenarioKey::for_module("ka-tala", "chem-1", "chemical_bonding");

        store
            .append(&volcano, &InteractionMessage::assistant("What is magma?"))
            .await
            .expect("append");
        store
            .append(&volcano, &InteractionMessage::user("melted rock"))
            .await
            .expect("append");

        let stored = store.load(&volcano).await.expect("load");
        assert_eq!(
            stored.iter().map(|m| m.content.as_str()).collect::<Vec<_>>(),
            vec!["What is magma?", "melted rock"]
        );
        assert!(store.load(&bonds).await.expect("load").is_empty());

        let reopened = JsonFileHistoryStore::new(&root);
        assert_eq!(reopened.load(&volcano).await.expect("load"), stored);
        let _ = std::fs::remove_dir_all(root);
    }

    #[tokio::test]
    async fn corrupt_file_reports_invalid_store() {
        let root = temp_root("corrupt");
        std::fs::create_dir_all(&root).expect("create root");
        let store = JsonFileHistoryStore::new(&root);
        let key = ScenarioKey::new("ka-tala", "broken");
        std::fs::write(store.path_for(&key), "{not json").expect("write");

        let error = store.load(&key).await.expect_err("invalid");
        assert_eq!(error.code, "STORE_INVALID");
        let _ = std::fs::remove_dir_all(root);
    }
}
