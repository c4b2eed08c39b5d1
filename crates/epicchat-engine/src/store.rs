use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::Context;
use epicchat_contracts::history::{
    ConversationLog, LearningLog, LearningRecord, Message, DEFAULT_HISTORY_CAPACITY,
    DEFAULT_LEARNING_CAPACITY,
};
use epicchat_contracts::profile::{AvatarProfile, Preferences};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

pub const PREFERENCES_KEY: &str = "epicchat-preferences";
pub const CHAT_HISTORY_KEY: &str = "epicchat-chat-history";
pub const AVATAR_KEY: &str = "epicchat-avatar";
pub const LEARNING_DATA_KEY: &str = "epicchat-learning-data";

/// String blobs under string keys.
pub trait KeyValueStore: Send {
    fn get(&self, key: &str) -> anyhow::Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> anyhow::Result<()>;
}

/// One `<key>.json` file per key inside `dir`.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        let raw = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Ok(Some(raw))
    }

    fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("failed to create {}", self.dir.display()))?;
        let path = self.path_for(key);
        std::fs::write(&path, value).with_context(|| format!("failed to write {}", path.display()))
    }
}

/// In-process store. Clones share the same entries.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<BTreeMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| anyhow::anyhow!("memory store lock poisoned"))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| anyhow::anyhow!("memory store lock poisoned"))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PersistedState {
    pub preferences: Preferences,
    pub avatar: AvatarProfile,
    pub chat_history: ConversationLog,
    pub learning_log: LearningLog,
}

impl Default for PersistedState {
    fn default() -> Self {
        Self {
            preferences: Preferences::default(),
            avatar: AvatarProfile::default(),
            chat_history: ConversationLog::new(DEFAULT_HISTORY_CAPACITY),
            learning_log: LearningLog::new(DEFAULT_LEARNING_CAPACITY),
        }
    }
}

/// Loads and saves the four persisted categories independently of each other.
pub struct PersistenceStore {
    backend: Box<dyn KeyValueStore>,
    history_capacity: usize,
    learning_capacity: usize,
}

impl PersistenceStore {
    pub fn new(backend: impl KeyValueStore + 'static) -> Self {
        Self {
            backend: Box::new(backend),
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            learning_capacity: DEFAULT_LEARNING_CAPACITY,
        }
    }

    pub fn with_capacities(mut self, history_capacity: usize, learning_capacity: usize) -> Self {
        self.history_capacity = history_capacity;
        self.learning_capacity = learning_capacity;
        self
    }

    /// Missing or unreadable categories fall back to their defaults; the rest
    /// load normally.
    pub fn load(&self) -> PersistedState {
        let preferences = self
            .read_value(PREFERENCES_KEY)
            .map(|stored| Preferences::merged(&stored))
            .unwrap_or_default();
        let avatar = self
            .read_value(AVATAR_KEY)
            .map(|stored| AvatarProfile::merged(&stored))
            .unwrap_or_default();
        let messages: Vec<Message> = self.read_list(CHAT_HISTORY_KEY);
        let records: Vec<LearningRecord> = self.read_list(LEARNING_DATA_KEY);

        PersistedState {
            preferences,
            avatar,
            chat_history: ConversationLog::from_messages(messages, self.history_capacity),
            learning_log: LearningLog::from_entries(records, self.learning_capacity),
        }
    }

    /// Writes every category. Returns false if any write failed; failures are
    /// logged and never surfaced as errors.
    pub fn save(&self, state: &PersistedState) -> bool {
        let results = [
            self.write_value(PREFERENCES_KEY, &state.preferences),
            self.write_value(CHAT_HISTORY_KEY, state.chat_history.messages()),
            self.write_value(AVATAR_KEY, &state.avatar),
            self.write_value(LEARNING_DATA_KEY, state.learning_log.entries()),
        ];
        results.iter().all(|saved| *saved)
    }

    fn read_value(&self, key: &str) -> Option<Value> {
        let raw = match self.backend.get(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(err) => {
                tracing::warn!(key, error = %err, "failed to read stored record");
                return None;
            }
        };
        match serde_json::from_str::<Value>(&raw) {
            Ok(value) => Some(value),
            Err(err) => {
                tracing::warn!(
                    key,
                    error = %err,
                    "stored record is not valid JSON, using defaults"
                );
                None
            }
        }
    }

    fn read_list<T: DeserializeOwned>(&self, key: &str) -> Vec<T> {
        let Some(value) = self.read_value(key) else {
            return Vec::new();
        };
        let Value::Array(items) = value else {
            tracing::warn!(key, "stored record is not a list, using defaults");
            return Vec::new();
        };
        let total = items.len();
        let parsed: Vec<T> = items
            .into_iter()
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect();
        if parsed.len() < total {
            tracing::warn!(
                key,
                skipped = total - parsed.len(),
                "skipped malformed stored entries"
            );
        }
        parsed
    }

    fn write_value<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> bool {
        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(err) => {
                tracing::warn!(key, error = %err, "failed to serialize record");
                return false;
            }
        };
        match self.backend.set(key, &raw) {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!(key, error = %err, "failed to save record");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use epicchat_contracts::history::{LearningRecord, Message, Sender};
    use epicchat_contracts::profile::{AvatarProfile, Preferences, Theme};
    use serde_json::json;

    use super::*;

    struct FailingStore;

    impl KeyValueStore for FailingStore {
        fn get(&self, _key: &str) -> anyhow::Result<Option<String>> {
            anyhow::bail!("quota exceeded")
        }

        fn set(&self, _key: &str, _value: &str) -> anyhow::Result<()> {
            anyhow::bail!("quota exceeded")
        }
    }

    fn sample_state() -> PersistedState {
        let mut state = PersistedState::default();
        state.preferences.theme = Theme::Dark;
        state.preferences.learning_rate = 8;
        state.avatar.name = "Nova".to_string();
        state
            .chat_history
            .append(Message::new("hello", Sender::User, "9:00:00 AM"));
        state
            .chat_history
            .append(Message::new("Hi there!", Sender::Assistant, "9:00:02 AM"));
        state
            .learning_log
            .push(LearningRecord::from_input("I love mountain lakes"));
        state
    }

    #[test]
    fn file_store_round_trips_all_categories() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let dir = temp.path().join("store");
        let store = PersistenceStore::new(FileStore::new(&dir));

        let state = sample_state();
        assert!(store.save(&state));
        assert!(dir.join("epicchat-chat-history.json").exists());
        assert_eq!(store.load(), state);
        Ok(())
    }

    #[test]
    fn empty_backend_loads_defaults() {
        let store = PersistenceStore::new(MemoryStore::new());
        assert_eq!(store.load(), PersistedState::default());
    }

    #[test]
    fn corrupted_history_leaves_other_categories_intact() -> anyhow::Result<()> {
        let backend = MemoryStore::new();
        let store = PersistenceStore::new(backend.clone());
        let state = sample_state();
        store.save(&state);
        backend.set(CHAT_HISTORY_KEY, "{not json")?;

        let loaded = store.load();
        assert!(loaded.chat_history.is_empty());
        assert_eq!(loaded.preferences, state.preferences);
        assert_eq!(loaded.avatar, state.avatar);
        assert_eq!(loaded.learning_log, state.learning_log);
        Ok(())
    }

    #[test]
    fn partial_records_merge_over_defaults() -> anyhow::Result<()> {
        let backend = MemoryStore::new();
        backend.set(
            PREFERENCES_KEY,
            &json!({"theme": "dark", "voice": 7, "extra": true}).to_string(),
        )?;
        backend.set(AVATAR_KEY, &json!({"name": "Nova"}).to_string())?;
        backend.set(
            CHAT_HISTORY_KEY,
            &json!([
                {"content": "kept", "sender": "user", "timestamp": "1:00:00 PM"},
                {"content": 3},
            ])
            .to_string(),
        )?;

        let loaded = PersistenceStore::new(backend).load();
        assert_eq!(loaded.preferences.theme, Theme::Dark);
        assert_eq!(loaded.preferences.voice, Preferences::default().voice);
        assert_eq!(loaded.avatar.name, "Nova");
        assert_eq!(loaded.avatar.image, AvatarProfile::default().image);
        assert_eq!(loaded.chat_history.len(), 1);
        assert_eq!(loaded.chat_history.messages()[0].content, "kept");
        Ok(())
    }

    #[test]
    fn oversized_history_is_trimmed_on_load() -> anyhow::Result<()> {
        let backend = MemoryStore::new();
        let messages: Vec<Message> = (0..150)
            .map(|idx| Message::new(format!("message {idx}"), Sender::User, "t"))
            .collect();
        backend.set(CHAT_HISTORY_KEY, &serde_json::to_string(&messages)?)?;

        let loaded = PersistenceStore::new(backend).load();
        assert_eq!(loaded.chat_history.len(), 100);
        let recent = loaded.chat_history.recent(20);
        assert_eq!(recent.len(), 20);
        assert_eq!(recent[0].content, "message 130");
        assert_eq!(recent[19].content, "message 149");
        Ok(())
    }

    #[test]
    fn failing_backend_is_swallowed() {
        let store = PersistenceStore::new(FailingStore);
        assert!(!store.save(&sample_state()));
        assert_eq!(store.load(), PersistedState::default());
    }
}
