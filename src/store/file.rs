use async_trait::async_trait;
use serde::{ Serialize, Deserialize };
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use super::{ new_conversation_id, trim_history, ClientStore, StoreError };
use crate::models::chat::HistoryEntry;

#[derive(Default, Serialize, Deserialize)]
struct StoreDocument {
    conversation_id: Option<String>,
    #[serde(default)]
    history: Vec<HistoryEntry>,
    #[serde(default)]
    prefs: HashMap<String, String>,
}

/// Single-JSON-document store on local disk. Each operation reloads,
/// mutates and rewrites the document under one lock, so operations from
/// one process never interleave.
pub struct FileStore {
    path: PathBuf,
    guard: Mutex<()>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), guard: Mutex::new(()) }
    }

    fn load(&self) -> Result<StoreDocument, StoreError> {
        match fs::read_to_string(&self.path) {
            Ok(text) => Ok(serde_json::from_str(&text)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(StoreDocument::default()),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, doc: &StoreDocument) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&self.path, serde_json::to_string_pretty(doc)?)?;
        Ok(())
    }
}

#[async_trait]
impl ClientStore for FileStore {
    async fn conversation_id(&self) -> Result<String, StoreError> {
        let _lock = self.guard.lock().unwrap();
        let mut doc = self.load()?;
        if let Some(id) = &doc.conversation_id {
            return Ok(id.clone());
        }
        let id = new_conversation_id();
        doc.conversation_id = Some(id.clone());
        self.save(&doc)?;
        Ok(id)
    }

    async fn append_history(&self, entry: HistoryEntry) -> Result<(), StoreError> {
        let _lock = self.guard.lock().unwrap();
        let mut doc = self.load()?;
        doc.history.push(entry);
        trim_history(&mut doc.history);
        self.save(&doc)
    }

    async fn recent_history(&self, limit: usize) -> Result<Vec<HistoryEntry>, StoreError> {
        let _lock = self.guard.lock().unwrap();
        let doc = self.load()?;
        let skip = doc.history.len().saturating_sub(limit);
        Ok(doc.history[skip..].to_vec())
    }

    async fn clear_history(&self) -> Result<(), StoreError> {
        let _lock = self.guard.lock().unwrap();
        let mut doc = self.load()?;
        doc.history.clear();
        self.save(&doc)
    }

    async fn get_pref(&self, key: &str) -> Result<Option<String>, StoreError> {
        let _lock = self.guard.lock().unwrap();
        Ok(self.load()?.prefs.get(key).cloned())
    }

    async fn set_pref(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let _lock = self.guard.lock().unwrap();
        let mut doc = self.load()?;
        doc.prefs.insert(key.to_string(), value.to_string());
        self.save(&doc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::HISTORY_CAP;

    fn entry(i: usize) -> HistoryEntry {
        HistoryEntry {
            user: format!("q{}", i),
            bot: format!("a{}", i),
            timestamp: i as i64,
            model: "standard".to_string(),
        }
    }

    #[tokio::test]
    async fn state_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chat_state.json");

        let id = {
            let store = FileStore::new(&path);
            store.append_history(entry(1)).await.unwrap();
            store.set_pref("model", "premium").await.unwrap();
            store.conversation_id().await.unwrap()
        };

        let reopened = FileStore::new(&path);
        assert_eq!(reopened.conversation_id().await.unwrap(), id);
        assert_eq!(reopened.get_pref("model").await.unwrap().as_deref(), Some("premium"));
        let history = reopened.recent_history(10).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].user, "q1");
    }

    #[tokio::test]
    async fn missing_file_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("absent.json"));
        assert!(store.recent_history(10).await.unwrap().is_empty());
        assert!(store.get_pref("model").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn history_is_bounded_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("chat_state.json"));
        for i in 0..HISTORY_CAP + 5 {
            store.append_history(entry(i)).await.unwrap();
        }

        let all = store.recent_history(HISTORY_CAP * 2).await.unwrap();
        assert_eq!(all.len(), HISTORY_CAP);
        assert_eq!(all.first().unwrap().user, "q5");
    }
}
