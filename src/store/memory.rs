use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use super::{ new_conversation_id, trim_history, ClientStore, StoreError };
use crate::models::chat::HistoryEntry;

#[derive(Default)]
struct MemoryState {
    conversation_id: Option<String>,
    history: Vec<HistoryEntry>,
    prefs: HashMap<String, String>,
}

/// Volatile store. The default for tests and for running against a
/// backend without leaving state behind.
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self { state: Mutex::new(MemoryState::default()) }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ClientStore for MemoryStore {
    async fn conversation_id(&self) -> Result<String, StoreError> {
        let mut state = self.state.lock().unwrap();
        if let Some(id) = &state.conversation_id {
            return Ok(id.clone());
        }
        let id = new_conversation_id();
        state.conversation_id = Some(id.clone());
        Ok(id)
    }

    async fn append_history(&self, entry: HistoryEntry) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();
        state.history.push(entry);
        trim_history(&mut state.history);
        Ok(())
    }

    async fn recent_history(&self, limit: usize) -> Result<Vec<HistoryEntry>, StoreError> {
        let state = self.state.lock().unwrap();
        let skip = state.history.len().saturating_sub(limit);
        Ok(state.history[skip..].to_vec())
    }

    async fn clear_history(&self) -> Result<(), StoreError> {
        self.state.lock().unwrap().history.clear();
        Ok(())
    }

    async fn get_pref(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.state.lock().unwrap().prefs.get(key).cloned())
    }

    async fn set_pref(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.state.lock().unwrap().prefs.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::HISTORY_CAP;

    fn entry(i: usize) -> HistoryEntry {
        HistoryEntry {
            user: format!("question {}", i),
            bot: format!("answer {}", i),
            timestamp: i as i64,
            model: "standard".to_string(),
        }
    }

    #[tokio::test]
    async fn history_is_bounded_to_the_newest_100() {
        let store = MemoryStore::new();
        for i in 0..HISTORY_CAP + 20 {
            store.append_history(entry(i)).await.unwrap();
        }

        let all = store.recent_history(HISTORY_CAP * 2).await.unwrap();
        assert_eq!(all.len(), HISTORY_CAP);
        assert_eq!(all.first().unwrap().user, "question 20");
        assert_eq!(all.last().unwrap().user, format!("question {}", HISTORY_CAP + 19));
    }

    #[tokio::test]
    async fn recent_history_returns_tail_oldest_first() {
        let store = MemoryStore::new();
        for i in 0..10 {
            store.append_history(entry(i)).await.unwrap();
        }

        let recent = store.recent_history(5).await.unwrap();
        assert_eq!(recent.len(), 5);
        assert_eq!(recent[0].user, "question 5");
        assert_eq!(recent[4].user, "question 9");
    }

    #[tokio::test]
    async fn conversation_id_is_generated_once() {
        let store = MemoryStore::new();
        let first = store.conversation_id().await.unwrap();
        let second = store.conversation_id().await.unwrap();
        assert!(first.starts_with("conv_"));
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn clear_empties_history_but_keeps_id_and_prefs() {
        let store = MemoryStore::new();
        let id = store.conversation_id().await.unwrap();
        store.set_pref("section", "chat").await.unwrap();
        store.append_history(entry(1)).await.unwrap();

        store.clear_history().await.unwrap();

        assert!(store.recent_history(10).await.unwrap().is_empty());
        assert_eq!(store.conversation_id().await.unwrap(), id);
        assert_eq!(store.get_pref("section").await.unwrap().as_deref(), Some("chat"));
    }

    #[tokio::test]
    async fn prefs_are_string_serialized() {
        let store = MemoryStore::new();
        assert!(store.get_pref("sidebar_collapsed").await.unwrap().is_none());
        store.set_pref("sidebar_collapsed", "true").await.unwrap();
        assert_eq!(
            store.get_pref("sidebar_collapsed").await.unwrap().as_deref(),
            Some("true")
        );
    }
}
