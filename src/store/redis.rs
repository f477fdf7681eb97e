use async_trait::async_trait;
use log::error;
use redis::{ AsyncCommands, Client };

use super::{ new_conversation_id, ClientStore, StoreError, HISTORY_CAP };
use crate::models::chat::HistoryEntry;

/// Redis-backed store. History lives in a list bounded with LTRIM, the
/// conversation id and prefs in plain string keys.
pub struct RedisStore {
    client: Client,
    key_prefix: String,
}

impl RedisStore {
    pub fn new(url: &str, key_prefix: String) -> Result<Self, StoreError> {
        Ok(Self {
            client: Client::open(url)?,
            key_prefix,
        })
    }

    async fn get_connection(&self) -> Result<redis::aio::MultiplexedConnection, redis::RedisError> {
        self.client.get_multiplexed_async_connection().await
    }

    fn history_key(&self) -> String {
        format!("{}history", self.key_prefix)
    }

    fn id_key(&self) -> String {
        format!("{}conversation_id", self.key_prefix)
    }

    fn pref_key(&self, key: &str) -> String {
        format!("{}pref:{}", self.key_prefix, key)
    }
}

#[async_trait]
impl ClientStore for RedisStore {
    async fn conversation_id(&self) -> Result<String, StoreError> {
        let mut conn = self.get_connection().await?;
        let existing: Option<String> = conn.get(self.id_key()).await?;
        if let Some(id) = existing {
            return Ok(id);
        }
        let id = new_conversation_id();
        let _: () = conn.set(self.id_key(), &id).await?;
        Ok(id)
    }

    async fn append_history(&self, entry: HistoryEntry) -> Result<(), StoreError> {
        let mut conn = self.get_connection().await?;
        let key = self.history_key();
        let json_entry = serde_json::to_string(&entry)?;
        let _: i64 = conn.lpush(&key, &json_entry).await?;
        let _: () = conn.ltrim(&key, 0, (HISTORY_CAP as isize) - 1).await?;
        Ok(())
    }

    async fn recent_history(&self, limit: usize) -> Result<Vec<HistoryEntry>, StoreError> {
        let mut conn = self.get_connection().await?;
        let json_entries: Vec<String> = conn
            .lrange(self.history_key(), 0, (limit as isize) - 1).await?;
        let mut entries = Vec::new();

        for json_entry in &json_entries {
            match serde_json::from_str::<HistoryEntry>(json_entry) {
                Ok(entry) => entries.push(entry),
                Err(e) => {
                    error!("Error parsing history entry: {}", e);
                }
            }
        }
        // Stored newest-first; callers expect oldest-first.
        entries.reverse();
        Ok(entries)
    }

    async fn clear_history(&self) -> Result<(), StoreError> {
        let mut conn = self.get_connection().await?;
        let _: () = conn.del(self.history_key()).await?;
        Ok(())
    }

    async fn get_pref(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut conn = self.get_connection().await?;
        let value: Option<String> = conn.get(self.pref_key(key)).await?;
        Ok(value)
    }

    async fn set_pref(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut conn = self.get_connection().await?;
        let _: () = conn.set(self.pref_key(key), value).await?;
        Ok(())
    }
}
