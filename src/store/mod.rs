pub mod memory;
pub mod file;
pub mod redis;

use async_trait::async_trait;
use chrono::Utc;
use log::info;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use crate::cli::Args;
use crate::models::chat::HistoryEntry;

/// History is capacity-bounded: only the most recent entries survive.
pub const HISTORY_CAP: usize = 100;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store io error: {0}")] Io(#[from] std::io::Error),
    #[error("store serialization error: {0}")] Json(#[from] serde_json::Error),
    #[error("redis store error: {0}")] Redis(#[from] ::redis::RedisError),
    #[error("unsupported store type: {0}")] UnsupportedType(String),
}

/// The persistence seam the session depends on. Everything crossing it is
/// plain data; values behind `get_pref`/`set_pref` are string-serialized.
#[async_trait]
pub trait ClientStore: Send + Sync {
    /// The persisted conversation id, generated on first call.
    async fn conversation_id(&self) -> Result<String, StoreError>;

    /// Append one exchange, discarding the oldest entries beyond
    /// [`HISTORY_CAP`].
    async fn append_history(&self, entry: HistoryEntry) -> Result<(), StoreError>;

    /// The last `limit` entries, oldest first.
    async fn recent_history(&self, limit: usize) -> Result<Vec<HistoryEntry>, StoreError>;

    async fn clear_history(&self) -> Result<(), StoreError>;

    async fn get_pref(&self, key: &str) -> Result<Option<String>, StoreError>;

    async fn set_pref(&self, key: &str, value: &str) -> Result<(), StoreError>;
}

pub fn create_store(args: &Args) -> Result<Arc<dyn ClientStore>, StoreError> {
    match args.store_type.to_lowercase().as_str() {
        "memory" => Ok(Arc::new(memory::MemoryStore::new())),
        "file" => Ok(Arc::new(file::FileStore::new(args.store_path.clone()))),
        "redis" => {
            let store = redis::RedisStore::new(
                &args.store_redis_url,
                args.store_redis_prefix.clone()
            )?;
            Ok(Arc::new(store))
        }
        other => Err(StoreError::UnsupportedType(other.to_string())),
    }
}

pub fn initialize_store(args: &Args) -> Result<Arc<dyn ClientStore>, StoreError> {
    info!("Client state will be stored in: {}", args.store_type);
    create_store(args)
}

/// `conv_<millis>_<suffix>` — the suffix keeps ids unique within one
/// millisecond.
pub fn new_conversation_id() -> String {
    let suffix: String = Uuid::new_v4().simple().to_string().chars().take(9).collect();
    format!("conv_{}_{}", Utc::now().timestamp_millis(), suffix)
}

/// Keep only the newest [`HISTORY_CAP`] entries, preserving order.
pub(crate) fn trim_history(history: &mut Vec<HistoryEntry>) {
    if history.len() > HISTORY_CAP {
        let excess = history.len() - HISTORY_CAP;
        history.drain(..excess);
    }
}
