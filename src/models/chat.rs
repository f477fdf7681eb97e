use serde::{ Serialize, Deserialize };

/// Wire body for a single chat dispatch: `{message, model, conversation_id}`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    pub model: String,
    pub conversation_id: String,
}

/// Usage counters the backend attaches to successful replies.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UsageStats {
    pub wallet: f64,
    #[serde(default)]
    pub chats_count: u64,
    pub total_earned: f64,
}

/// One completed exchange as kept in the bounded history.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub user: String,
    pub bot: String,
    pub timestamp: i64,
    pub model: String,
}
