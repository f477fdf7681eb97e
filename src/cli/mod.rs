use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    // --- Chat Backend Args ---
    /// Base URL of the chat backend.
    #[arg(long, env = "CHAT_BASE_URL", default_value = "http://127.0.0.1:8000")]
    pub base_url: String,

    /// Model to open the session with. A previously saved model choice wins;
    /// otherwise the fallback model is used.
    #[arg(long, env = "CHAT_MODEL")]
    pub model: Option<String>,

    /// Default model the session demotes to when retries exhaust.
    #[arg(long, env = "FALLBACK_MODEL", default_value = "standard-free")]
    pub fallback_model: String,

    // --- Retry Args ---
    /// Retry budget per send before falling back or giving up.
    #[arg(long, env = "MAX_RETRIES", default_value = "3")]
    pub max_retries: u32,

    /// Backoff unit in milliseconds; retry n waits n times this.
    #[arg(long, env = "RETRY_BACKOFF_MS", default_value = "1000")]
    pub retry_backoff_ms: u64,

    /// Delay before the post-fallback attempt, in milliseconds.
    #[arg(long, env = "FALLBACK_DELAY_MS", default_value = "1000")]
    pub fallback_delay_ms: u64,

    // --- Store Args ---
    /// Client state store type (memory, file, redis)
    #[arg(long, env = "STORE_TYPE", default_value = "file")]
    pub store_type: String,

    /// Path of the JSON document used by the file store.
    #[arg(long, env = "STORE_PATH", default_value = "chat_state.json")]
    pub store_path: String,

    /// Redis URL for the redis store (e.g., redis://127.0.0.1:6379)
    #[arg(long, env = "STORE_REDIS_URL", default_value = "redis://127.0.0.1:6379")]
    pub store_redis_url: String,

    /// Prefix for redis store keys.
    #[arg(long, env = "STORE_REDIS_PREFIX", default_value = "chat:")]
    pub store_redis_prefix: String,

    // --- Background Args ---
    /// Seconds between background stats refreshes. 0 disables the refresher.
    #[arg(long, env = "STATS_REFRESH_SECS", default_value = "30")]
    pub stats_refresh_secs: u64,

    /// Disable fire-and-forget error reporting to the backend.
    #[arg(long, env = "DISABLE_ERROR_REPORTS", default_value = "false")]
    pub disable_error_reports: bool,
}
