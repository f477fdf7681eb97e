pub mod http;

use async_trait::async_trait;
use std::error::Error;
use std::fmt;

use crate::models::chat::{ ChatRequest, UsageStats };

/// What a successful dispatch yields: the bot text plus optional usage stats.
#[derive(Clone, Debug)]
pub struct ChatResponse {
    pub response: String,
    pub stats: Option<UsageStats>,
}

/// Failure taxonomy for a single dispatch attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatError {
    /// No response at all (connect failure, timeout, DNS).
    Network(String),
    /// The endpoint answered with a non-2xx status.
    Transport {
        status: u16,
    },
    /// A well-formed envelope with `success: false`.
    Application {
        message: String,
    },
    /// Anything else (undecodable body, missing fields).
    Unknown(String),
}

impl fmt::Display for ChatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChatError::Network(detail) => write!(f, "network error: {}", detail),
            ChatError::Transport { status } => write!(f, "HTTP {} from chat endpoint", status),
            ChatError::Application { message } => write!(f, "API call failed: {}", message),
            ChatError::Unknown(detail) => write!(f, "unexpected chat failure: {}", detail),
        }
    }
}

impl Error for ChatError {}

/// The send capability the recovery flow depends on. Implementations must
/// not retry internally; retries belong to the recovery controller.
#[async_trait]
pub trait ChatDispatcher: Send + Sync {
    async fn dispatch(&self, request: &ChatRequest) -> Result<ChatResponse, ChatError>;

    /// Best-effort usage stats for the background refresher. `Ok(None)`
    /// means the backend answered but attached no stats.
    async fn fetch_stats(&self) -> Result<Option<UsageStats>, ChatError>;
}
