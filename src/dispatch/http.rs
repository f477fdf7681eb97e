use async_trait::async_trait;
use reqwest::{ Client as HttpClient, header::{ HeaderMap, HeaderValue, CONTENT_TYPE } };
use serde::Deserialize;

use super::{ ChatDispatcher, ChatError, ChatResponse };
use crate::cli::Args;
use crate::models::chat::{ ChatRequest, UsageStats };

const CHAT_ROUTE: &str = "/api/chat";
const STATS_ROUTE: &str = "/api/user/stats";

/// Response envelope for the chat endpoint. A `success: false` body is a
/// dispatch failure even when the HTTP status is 2xx.
#[derive(Deserialize)]
struct ChatEnvelope {
    success: bool,
    response: Option<String>,
    message: Option<String>,
    stats: Option<UsageStats>,
}

#[derive(Deserialize)]
struct StatsEnvelope {
    success: bool,
    stats: Option<UsageStats>,
}

pub struct HttpDispatcher {
    http: HttpClient,
    base_url: String,
}

impl HttpDispatcher {
    pub fn new(base_url: String) -> Result<Self, ChatError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert("X-Requested-With", HeaderValue::from_static("XMLHttpRequest"));

        let http = HttpClient::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| ChatError::Unknown(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_args(args: &Args) -> Result<Self, ChatError> {
        Self::new(args.base_url.clone())
    }

    fn url(&self, route: &str) -> String {
        format!("{}{}", self.base_url, route)
    }
}

#[async_trait]
impl ChatDispatcher for HttpDispatcher {
    async fn dispatch(&self, request: &ChatRequest) -> Result<ChatResponse, ChatError> {
        let resp = self.http
            .post(self.url(CHAT_ROUTE))
            .json(request)
            .send().await
            .map_err(|e| ChatError::Network(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ChatError::Transport { status: status.as_u16() });
        }

        let envelope = resp
            .json::<ChatEnvelope>().await
            .map_err(|e| ChatError::Unknown(format!("undecodable chat reply: {}", e)))?;

        if !envelope.success {
            return Err(ChatError::Application {
                message: envelope.message.unwrap_or_else(|| "API call failed".to_string()),
            });
        }

        let response = envelope.response.ok_or_else(||
            ChatError::Unknown("successful envelope with no response text".to_string())
        )?;

        Ok(ChatResponse { response, stats: envelope.stats })
    }

    async fn fetch_stats(&self) -> Result<Option<UsageStats>, ChatError> {
        let resp = self.http
            .get(self.url(STATS_ROUTE))
            .send().await
            .map_err(|e| ChatError::Network(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ChatError::Transport { status: status.as_u16() });
        }

        let envelope = resp
            .json::<StatsEnvelope>().await
            .map_err(|e| ChatError::Unknown(format!("undecodable stats reply: {}", e)))?;

        if !envelope.success {
            return Ok(None);
        }

        Ok(envelope.stats)
    }
}
