pub mod classify;

use chrono::Utc;
use log::{ info, warn };
use std::time::Duration;
use tokio::time::sleep;

use crate::dispatch::{ ChatDispatcher, ChatError, ChatResponse };
use crate::models::chat::ChatRequest;
use crate::report::{ ErrorReport, ErrorReporter };
use self::classify::ErrorClass;

/// Retry budget and delays for one logical send.
#[derive(Clone, Debug)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff_unit: Duration,
    pub fallback_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff_unit: Duration::from_millis(1000),
            fallback_delay: Duration::from_millis(1000),
        }
    }
}

/// Explicit per-session state threaded through the recovery flow. The
/// retry count belongs here so callers can observe that it resets to 0
/// on every success and on every terminal outcome.
#[derive(Clone, Debug)]
pub struct SessionState {
    pub conversation_id: String,
    pub current_model: String,
    pub default_model: String,
    pub retry_count: u32,
}

impl SessionState {
    pub fn new(conversation_id: String, model: String, default_model: String) -> Self {
        Self {
            conversation_id,
            current_model: model,
            default_model,
            retry_count: 0,
        }
    }
}

/// Send one message through the full recovery flow: bounded retries with
/// linear backoff, then a one-shot fallback to the default model with a
/// fresh budget. Every dispatch failure is classified, logged and handed
/// to the reporter; only the terminal failure escapes as `Err`.
///
/// After a demotion `current_model == default_model`, so a second
/// exhaustion always takes the terminal path.
pub async fn send_with_recovery(
    dispatcher: &dyn ChatDispatcher,
    reporter: &dyn ErrorReporter,
    policy: &RetryPolicy,
    state: &mut SessionState,
    message: &str
) -> Result<ChatResponse, ChatError> {
    loop {
        let request = ChatRequest {
            message: message.to_string(),
            model: state.current_model.clone(),
            conversation_id: state.conversation_id.clone(),
        };

        match dispatcher.dispatch(&request).await {
            Ok(reply) => {
                state.retry_count = 0;
                return Ok(reply);
            }
            Err(err) => {
                let class = ErrorClass::of(&err);
                warn!(
                    "dispatch failed for model '{}' ({}): {}",
                    state.current_model,
                    class.as_str(),
                    err
                );
                reporter.report(ErrorReport {
                    error: err.to_string(),
                    class: class.as_str(),
                    model: state.current_model.clone(),
                    conversation_id: state.conversation_id.clone(),
                    timestamp: Utc::now().timestamp(),
                });

                if state.retry_count < policy.max_retries {
                    state.retry_count += 1;
                    let delay = policy.backoff_unit * state.retry_count;
                    info!(
                        "retrying in {:?} ({}/{})",
                        delay,
                        state.retry_count,
                        policy.max_retries
                    );
                    sleep(delay).await;
                    continue;
                }

                if state.current_model != state.default_model {
                    info!(
                        "retries exhausted on '{}', falling back to '{}'",
                        state.current_model,
                        state.default_model
                    );
                    state.current_model = state.default_model.clone();
                    state.retry_count = 0;
                    sleep(policy.fallback_delay).await;
                    continue;
                }

                state.retry_count = 0;
                return Err(err);
            }
        }
    }
}
