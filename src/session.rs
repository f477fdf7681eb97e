use chrono::Utc;
use log::warn;
use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

use crate::cli::Args;
use crate::dispatch::http::HttpDispatcher;
use crate::dispatch::ChatDispatcher;
use crate::models::chat::{ HistoryEntry, UsageStats };
use crate::recovery::classify::ErrorClass;
use crate::recovery::{ send_with_recovery, RetryPolicy, SessionState };
use crate::report::{ ErrorReporter, HttpReporter, NoopReporter };
use crate::store::{ initialize_store, ClientStore, StoreError };

/// Pref key under which an explicitly selected model is persisted.
const MODEL_PREF: &str = "model";

/// What one send produces for the rendering layer. A terminal dispatch
/// failure is still a reply: the failure text renders as a bot message
/// and never propagates as an error.
#[derive(Clone, Debug)]
pub enum SessionReply {
    Answer {
        text: String,
        stats: Option<UsageStats>,
    },
    Failure {
        text: String,
        class: ErrorClass,
    },
}

/// One user's conversation: dispatcher, store and reporter behind trait
/// seams, plus the explicit recovery state.
pub struct ChatSession {
    dispatcher: Arc<dyn ChatDispatcher>,
    store: Arc<dyn ClientStore>,
    reporter: Arc<dyn ErrorReporter>,
    policy: RetryPolicy,
    state: SessionState,
}

impl ChatSession {
    pub async fn new(args: &Args) -> Result<Self, Box<dyn Error + Send + Sync>> {
        let store = initialize_store(args)?;
        let dispatcher: Arc<dyn ChatDispatcher> = Arc::new(HttpDispatcher::from_args(args)?);
        let reporter: Arc<dyn ErrorReporter> = if args.disable_error_reports {
            Arc::new(NoopReporter)
        } else {
            Arc::new(HttpReporter::new(&args.base_url))
        };

        let conversation_id = store.conversation_id().await?;
        let model = match store.get_pref(MODEL_PREF).await? {
            Some(saved) => saved,
            None => args.model.clone().unwrap_or_else(|| args.fallback_model.clone()),
        };
        let policy = RetryPolicy {
            max_retries: args.max_retries,
            backoff_unit: Duration::from_millis(args.retry_backoff_ms),
            fallback_delay: Duration::from_millis(args.fallback_delay_ms),
        };
        let state = SessionState::new(conversation_id, model, args.fallback_model.clone());

        Ok(Self::with_parts(dispatcher, store, reporter, policy, state))
    }

    pub fn with_parts(
        dispatcher: Arc<dyn ChatDispatcher>,
        store: Arc<dyn ClientStore>,
        reporter: Arc<dyn ErrorReporter>,
        policy: RetryPolicy,
        state: SessionState
    ) -> Self {
        Self { dispatcher, store, reporter, policy, state }
    }

    pub fn dispatcher(&self) -> Arc<dyn ChatDispatcher> {
        Arc::clone(&self.dispatcher)
    }

    pub fn conversation_id(&self) -> &str {
        &self.state.conversation_id
    }

    pub fn model(&self) -> &str {
        &self.state.current_model
    }

    /// Switch models and remember the choice. A later fallback demotion
    /// is deliberately not persisted.
    pub async fn set_model(&mut self, model: &str) -> Result<(), StoreError> {
        self.state.current_model = model.to_string();
        self.store.set_pref(MODEL_PREF, model).await
    }

    pub async fn recent_history(&self, limit: usize) -> Result<Vec<HistoryEntry>, StoreError> {
        self.store.recent_history(limit).await
    }

    pub async fn clear_history(&self) -> Result<(), StoreError> {
        self.store.clear_history().await
    }

    /// Send one message through the recovery flow. Returns `None` for
    /// input that is empty after trimming.
    pub async fn send_message(&mut self, text: &str) -> Option<SessionReply> {
        let message = text.trim();
        if message.is_empty() {
            return None;
        }

        match
            send_with_recovery(
                self.dispatcher.as_ref(),
                self.reporter.as_ref(),
                &self.policy,
                &mut self.state,
                message
            ).await
        {
            Ok(reply) => {
                let entry = HistoryEntry {
                    user: message.to_string(),
                    bot: reply.response.clone(),
                    timestamp: Utc::now().timestamp(),
                    model: self.state.current_model.clone(),
                };
                if let Err(e) = self.store.append_history(entry).await {
                    warn!("History write failed: {}", e);
                }
                Some(SessionReply::Answer { text: reply.response, stats: reply.stats })
            }
            Err(err) => {
                let class = ErrorClass::of(&err);
                Some(SessionReply::Failure { text: terminal_message(class), class })
            }
        }
    }
}

fn terminal_message(class: ErrorClass) -> String {
    let hint = match class {
        ErrorClass::Network => "Please check your internet connection and try again.",
        ErrorClass::Application | ErrorClass::Unknown => "Please try again in a moment.",
    };
    format!("Sorry, I encountered an error. {}", hint)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use crate::dispatch::{ ChatError, ChatResponse };
    use crate::models::chat::ChatRequest;
    use crate::store::memory::MemoryStore;

    struct ScriptedDispatcher {
        script: Mutex<VecDeque<Result<ChatResponse, ChatError>>>,
        dispatched: Mutex<Vec<ChatRequest>>,
    }

    impl ScriptedDispatcher {
        fn new(script: Vec<Result<ChatResponse, ChatError>>) -> Self {
            Self {
                script: Mutex::new(script.into()),
                dispatched: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ChatDispatcher for ScriptedDispatcher {
        async fn dispatch(&self, request: &ChatRequest) -> Result<ChatResponse, ChatError> {
            self.dispatched.lock().unwrap().push(request.clone());
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(ChatError::Unknown("script exhausted".to_string())))
        }

        async fn fetch_stats(&self) -> Result<Option<UsageStats>, ChatError> {
            Ok(None)
        }
    }

    fn session(
        script: Vec<Result<ChatResponse, ChatError>>,
        model: &str
    ) -> (ChatSession, Arc<ScriptedDispatcher>, Arc<MemoryStore>) {
        let dispatcher = Arc::new(ScriptedDispatcher::new(script));
        let store = Arc::new(MemoryStore::new());
        let state = SessionState::new(
            "conv_s".to_string(),
            model.to_string(),
            "standard".to_string()
        );
        let session = ChatSession::with_parts(
            Arc::clone(&dispatcher) as Arc<dyn ChatDispatcher>,
            Arc::clone(&store) as Arc<dyn ClientStore>,
            Arc::new(NoopReporter),
            RetryPolicy::default(),
            state
        );
        (session, dispatcher, store)
    }

    #[tokio::test]
    async fn empty_input_is_a_no_op() {
        let (mut session, dispatcher, store) = session(vec![], "standard");

        assert!(session.send_message("   ").await.is_none());
        assert!(dispatcher.dispatched.lock().unwrap().is_empty());
        assert!(store.recent_history(10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn success_appends_a_history_entry() {
        let reply = ChatResponse { response: "42".to_string(), stats: None };
        let (mut session, dispatcher, store) = session(vec![Ok(reply)], "premium");

        let out = session.send_message("  meaning of life?  ").await.unwrap();
        assert!(matches!(out, SessionReply::Answer { ref text, .. } if text == "42"));

        let sent = dispatcher.dispatched.lock().unwrap();
        assert_eq!(sent[0].message, "meaning of life?");
        assert_eq!(sent[0].conversation_id, "conv_s");

        let history = store.recent_history(10).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].user, "meaning of life?");
        assert_eq!(history[0].bot, "42");
        assert_eq!(history[0].model, "premium");
    }

    #[tokio::test(start_paused = true)]
    async fn terminal_network_failure_renders_a_connection_hint() {
        let failures = (0..4)
            .map(|_| Err(ChatError::Network("refused".to_string())))
            .collect();
        let (mut session, _dispatcher, store) = session(failures, "standard");

        let out = session.send_message("hello").await.unwrap();
        match out {
            SessionReply::Failure { text, class } => {
                assert_eq!(class, ErrorClass::Network);
                assert_eq!(
                    text,
                    "Sorry, I encountered an error. Please check your internet connection and try again."
                );
            }
            other => panic!("expected failure reply, got {:?}", other),
        }
        // Failed sends leave no history behind.
        assert!(store.recent_history(10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn set_model_persists_the_choice() {
        let (mut session, _dispatcher, store) = session(vec![], "standard");

        session.set_model("premium").await.unwrap();
        assert_eq!(session.model(), "premium");
        assert_eq!(store.get_pref("model").await.unwrap().as_deref(), Some("premium"));
    }
}
