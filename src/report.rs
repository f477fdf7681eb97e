use log::debug;
use reqwest::Client as HttpClient;
use serde::Serialize;

/// Payload for the error-logging endpoint.
#[derive(Clone, Debug, Serialize)]
pub struct ErrorReport {
    pub error: String,
    pub class: &'static str,
    pub model: String,
    pub conversation_id: String,
    pub timestamp: i64,
}

/// Best-effort failure reporting. Implementations must never block the
/// send path and must swallow their own failures.
pub trait ErrorReporter: Send + Sync {
    fn report(&self, report: ErrorReport);
}

/// POSTs reports to `<base>/api/log-error` from a detached task. Delivery
/// is not awaited and delivery failures are ignored.
pub struct HttpReporter {
    http: HttpClient,
    url: String,
}

impl HttpReporter {
    pub fn new(base_url: &str) -> Self {
        Self {
            http: HttpClient::new(),
            url: format!("{}/api/log-error", base_url.trim_end_matches('/')),
        }
    }
}

impl ErrorReporter for HttpReporter {
    fn report(&self, report: ErrorReport) {
        let http = self.http.clone();
        let url = self.url.clone();
        tokio::spawn(async move {
            if let Err(e) = http.post(&url).json(&report).send().await {
                debug!("error report dropped: {}", e);
            }
        });
    }
}

/// Reporter used when no logging endpoint is configured and in tests.
pub struct NoopReporter;

impl ErrorReporter for NoopReporter {
    fn report(&self, _report: ErrorReport) {}
}
