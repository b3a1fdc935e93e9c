use crate::config::ApiConfig;
use crate::errors::CoreError;
use crate::request::{ChatRequest, REFERER, TITLE};
use reqwest::blocking::Client;
use std::time::Duration;
use tracing::debug;

/// What came back from one call attempt, before classification.
#[derive(Debug, Clone, PartialEq)]
pub enum RawResponse {
    /// The server answered. `body` is `None` when it wasn't JSON.
    Http {
        status: u16,
        body: Option<serde_json::Value>,
    },
    /// The transport gave up waiting.
    Timeout,
    /// Connection refused, DNS failure, TLS failure and the like.
    Transport(String),
}

/// Trait for model backends. Sync only: the pipeline already runs each
/// call on its own worker thread.
pub trait ModelBackend: Send + Sync {
    /// Send one request. Never fails: every failure is a `RawResponse`.
    fn send(&self, request: &ChatRequest) -> RawResponse;
}

/// Backend that posts to an OpenRouter-compatible chat-completions endpoint.
pub struct OpenRouterBackend {
    client: Client,
    endpoint: String,
    api_key: String,
}

impl OpenRouterBackend {
    pub fn new(config: &ApiConfig, api_key: String) -> Result<Self, CoreError> {
        if api_key.trim().is_empty() {
            return Err(CoreError::Config(
                "no API key configured. Set [api] key in config.toml or QUIZPEEK_API_KEY."
                    .to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(request_timeout(config.timeout_secs)?)
            .build()
            .map_err(|e| CoreError::Transport(format!("building HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            api_key,
        })
    }
}

impl ModelBackend for OpenRouterBackend {
    fn send(&self, request: &ChatRequest) -> RawResponse {
        let result = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .header("HTTP-Referer", REFERER)
            .header("X-Title", TITLE)
            .json(request)
            .send();

        let response = match result {
            Ok(r) => r,
            Err(e) => return transport_failure(e),
        };

        let status = response.status().as_u16();
        debug!(status, "model API responded");

        let text = match response.text() {
            Ok(t) => t,
            Err(e) => return transport_failure(e),
        };

        RawResponse::Http {
            status,
            body: serde_json::from_str(&text).ok(),
        }
    }
}

/// Per-call timeout from `[api] timeout_secs`. Must be finite and positive.
fn request_timeout(secs: f64) -> Result<Duration, CoreError> {
    if !secs.is_finite() || secs <= 0.0 {
        return Err(CoreError::Config(format!(
            "invalid [api] timeout_secs {secs}: must be a positive number of seconds"
        )));
    }
    Duration::try_from_secs_f64(secs)
        .map_err(|e| CoreError::Config(format!("invalid [api] timeout_secs {secs}: {e}")))
}

fn transport_failure(e: reqwest::Error) -> RawResponse {
    if e.is_timeout() {
        RawResponse::Timeout
    } else {
        RawResponse::Transport(e.to_string())
    }
}
