use crate::backend::RawResponse;
use serde_json::Value;

/// Result of one attempted remote call, after classification.
#[derive(Debug, Clone, PartialEq)]
pub enum CallOutcome {
    /// Text content to hand to the response parser.
    Success(String),
    /// 401/403: the credential is bad or missing. Never retried.
    AuthError,
    ServerError { status: u16 },
    TimeoutError,
    NetworkError(String),
    /// A 2xx response that doesn't carry usable text.
    ParseError(String),
}

/// Operator-facing failure categories. Server, timeout and network
/// failures collapse into `NoResponse`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureCategory {
    Auth,
    NoResponse,
    Parse,
    Generic,
}

impl std::fmt::Display for FailureCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Auth => write!(f, "auth"),
            Self::NoResponse => write!(f, "no_response"),
            Self::Parse => write!(f, "parse_error"),
            Self::Generic => write!(f, "error"),
        }
    }
}

impl CallOutcome {
    /// Failure category for this outcome, or `None` on success.
    pub fn category(&self) -> Option<FailureCategory> {
        match self {
            Self::Success(_) => None,
            Self::AuthError => Some(FailureCategory::Auth),
            Self::ServerError { .. } | Self::TimeoutError | Self::NetworkError(_) => {
                Some(FailureCategory::NoResponse)
            }
            Self::ParseError(_) => Some(FailureCategory::Parse),
        }
    }
}

/// Classify a raw call result. Pure: no retries, no I/O.
///
/// Order matters: auth statuses win over everything, then 5xx, then
/// transport failures, and only a 2xx body is inspected for content.
pub fn classify(response: &RawResponse) -> CallOutcome {
    match response {
        RawResponse::Http { status, .. } if matches!(*status, 401 | 403) => CallOutcome::AuthError,
        RawResponse::Http { status, .. } if *status >= 500 => {
            CallOutcome::ServerError { status: *status }
        }
        RawResponse::Timeout => CallOutcome::TimeoutError,
        RawResponse::Transport(msg) => CallOutcome::NetworkError(msg.clone()),
        RawResponse::Http { status, .. } if !(200..300).contains(status) => {
            CallOutcome::NetworkError(format!("unexpected HTTP status {status}"))
        }
        RawResponse::Http { body: None, .. } => {
            CallOutcome::ParseError("response body is not JSON".to_string())
        }
        RawResponse::Http {
            body: Some(body), ..
        } => match extract_text(body) {
            Err(reason) => CallOutcome::ParseError(reason),
            Ok(text) if text.trim().is_empty() => {
                CallOutcome::ParseError("response content is empty".to_string())
            }
            Ok(text) => CallOutcome::Success(text),
        },
    }
}

/// Pull the first completion's text out of a chat-completions body
/// (`choices`) or a generate-content body (`candidates`).
fn extract_text(body: &Value) -> Result<String, String> {
    if let Some(choices) = body.get("choices") {
        let first = first_of(choices, "choices")?;
        let content = first
            .pointer("/message/content")
            .ok_or_else(|| "first choice has no message content".to_string())?;
        return content_text(content)
            .ok_or_else(|| "message content is not text".to_string());
    }

    if let Some(candidates) = body.get("candidates") {
        let first = first_of(candidates, "candidates")?;
        let parts = first
            .pointer("/content/parts")
            .and_then(Value::as_array)
            .ok_or_else(|| "first candidate has no content parts".to_string())?;
        return Ok(parts
            .iter()
            .filter_map(|p| p.get("text").and_then(Value::as_str))
            .collect::<Vec<_>>()
            .join(""));
    }

    Err("response has no choices or candidates".to_string())
}

fn first_of<'a>(list: &'a Value, name: &str) -> Result<&'a Value, String> {
    list.as_array()
        .and_then(|items| items.first())
        .ok_or_else(|| format!("response has empty or invalid {name}"))
}

/// Message content is either a plain string or an array of typed parts.
fn content_text(content: &Value) -> Option<String> {
    match content {
        Value::String(s) => Some(s.clone()),
        Value::Array(parts) => Some(
            parts
                .iter()
                .filter(|p| p.get("type").and_then(Value::as_str).unwrap_or("text") == "text")
                .filter_map(|p| p.get("text").and_then(Value::as_str))
                .collect::<Vec<_>>()
                .join(""),
        ),
        _ => None,
    }
}
