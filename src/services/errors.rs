use serde_json::Value;
use thiserror::Error;

use crate::core::config::ConfigError;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Network error while calling {endpoint}")]
    Transport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
    /// Non-2xx response. The message is the server's `detail` verbatim, or
    /// the operation's generic fallback.
    #[error("{message}")]
    Status { status: u16, message: String },
    #[error("Unexpected response body from {endpoint}")]
    Decode {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("{0}")]
    MissingInput(&'static str),
    #[error("{0}")]
    InvalidInput(String),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Batch {batch_id} failed: {message}")]
    BatchFailed { batch_id: String, message: String },
}

impl ClientError {
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// True when the error was raised before any request was sent.
    pub fn is_client_side(&self) -> bool {
        matches!(self, Self::MissingInput(_) | Self::InvalidInput(_) | Self::Config(_))
    }
}

/// Pulls a human-readable message out of an error body.
///
/// `detail` wins (string, or a validation list whose `msg` entries are
/// joined), then a top-level `message`. Empty or non-JSON bodies yield `None`.
pub(crate) fn extract_error_message(body: &[u8]) -> Option<String> {
    let payload: Value = serde_json::from_slice(body).ok()?;

    if let Some(detail) = payload.get("detail") {
        if let Some(text) = detail.as_str() {
            return Some(text.to_string());
        }
        if let Some(items) = detail.as_array() {
            let joined = items
                .iter()
                .filter_map(|item| {
                    item.get("msg")
                        .and_then(Value::as_str)
                        .or_else(|| item.get("message").and_then(Value::as_str))
                })
                .collect::<Vec<_>>()
                .join("; ");
            if !joined.is_empty() {
                return Some(joined);
            }
        }
    }

    payload
        .get("message")
        .and_then(Value::as_str)
        .filter(|message| !message.is_empty())
        .map(ToString::to_string)
}
