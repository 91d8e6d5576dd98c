//! Error taxonomy for gateway calls and store actions.
//!
//! Every failure falls in one of four buckets (see [`ErrorKind`]):
//! authorization (a 401 from any endpoint), validation (any other non-success
//! answer, whose message is surfaced verbatim), transport (no usable response)
//! and local rejections that never reached the network.

use bakery_core::{EmailError, QuantityError};
use reqwest::StatusCode;
use thiserror::Error;

/// Errors returned by the gateway, the stores and the services.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The backend answered 401. The session has already been cleared.
    #[error("Unauthorized")]
    Unauthorized,

    /// The backend refused the request with a message for the user.
    #[error("{message}")]
    Rejected {
        /// HTTP status returned by the gateway.
        status: StatusCode,
        /// Message extracted from the response body.
        message: String,
    },

    /// HTTP request failed before a response was received.
    #[error("HTTP error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Response body was not the JSON we expected.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// A store action that needs a logged-in user was called anonymously.
    #[error("Please log in to continue")]
    NotAuthenticated,

    /// Logged in, but the role does not grant access.
    #[error("Access denied: {0}")]
    Forbidden(String),

    /// Quantity below one; never sent to the backend.
    #[error(transparent)]
    InvalidQuantity(#[from] QuantityError),

    /// Email failed the local shape check.
    #[error("Invalid email: {0}")]
    InvalidEmail(#[from] EmailError),
}

/// Coarse classification used by views to pick a presentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// 401: session invalidated, login page follows.
    Authorization,
    /// Backend said no; show its message on the form.
    Validation,
    /// Backend unreachable or unintelligible; show a generic message.
    Transport,
    /// Rejected locally before any request.
    Local,
}

impl ApiError {
    /// Classify the error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Unauthorized => ErrorKind::Authorization,
            Self::Rejected { .. } => ErrorKind::Validation,
            Self::Transport(_) | Self::Parse(_) => ErrorKind::Transport,
            Self::NotAuthenticated
            | Self::Forbidden(_)
            | Self::InvalidQuantity(_)
            | Self::InvalidEmail(_) => ErrorKind::Local,
        }
    }

    /// HTTP status, when the backend answered.
    #[must_use]
    pub const fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Unauthorized => Some(StatusCode::UNAUTHORIZED),
            Self::Rejected { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Text suitable for showing next to the form that triggered the call.
    ///
    /// Transport details are not exposed; validation messages are passed
    /// through unchanged.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Unauthorized => "Your session has expired, please log in again".to_string(),
            Self::Rejected { message, .. } => message.clone(),
            Self::Transport(_) => "Could not reach the bakery service, please try again".to_string(),
            Self::Parse(_) => "Unexpected response from the bakery service".to_string(),
            other => other.to_string(),
        }
    }
}

/// Pull a human readable message out of an error response body.
///
/// Understands the gateway's `{"error": ...}`, the Python services'
/// `{"detail": ...}` (string or validation list) and a bare `{"message": ...}`.
/// Non-JSON bodies are returned trimmed and shortened.
pub(crate) fn extract_message(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }

    let Ok(value) = serde_json::from_str::<serde_json::Value>(trimmed) else {
        return Some(trimmed.chars().take(200).collect());
    };

    ["detail", "error", "message"]
        .iter()
        .find_map(|key| value.get(*key))
        .and_then(message_from_value)
}

fn message_from_value(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
        serde_json::Value::Array(entries) => {
            let parts: Vec<String> = entries
                .iter()
                .filter_map(|entry| {
                    entry
                        .get("msg")
                        .and_then(serde_json::Value::as_str)
                        .map(str::to_string)
                        .or_else(|| entry.as_str().map(str::to_string))
                })
                .collect();
            (!parts.is_empty()).then(|| parts.join("; "))
        }
        serde_json::Value::Null | serde_json::Value::String(_) => None,
        other => Some(other.to_string()),
    }
}
