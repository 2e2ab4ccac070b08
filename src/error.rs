// Error handling module for the review thread client
// Provides the error taxonomy shared by the API layer and the store

use serde::Deserialize;
use tracing::{debug, warn};

/// Generic message shown when the backend could not be reached or answered
/// with something we cannot interpret.
pub const TRANSPORT_MESSAGE: &str = "Something went wrong, please try again";

/// Message shown when an action needs a logged-in user.
pub const AUTH_REQUIRED_MESSAGE: &str = "Please log in to continue";

/// Main error type for review thread actions
///
/// Every store action returns `Result<T, ReviewError>`. Each variant maps to
/// one user-visible message via [`ReviewError::user_message`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReviewError {
    /// Bad input detected on the client; never reaches the network
    #[error("Validation error: {0}")]
    Validation(String),

    /// Action attempted without a stored bearer token
    #[error("Authentication required")]
    AuthRequired,

    /// Network failure, non-2xx without a structured body, or undecodable body
    #[error("Transport error: {0}")]
    Transport(String),

    /// 4xx response carrying a structured error body
    #[error("Server rejected request ({status}): {message}")]
    ServerValidation { status: u16, message: String },
}

impl ReviewError {
    /// Text to display next to the form that triggered the action
    pub fn user_message(&self) -> String {
        match self {
            ReviewError::Validation(msg) => msg.clone(),
            ReviewError::AuthRequired => AUTH_REQUIRED_MESSAGE.to_string(),
            ReviewError::Transport(_) => TRANSPORT_MESSAGE.to_string(),
            ReviewError::ServerValidation { message, .. } => message.clone(),
        }
    }

    /// Build an error from a non-2xx response
    ///
    /// 4xx bodies shaped like `{"errors": {"field": ["msg"]}}` or
    /// `{"message": "msg"}` become `ServerValidation` with the first message.
    /// Anything else is a `Transport` error.
    pub fn from_response(status: u16, body: &str) -> Self {
        if (400..500).contains(&status) {
            if let Some(message) = first_error_message(body) {
                debug!("Server validation error ({}): {}", status, message);
                return ReviewError::ServerValidation { status, message };
            }
        }

        warn!("Unexpected response status {}: {}", status, body);
        ReviewError::Transport(format!("HTTP {}", status))
    }
}

/// Convert validator errors to ReviewError
///
/// Uses the first field error's message so the caller can show it verbatim.
impl From<validator::ValidationErrors> for ReviewError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
        fields.sort_by_key(|(field, _)| *field);

        let message = fields
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| {
                    e.message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("{} is invalid", field))
                })
            })
            .next()
            .unwrap_or_else(|| "Invalid input".to_string());

        ReviewError::Validation(message)
    }
}

impl From<reqwest::Error> for ReviewError {
    fn from(err: reqwest::Error) -> Self {
        ReviewError::Transport(err.to_string())
    }
}

/// Structured error body returned by the backend on 4xx
#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    errors: Option<serde_json::Map<String, serde_json::Value>>,
    #[serde(default)]
    message: Option<String>,
}

/// Extract the first field error (or the top-level message) from a body
fn first_error_message(body: &str) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_str(body).ok()?;

    if let Some(errors) = parsed.errors {
        // Field order is the server's (serde_json preserve_order).
        for (_, value) in errors {
            let first = match value {
                serde_json::Value::Array(items) => items.into_iter().find_map(|v| match v {
                    serde_json::Value::String(s) => Some(s),
                    _ => None,
                }),
                serde_json::Value::String(s) => Some(s),
                _ => None,
            };
            if let Some(msg) = first {
                return Some(msg);
            }
        }
    }

    parsed.message.filter(|m| !m.trim().is_empty())
}
