//! Error taxonomy - Errors returned by client operations
//!
//! Every public operation of the crate returns `Result<_, ChatError>`. The
//! variants mirror what a screen needs to decide: show a message, or force the
//! user back to the login screen.

use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

pub type ChatResult<T> = Result<T, ChatError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChatError {
    /// No bearer token is available in the session.
    #[error("Not logged in")]
    NotLoggedIn,

    /// Transport or IO level failure while talking to the backend.
    #[error("Network error: {0}")]
    Network(String),

    /// Non-2xx answer carrying a server message.
    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    /// 401/403, surfaced separately so the UI can force a re-login.
    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Local media could not be prepared for upload.
    #[error("{0}")]
    Media(String),

    /// Payload received from the backend could not be decoded.
    #[error("Protocol error: {0}")]
    Protocol(String),
}

/// Error body returned by the backend
#[derive(Deserialize, Debug, Default)]
struct ErrorBody {
    error: Option<String>,
    message: Option<String>,
    details: Option<String>,
}

impl ChatError {
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }

    pub fn server(status: u16, message: impl Into<String>) -> Self {
        Self::Server {
            status,
            message: message.into(),
        }
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    pub fn media(message: impl Into<String>) -> Self {
        Self::Media(message.into())
    }

    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol(message.into())
    }

    /// Builds the error for a non-2xx response from its status and raw body.
    pub fn from_response(status: StatusCode, body: &str) -> Self {
        let message = serde_json::from_str::<ErrorBody>(body)
            .ok()
            .and_then(|b| match (b.error.or(b.message), b.details) {
                (Some(msg), Some(details)) => Some(format!("{msg}: {details}")),
                (Some(msg), None) => Some(msg),
                (None, details) => details,
            })
            .unwrap_or_else(|| {
                let trimmed = body.trim();
                if trimmed.is_empty() {
                    status
                        .canonical_reason()
                        .unwrap_or("Unknown error")
                        .to_string()
                } else {
                    trimmed.to_string()
                }
            });

        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Self::Authentication(message),
            _ => Self::server(status.as_u16(), message),
        }
    }

    pub fn is_auth_error(&self) -> bool {
        matches!(self, Self::NotLoggedIn | Self::Authentication(_))
    }
}

impl From<reqwest::Error> for ChatError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            return Self::protocol(err.to_string());
        }
        match err.status() {
            Some(status) if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN => {
                Self::Authentication(err.to_string())
            }
            Some(status) => Self::server(status.as_u16(), err.to_string()),
            None => Self::network(err.to_string()),
        }
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for ChatError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        use tokio_tungstenite::tungstenite::Error as WsError;
        match err {
            WsError::Http(response) => {
                let status = response.status();
                let body = response
                    .body()
                    .as_ref()
                    .map(|b| String::from_utf8_lossy(b).into_owned())
                    .unwrap_or_default();
                Self::from_response(status, &body)
            }
            other => Self::network(other.to_string()),
        }
    }
}

impl From<std::io::Error> for ChatError {
    fn from(err: std::io::Error) -> Self {
        Self::network(err.to_string())
    }
}

impl From<serde_json::Error> for ChatError {
    fn from(err: serde_json::Error) -> Self {
        Self::protocol(err.to_string())
    }
}

impl From<validator::ValidationErrors> for ChatError {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::invalid_input(err.to_string())
    }
}

impl From<jsonwebtoken::errors::Error> for ChatError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        Self::Authentication(format!("Unable to decode token: {err}"))
    }
}
