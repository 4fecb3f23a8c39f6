//! Error handling for the Calorie Tracker client
//!
//! Every failure that leaves the API client is one of these variants. The
//! `Display` output of [`Error::Network`] and [`Error::Api`] is the message
//! shown to the user, so the store can surface `err.to_string()` directly.

use reqwest::StatusCode;
use serde::Deserialize;
use std::fmt;
use thiserror::Error;

/// Message used for every transport-level failure.
pub const NETWORK_ERROR_MESSAGE: &str = "Unable to connect to server. The backend may be starting up (wait 30s and retry) or there's a network issue.";

const INVALID_CREDENTIALS_MESSAGE: &str = "Invalid email or password.";
const SERVER_ERROR_MESSAGE: &str =
    "Server error. The backend may have a database issue. Please try again later.";
const ALREADY_REGISTERED_MESSAGE: &str = "This email is already registered. Please login instead.";
const FALLBACK_MESSAGE: &str = "An error occurred";

/// Unified error type for the Calorie Tracker client
#[derive(Error, Debug)]
pub enum Error {
    /// No response was received (offline, refused, timed out, cold start)
    #[error("{0}")]
    Network(String),

    /// A response was received with a non-success status
    #[error("{message}")]
    Api { status: u16, message: String },

    /// A success response whose body could not be read as the expected type
    #[error("Unexpected response from server: {0}")]
    Decode(String),

    /// An authenticated call was attempted without a stored token
    #[error("Not logged in")]
    NotAuthenticated,

    /// Input rejected before any request was made
    #[error("{0}")]
    Validation(String),

    /// Invalid client configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Durable token storage could not be read or written
    #[error("Token storage error: {0}")]
    TokenStorage(#[from] std::io::Error),

    /// URL parsing errors
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Deserialize)]
struct ErrorBody {
    detail: Option<serde_json::Value>,
    message: Option<String>,
}

impl Error {
    /// Create a new network error with the fixed user-facing message
    pub fn network() -> Self {
        Error::Network(NETWORK_ERROR_MESSAGE.to_string())
    }

    /// Create a new validation error
    pub fn validation<T: fmt::Display>(msg: T) -> Self {
        Error::Validation(msg.to_string())
    }

    /// Create a new configuration error
    pub fn config<T: fmt::Display>(msg: T) -> Self {
        Error::Config(msg.to_string())
    }

    /// Normalize a non-success response into an [`Error::Api`].
    ///
    /// The server message is taken from the `detail` or `message` field of a
    /// JSON body, falling back to the status reason phrase. Well-known
    /// statuses are then replaced with fixed messages.
    pub fn from_status(status: StatusCode, body: &str) -> Self {
        let server_message = serde_json::from_str::<ErrorBody>(body)
            .ok()
            .and_then(|b| {
                b.detail
                    .and_then(|d| match d {
                        serde_json::Value::String(s) => Some(s),
                        serde_json::Value::Null => None,
                        other => Some(other.to_string()),
                    })
                    .or(b.message)
            })
            .or_else(|| status.canonical_reason().map(str::to_string))
            .unwrap_or_else(|| FALLBACK_MESSAGE.to_string());

        let message = match status {
            StatusCode::INTERNAL_SERVER_ERROR => SERVER_ERROR_MESSAGE.to_string(),
            StatusCode::UNAUTHORIZED => INVALID_CREDENTIALS_MESSAGE.to_string(),
            StatusCode::BAD_REQUEST if server_message.contains("already registered") => {
                ALREADY_REGISTERED_MESSAGE.to_string()
            }
            _ => server_message,
        };

        Error::Api {
            status: status.as_u16(),
            message,
        }
    }

    /// HTTP status of an application failure, `0` for a network failure
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Api { status, .. } => Some(*status),
            Error::Network(_) => Some(0),
            _ => None,
        }
    }

    pub fn is_network(&self) -> bool {
        matches!(self, Error::Network(_))
    }
}
