// Error types for the API client. Application-level code (config, shell,
// main) works with `anyhow`; everything that talks HTTP returns `ApiError`
// so the shell can react to specific failures such as an expired session.

use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never produced a response (connect, timeout, body read).
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-success status with an `{"error": "..."}` body.
    #[error("server error: {message}")]
    Server { status: StatusCode, message: String },

    /// Non-success status with a body we could not interpret.
    #[error("unknown server error: {body}")]
    UnknownServer { status: StatusCode, body: String },

    #[error("failed to decode {what} response: {source}")]
    Decode {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("product id must not be empty")]
    EmptyProductId,

    /// An id such as `.` or `..` that cannot be sent as one path segment.
    #[error("product id {0:?} cannot be used in a request path")]
    UnroutableProductId(String),

    #[error("invalid endpoint url: {0}")]
    InvalidUrl(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: String,
}

impl ApiError {
    /// Build the error for a non-success response. The server reports
    /// failures as `{"error": "..."}`; anything else is passed through raw.
    pub fn from_response(status: StatusCode, body: &str) -> Self {
        match serde_json::from_str::<ErrorBody>(body) {
            Ok(parsed) if !parsed.error.is_empty() => ApiError::Server {
                status,
                message: parsed.error,
            },
            _ => ApiError::UnknownServer {
                status,
                body: body.to_string(),
            },
        }
    }

    /// HTTP status of the failed response, if the server answered at all.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Server { status, .. } | ApiError::UnknownServer { status, .. } => {
                Some(*status)
            }
            ApiError::Transport(e) => e.status(),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(StatusCode::UNAUTHORIZED)
    }
}
