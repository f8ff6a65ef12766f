//! Error types for the offline shell
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::network::NetworkError;
use crate::worker::WorkerState;

// == Shell Error Enum ==
/// Unified error type for the offline shell.
#[derive(Error, Debug)]
pub enum ShellError {
    /// Upstream fetch failed on a request that was not intercepted
    #[error("Network request failed: {0}")]
    Network(#[from] NetworkError),

    /// Lifecycle step attempted from the wrong state
    #[error("Invalid worker state: expected {expected}, got {actual}")]
    InvalidState {
        expected: WorkerState,
        actual: WorkerState,
    },

    /// No worker generation has been registered yet
    #[error("No worker is registered")]
    NoWorker,

    /// Control message that needs a reply arrived without one
    #[error("Missing reply channel for {0}")]
    MissingReplyChannel(&'static str),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

// == IntoResponse Implementation ==
impl IntoResponse for ShellError {
    fn into_response(self) -> Response {
        let status = match &self {
            ShellError::Network(_) => StatusCode::BAD_GATEWAY,
            ShellError::InvalidState { .. } => StatusCode::CONFLICT,
            ShellError::NoWorker => StatusCode::SERVICE_UNAVAILABLE,
            ShellError::MissingReplyChannel(_) => StatusCode::BAD_REQUEST,
            ShellError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ShellError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the offline shell.
pub type Result<T> = std::result::Result<T, ShellError>;
