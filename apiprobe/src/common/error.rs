//! エラー型定義
//!
//! 統一エラー型（thiserror使用）
//!
//! `ProbeError`は`external_message()`と`status_code()`を提供し、
//! 内部情報を漏らさない構造化エラーレスポンスを生成できる。

use axum::http::StatusCode;
use thiserror::Error;

/// Common layer error type
#[derive(Debug, Error)]
pub enum CommonError {
    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),
}

/// apiprobe error type
#[derive(Debug, Error)]
pub enum ProbeError {
    /// Common layer error
    #[error(transparent)]
    Common(#[from] CommonError),

    /// Malformed inbound request
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Required field absent from an inbound request
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    /// JSON-RPC method not recognized
    #[error("Unsupported method: {0}")]
    UnsupportedMethod(String),

    /// HTTP client error
    #[error("Request failed: {0}")]
    Http(String),

    /// Connection could not be established
    #[error("Connection failed: {0}")]
    Connection(String),

    /// Timeout error
    #[error("Request timed out after {0} ms")]
    Timeout(u64),

    /// Reasoning agent could not complete the instruction
    #[error("Agent error: {0}")]
    Agent(String),

    /// Callback push failed
    #[error("Callback delivery failed: {0}")]
    Callback(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ProbeError {
    /// Returns a safe error message for external clients.
    ///
    /// Full details stay in `Display` for server logs.
    pub fn external_message(&self) -> &'static str {
        match self {
            Self::Common(_) => "Request error",
            Self::InvalidRequest(_) => "Invalid request",
            Self::MissingField(_) => "Missing required field",
            Self::UnsupportedMethod(_) => "Unsupported method",
            Self::Http(_) => "Upstream request failed",
            Self::Connection(_) => "Upstream unreachable",
            Self::Timeout(_) => "Request timeout",
            Self::Agent(_) => "Task execution failed",
            Self::Callback(_) => "Callback delivery failed",
            Self::Internal(_) => "Internal server error",
        }
    }

    /// HTTP status code for handler-level error responses.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Common(_)
            | Self::InvalidRequest(_)
            | Self::MissingField(_)
            | Self::UnsupportedMethod(_) => StatusCode::BAD_REQUEST,
            Self::Http(_) | Self::Connection(_) | Self::Callback(_) => StatusCode::BAD_GATEWAY,
            Self::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            Self::Agent(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Classify a transport error from the HTTP client.
    pub fn from_transport(err: &reqwest::Error, timeout_ms: u64) -> Self {
        if err.is_timeout() {
            Self::Timeout(timeout_ms)
        } else if err.is_connect() {
            Self::Connection(err.to_string())
        } else {
            Self::Http(err.to_string())
        }
    }
}

/// Result alias for apiprobe operations
pub type ProbeResult<T> = Result<T, ProbeError>;
