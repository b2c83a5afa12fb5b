//! LLM error types

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during LLM operations
///
/// The conductor distinguishes permanent failures from transient ones:
/// rate limits, timeouts and 5xx responses escalate to a model switch,
/// tool-unsupported means the current model cannot run agents at all.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Duration },

    #[error("API error {status}: {message}")]
    ApiError { status: u16, message: String },

    #[error("Model does not support tool use: {0}")]
    ToolUnsupported(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Request cancelled")]
    Cancelled,
}

impl LlmError {
    /// Map an unsuccessful HTTP status + body to the right variant
    ///
    /// Some routers signal missing tool capability with a 404/400 body
    /// rather than a dedicated status, so the body text is inspected.
    pub fn from_status(status: u16, message: String) -> Self {
        let lower = message.to_lowercase();
        if lower.contains("no endpoints found that support tool use")
            || (lower.contains("tool") && lower.contains("not supported"))
        {
            return LlmError::ToolUnsupported(message);
        }
        LlmError::ApiError { status, message }
    }

    /// Check if this is a rate limit error
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, LlmError::RateLimited { .. })
    }

    /// Check if this error should escalate to a model switch
    /// rather than burn a conductor attempt
    pub fn is_transient(&self) -> bool {
        match self {
            LlmError::RateLimited { .. } => true,
            LlmError::ApiError { status, .. } => *status >= 500,
            LlmError::ToolUnsupported(_) => true,
            LlmError::Network(_) => true,
            LlmError::Timeout(_) => true,
            LlmError::InvalidResponse(_) => false,
            LlmError::Json(_) => false,
            LlmError::Cancelled => false,
        }
    }

    /// Get the retry duration if this is a rate limit error
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            LlmError::RateLimited { retry_after } => Some(*retry_after),
            _ => None,
        }
    }
}
