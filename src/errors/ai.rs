//! AI collaborator error types
//!
//! Every failure of the hosted text-generation service ends up here before it is
//! surfaced to API callers as an upstream error.

use thiserror::Error;

use super::core_error::CoreError;

#[derive(Error, Debug)]
pub enum AiServiceError {
    /// No API key was configured at startup
    #[error("AI service is not configured (set GEMINI_API_KEY)")]
    NotConfigured,

    /// The request never produced an HTTP response
    #[error("AI service request failed: {0}")]
    Transport(String),

    /// The service answered with a non-success status
    #[error("AI service returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// The prompt or the answer was withheld for content-safety reasons
    #[error("AI service blocked the request: {0}")]
    Blocked(String),

    /// The service answered without any text
    #[error("AI service returned an empty response")]
    EmptyResponse,

    /// The answer could not be decoded as JSON
    #[error("AI service returned invalid JSON: {0}")]
    InvalidJson(String),

    /// The decoded JSON does not have the expected structure
    #[error("AI service response has an unexpected shape: {0}")]
    InvalidShape(String),
}

impl AiServiceError {
    /// Transient failures worth another attempt
    pub fn is_retryable(&self) -> bool {
        match self {
            AiServiceError::Transport(_) => true,
            AiServiceError::Status { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            AiServiceError::NotConfigured => "AI_NOT_CONFIGURED",
            AiServiceError::Transport(_) => "AI_TRANSPORT",
            AiServiceError::Status { .. } => "AI_STATUS",
            AiServiceError::Blocked(_) => "AI_BLOCKED",
            AiServiceError::EmptyResponse => "AI_EMPTY_RESPONSE",
            AiServiceError::InvalidJson(_) => "AI_INVALID_JSON",
            AiServiceError::InvalidShape(_) => "AI_INVALID_SHAPE",
        }
    }
}

impl From<AiServiceError> for CoreError {
    fn from(err: AiServiceError) -> Self {
        let code = err.error_code();
        CoreError::upstream(err.to_string())
            .with_field("reason", code)
            .with_source(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::CoreErrorKind;

    #[test]
    fn retry_classification() {
        assert!(AiServiceError::Transport("timed out".into()).is_retryable());
        assert!(AiServiceError::Status { status: 429, body: String::new() }.is_retryable());
        assert!(AiServiceError::Status { status: 503, body: String::new() }.is_retryable());
        assert!(!AiServiceError::Status { status: 400, body: String::new() }.is_retryable());
        assert!(!AiServiceError::Blocked("SAFETY".into()).is_retryable());
        assert!(!AiServiceError::InvalidJson("eof".into()).is_retryable());
    }

    #[test]
    fn converts_to_upstream_core_error() {
        let err: CoreError = AiServiceError::Blocked("SAFETY".into()).into();
        assert_eq!(err.kind(), CoreErrorKind::Upstream);
        assert_eq!(
            err.fields().and_then(|f| f.get("reason")).map(String::as_str),
            Some("AI_BLOCKED")
        );
    }
}
