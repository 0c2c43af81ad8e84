//! REST error taxonomy shared by every backend call.

use thiserror::Error;

/// Status code the backend uses when AI question generation has not finished.
pub const STATUS_AI_ANSWER_NOT_READY: u16 = 498;
/// Status code the backend uses when the login session is gone for good.
pub const STATUS_SESSION_EXPIRED: u16 = 499;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("AI answer is not ready yet")]
    AiAnswerNotReady,

    #[error("Session expired")]
    SessionExpired,

    /// 2xx response whose envelope carried `success: false`.
    #[error("Request rejected: {0}")]
    Rejected(String),

    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Failed to parse response: {0}")]
    ParseError(String),

    #[error("Failed to serialize request: {0}")]
    SerializeError(String),
}

impl ApiError {
    /// Classify a non-success status code. `message` is the server's message, if any.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            400 => ApiError::BadRequest(message),
            401 => ApiError::Unauthorized,
            403 => ApiError::Forbidden(message),
            404 => ApiError::NotFound(message),
            STATUS_AI_ANSWER_NOT_READY => ApiError::AiAnswerNotReady,
            STATUS_SESSION_EXPIRED => ApiError::SessionExpired,
            _ => ApiError::Http { status, message },
        }
    }

    /// Status code this error was built from, when there is one.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::BadRequest(_) => Some(400),
            ApiError::Unauthorized => Some(401),
            ApiError::Forbidden(_) => Some(403),
            ApiError::NotFound(_) => Some(404),
            ApiError::AiAnswerNotReady => Some(STATUS_AI_ANSWER_NOT_READY),
            ApiError::SessionExpired => Some(STATUS_SESSION_EXPIRED),
            ApiError::Http { status, .. } => Some(*status),
            ApiError::Network(_)
            | ApiError::Rejected(_)
            | ApiError::ParseError(_)
            | ApiError::SerializeError(_) => None,
        }
    }
}
