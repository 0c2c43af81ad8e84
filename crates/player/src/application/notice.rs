//! User-facing notices and the error-to-notice policy.

use std::fmt;

use crate::application::ServiceError;
use crate::ports::outbound::ApiError;

pub const WAITING_FOR_COUNTERPART: &str = "Waiting for the other person to accept.";
pub const LOOKING_FOR_SOMEONE_ELSE: &str = "Looking for someone else to talk to.";
pub const COUNTERPART_PASSED: &str =
    "The other person passed on this match. Looking for someone else.";
pub const MATCH_TIMED_OUT: &str = "No response in time. Matching was cancelled.";
pub const MATCHING_CANCELLED: &str = "Matching was cancelled.";
pub const CONNECTION_LOST: &str = "Lost connection to the matching server.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Warning,
    Error,
}

impl fmt::Display for NoticeLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NoticeLevel::Info => write!(f, "info"),
            NoticeLevel::Success => write!(f, "success"),
            NoticeLevel::Warning => write!(f, "warning"),
            NoticeLevel::Error => write!(f, "error"),
        }
    }
}

/// A toast-style message for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
    /// The session is unusable; the caller must clear it and return to login.
    pub force_logout: bool,
}

impl Notice {
    fn new(level: NoticeLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            force_logout: false,
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Info, message)
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Success, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Warning, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Error, message)
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.level, self.message)
    }
}

/// Map a failed backend call to what the user should see.
pub fn notice_for_api_error(error: &ApiError) -> Notice {
    match error {
        ApiError::SessionExpired => Notice {
            force_logout: true,
            ..Notice::error("Your session has expired. Please log in again.")
        },
        ApiError::Unauthorized => Notice::warning("Please log in again."),
        ApiError::Forbidden(_) => Notice::error("You are not allowed to do that."),
        ApiError::Network(_) => Notice::error("Could not reach the server."),
        ApiError::AiAnswerNotReady => Notice::info("AI questions are still being prepared."),
        ApiError::Rejected(message)
        | ApiError::BadRequest(message)
        | ApiError::NotFound(message)
            if !message.is_empty() =>
        {
            Notice::error(message.clone())
        }
        other => Notice::error(other.to_string()),
    }
}

pub fn notice_for_error(error: &ServiceError) -> Notice {
    match error {
        ServiceError::Api(e) => notice_for_api_error(e),
        ServiceError::Invalid(e) => Notice::warning(e.to_string()),
        ServiceError::EmptyResponse => Notice::error(error.to_string()),
        ServiceError::NotLoggedIn => Notice::warning("Please log in first."),
    }
}
