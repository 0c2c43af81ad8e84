//! Service layer error types
//!
//! Services validate input before talking to the backend, so callers see
//! either a domain validation failure or the backend's [`ApiError`].

use galaxytalk_domain::DomainError;

use crate::ports::outbound::ApiError;

/// Errors that can occur in service operations
#[derive(Debug, Clone, PartialEq)]
pub enum ServiceError {
    /// Input rejected before any request was sent
    Invalid(DomainError),
    /// Backend call failed
    Api(ApiError),
    /// Response was empty when data was expected
    EmptyResponse,
    /// No logged-in user to act for
    NotLoggedIn,
}

impl std::fmt::Display for ServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServiceError::Invalid(e) => write!(f, "{}", e),
            ServiceError::Api(e) => write!(f, "{}", e),
            ServiceError::EmptyResponse => write!(f, "Server returned empty response"),
            ServiceError::NotLoggedIn => write!(f, "Not logged in"),
        }
    }
}

impl std::error::Error for ServiceError {}

impl From<ApiError> for ServiceError {
    fn from(e: ApiError) -> Self {
        ServiceError::Api(e)
    }
}

impl From<DomainError> for ServiceError {
    fn from(e: DomainError) -> Self {
        ServiceError::Invalid(e)
    }
}

impl ServiceError {
    /// The backend reported that the login session is gone for good.
    pub fn is_session_expired(&self) -> bool {
        matches!(self, ServiceError::Api(ApiError::SessionExpired))
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(
            self,
            ServiceError::Api(ApiError::Unauthorized) | ServiceError::NotLoggedIn
        )
    }
}
