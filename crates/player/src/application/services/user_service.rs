//! User Service - session identity and interaction status
//!
//! Loads the logged-in user's base attributes and interaction state from the
//! backend into the [`SessionStore`], and logs out.

use std::sync::Arc;

use galaxytalk_domain::{Session, UserBase, UserStatus};

use crate::application::api::paths;
use crate::application::state::{SessionStore, SessionUpdate};
use crate::application::{Api, ServiceError};

pub struct UserService {
    api: Api,
    session: Arc<SessionStore>,
}

impl UserService {
    pub fn new(api: Api, session: Arc<SessionStore>) -> Self {
        Self { api, session }
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    /// Fetch `GET /oauth` and `GET /oauth/status` into the store.
    ///
    /// An expired session resets the store before the error is returned.
    pub async fn load_session(&self) -> Result<Session, ServiceError> {
        let base = self
            .api
            .get_optional::<UserBase>(paths::SESSION)
            .await
            .map_err(|e| self.on_error(e.into()))?
            .ok_or(ServiceError::NotLoggedIn)?;
        self.session.apply(SessionUpdate::Base(base));

        self.refresh_status().await?;
        Ok(self.session.snapshot())
    }

    pub async fn refresh_status(&self) -> Result<UserStatus, ServiceError> {
        let status = self
            .api
            .get_optional::<UserStatus>(paths::STATUS)
            .await
            .map_err(|e| self.on_error(e.into()))?
            .unwrap_or_default();
        self.session.apply(SessionUpdate::Status(status));
        Ok(status)
    }

    /// Logs out on the server, then clears local state whatever the outcome.
    pub async fn logout(&self) -> Result<(), ServiceError> {
        let result = self.api.post_empty(paths::LOGOUT).await;
        self.session.reset();
        result.map_err(ServiceError::from)
    }

    fn on_error(&self, error: ServiceError) -> ServiceError {
        if error.is_session_expired() {
            tracing::warn!("Session expired, clearing local session");
            self.session.reset();
        }
        error
    }
}
