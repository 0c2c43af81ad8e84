//! Match Service - entering, leaving and answering in the waiting pool

use chrono::{DateTime, Utc};
use galaxytalk_domain::{MatchId, WaitingUser};
use galaxytalk_shared::{MatchApproveRequest, MatchStartTime};

use crate::application::api::paths;
use crate::application::{validation, Api, ServiceError};
use crate::ports::outbound::{ApiError, MatchActionPort};

#[derive(Clone)]
pub struct MatchService {
    api: Api,
}

impl MatchService {
    pub fn new(api: Api) -> Self {
        Self { api }
    }

    /// Join the waiting pool with a concern (10 to 100 characters) and an
    /// optional preferred MBTI code.
    pub async fn start_matching(
        &self,
        concern: &str,
        preferred_mbti: Option<&str>,
    ) -> Result<(), ServiceError> {
        let request = validation::match_start_request(concern, preferred_mbti)?;
        self.api.post_no_response(paths::MATCH, &request).await?;
        tracing::info!(preferred_mbti = ?request.preferred_mbti, "Joined the waiting pool");
        Ok(())
    }

    pub async fn cancel_matching(&self) -> Result<(), ApiError> {
        self.api.delete(paths::MATCH).await
    }

    pub async fn waiting_users(&self) -> Result<Vec<WaitingUser>, ApiError> {
        Ok(self
            .api
            .get_optional(paths::WAITING_USERS)
            .await?
            .unwrap_or_default())
    }

    /// When the current user entered the pool, if they are in it.
    ///
    /// A user outside the pool gets an unsuccessful envelope, not an error status.
    pub async fn start_time(&self) -> Result<Option<DateTime<Utc>>, ApiError> {
        match self.api.get_optional::<MatchStartTime>(paths::START_TIME).await {
            Ok(start) => Ok(start.map(|MatchStartTime(at)| at)),
            Err(ApiError::Rejected(message)) => {
                tracing::debug!(message = %message, "Not in the waiting pool");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    pub async fn approve(&self, match_id: &MatchId, accepted: bool) -> Result<(), ApiError> {
        let request = MatchApproveRequest {
            match_id: match_id.clone(),
            accepted,
        };
        self.api.post_no_response(paths::APPROVE, &request).await
    }
}

#[async_trait::async_trait]
impl MatchActionPort for MatchService {
    async fn approve(&self, match_id: &MatchId, accepted: bool) -> Result<(), ApiError> {
        MatchService::approve(self, match_id, accepted).await
    }

    async fn cancel_matching(&self) -> Result<(), ApiError> {
        MatchService::cancel_matching(self).await
    }

    async fn waiting_users(&self) -> Result<Vec<WaitingUser>, ApiError> {
        MatchService::waiting_users(self).await
    }
}
