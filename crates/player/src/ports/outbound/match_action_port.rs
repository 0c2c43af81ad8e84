//! Match-service calls issued by the matching room.

use galaxytalk_domain::{MatchId, WaitingUser};

use super::ApiError;

/// Backend effects of the match-offer flow.
///
/// Implemented by `MatchService`; mocked in room and dispatcher tests.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait::async_trait]
pub trait MatchActionPort: Send + Sync {
    /// Accept (`true`) or decline (`false`) an offer.
    async fn approve(&self, match_id: &MatchId, accepted: bool) -> Result<(), ApiError>;

    /// Leave the waiting pool.
    async fn cancel_matching(&self) -> Result<(), ApiError>;

    /// Users currently waiting, as reported by the server.
    async fn waiting_users(&self) -> Result<Vec<WaitingUser>, ApiError>;
}
