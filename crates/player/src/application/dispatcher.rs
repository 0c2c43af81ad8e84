//! Outbound action dispatcher for the matching room.
//!
//! Executes approve/decline/leave-pool calls exactly as asked. A failed call is
//! logged and turned into a [`Notice`]; nothing is retried.

use std::sync::Arc;

use galaxytalk_domain::{MatchId, WaitingUser};

use crate::application::notice::{notice_for_api_error, Notice};
use crate::ports::outbound::MatchActionPort;

#[derive(Clone)]
pub struct ActionDispatcher {
    actions: Arc<dyn MatchActionPort>,
}

impl ActionDispatcher {
    pub fn new(actions: Arc<dyn MatchActionPort>) -> Self {
        Self { actions }
    }

    /// `None` on success.
    pub async fn approve(&self, match_id: &MatchId, accepted: bool) -> Option<Notice> {
        match self.actions.approve(match_id, accepted).await {
            Ok(()) => {
                tracing::info!(match_id = %match_id, accepted, "Offer answered");
                None
            }
            Err(e) => {
                tracing::error!(match_id = %match_id, accepted, error = %e, "Failed to answer offer");
                Some(notice_for_api_error(&e))
            }
        }
    }

    pub async fn leave_pool(&self) -> Option<Notice> {
        match self.actions.cancel_matching().await {
            Ok(()) => {
                tracing::info!("Left the waiting pool");
                None
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to leave the waiting pool");
                Some(notice_for_api_error(&e))
            }
        }
    }

    pub async fn waiting_users(&self) -> Result<Vec<WaitingUser>, Notice> {
        self.actions.waiting_users().await.map_err(|e| {
            tracing::warn!(error = %e, "Failed to load waiting users");
            notice_for_api_error(&e)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::outbound::{ApiError, MockMatchActionPort};
    use mockall::predicate::eq;

    #[tokio::test]
    async fn successful_approve_has_no_notice() {
        let mut actions = MockMatchActionPort::new();
        actions
            .expect_approve()
            .with(eq(MatchId::new("42")), eq(true))
            .times(1)
            .returning(|_, _| Ok(()));
        let dispatcher = ActionDispatcher::new(Arc::new(actions));

        assert_eq!(dispatcher.approve(&MatchId::new("42"), true).await, None);
    }

    #[tokio::test]
    async fn failures_become_notices_without_retry() {
        let mut actions = MockMatchActionPort::new();
        actions
            .expect_cancel_matching()
            .times(1)
            .returning(|| Err(ApiError::Network("connection reset".into())));
        actions
            .expect_approve()
            .times(1)
            .returning(|_, _| Err(ApiError::SessionExpired));
        let dispatcher = ActionDispatcher::new(Arc::new(actions));

        let notice = dispatcher.leave_pool().await.unwrap();
        assert!(!notice.force_logout);

        let notice = dispatcher.approve(&MatchId::new("1"), false).await.unwrap();
        assert!(notice.force_logout);
    }

    #[tokio::test]
    async fn waiting_users_error_is_a_notice() {
        let mut actions = MockMatchActionPort::new();
        actions
            .expect_waiting_users()
            .returning(|| Err(ApiError::Rejected("not in pool".into())));
        let dispatcher = ActionDispatcher::new(Arc::new(actions));

        let notice = dispatcher.waiting_users().await.unwrap_err();
        assert_eq!(notice.message, "not in pool");
    }
}
