//! Real-time subscription port
//!
//! A subscription is an acquired resource: it owns the broker connection for
//! one user and releases it when closed or dropped, whichever comes first.

use thiserror::Error;
use tokio::sync::mpsc;

use galaxytalk_domain::UserId;
use galaxytalk_shared::{MatchingEvent, PoolEvent};

/// Decoded event delivered to the matching room.
#[derive(Debug, Clone, PartialEq)]
pub enum RealtimeEvent {
    /// Per-user topic: offers, waiting notices, chat handoff.
    Matching(MatchingEvent),
    /// Pool-wide topics: users joining or leaving.
    Pool(PoolEvent),
    /// The transport gave up (reconnect attempts exhausted).
    TransportFailed(String),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RealtimeError {
    #[error("Invalid real-time endpoint: {0}")]
    InvalidUrl(String),
    #[error("Real-time transport error: {0}")]
    Transport(String),
}

/// Releases the transport behind a subscription. `close` must be idempotent.
pub trait SubscriptionGuard: Send {
    fn close(&mut self);
}

/// Live subscription for one user.
pub struct RealtimeSubscription {
    events: mpsc::UnboundedReceiver<RealtimeEvent>,
    guard: Option<Box<dyn SubscriptionGuard>>,
}

impl RealtimeSubscription {
    pub fn new(
        events: mpsc::UnboundedReceiver<RealtimeEvent>,
        guard: Box<dyn SubscriptionGuard>,
    ) -> Self {
        Self {
            events,
            guard: Some(guard),
        }
    }

    /// Next event, or `None` once the subscription is closed and drained.
    pub async fn next_event(&mut self) -> Option<RealtimeEvent> {
        self.events.recv().await
    }

    pub fn is_open(&self) -> bool {
        self.guard.is_some()
    }

    /// Tear the subscription down. Safe to call more than once.
    pub fn close(&mut self) {
        if let Some(mut guard) = self.guard.take() {
            guard.close();
            self.events.close();
        }
    }
}

impl Drop for RealtimeSubscription {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for RealtimeSubscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RealtimeSubscription")
            .field("open", &self.is_open())
            .finish()
    }
}

/// Opens broker subscriptions for the matching flow.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait::async_trait]
pub trait RealtimePort: Send + Sync {
    /// Subscribe to the per-user topic of `user_id` and both pool topics.
    async fn subscribe(&self, user_id: &UserId) -> Result<RealtimeSubscription, RealtimeError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingGuard(Arc<AtomicUsize>);

    impl SubscriptionGuard for CountingGuard {
        fn close(&mut self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn close_runs_guard_once() {
        let closes = Arc::new(AtomicUsize::new(0));
        let (_tx, rx) = mpsc::unbounded_channel();
        let mut sub = RealtimeSubscription::new(rx, Box::new(CountingGuard(closes.clone())));

        assert!(sub.is_open());
        sub.close();
        sub.close();
        drop(sub);

        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn drop_releases_guard() {
        let closes = Arc::new(AtomicUsize::new(0));
        let (_tx, rx) = mpsc::unbounded_channel();
        drop(RealtimeSubscription::new(
            rx,
            Box::new(CountingGuard(closes.clone())),
        ));
        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn closed_subscription_drains_then_ends() {
        let closes = Arc::new(AtomicUsize::new(0));
        let (tx, rx) = mpsc::unbounded_channel();
        let mut sub = RealtimeSubscription::new(rx, Box::new(CountingGuard(closes)));

        tx.send(RealtimeEvent::TransportFailed("gone".into())).unwrap();
        sub.close();

        assert_eq!(
            sub.next_event().await,
            Some(RealtimeEvent::TransportFailed("gone".into()))
        );
        assert_eq!(sub.next_event().await, None);
    }
}
