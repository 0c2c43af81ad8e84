//! Broker connection lifecycle.
//!
//! The bridge task publishes [`ConnectionState`] on a `watch` channel. A
//! [`ConnectionHandle`] owns the link: disconnecting it, or dropping it,
//! stops the bridge task and closes the socket.

use std::fmt;

use tokio::sync::{oneshot, watch};

use crate::ports::outbound::SubscriptionGuard;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    /// Opening the socket or waiting for CONNECTED
    Connecting,
    Connected,
    /// Lost the socket, backing off before the next attempt
    Reconnecting,
    /// Retries exhausted or the broker refused the session
    Failed,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
            ConnectionState::Reconnecting => "reconnecting",
            ConnectionState::Failed => "failed",
        })
    }
}

/// Publishing side, held by the bridge task.
pub type StatePublisher = watch::Sender<ConnectionState>;

pub fn state_channel() -> (StatePublisher, watch::Receiver<ConnectionState>) {
    watch::channel(ConnectionState::Disconnected)
}

/// Owning handle of a broker connection.
pub struct ConnectionHandle {
    state: watch::Receiver<ConnectionState>,
    disconnect_tx: Option<oneshot::Sender<()>>,
}

impl ConnectionHandle {
    pub fn new(state: watch::Receiver<ConnectionState>, disconnect_tx: oneshot::Sender<()>) -> Self {
        Self {
            state,
            disconnect_tx: Some(disconnect_tx),
        }
    }

    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    /// A receiver that sees every later state change.
    pub fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.state.clone()
    }

    /// Whether `disconnect()` has not been called yet.
    pub fn is_active(&self) -> bool {
        self.disconnect_tx.is_some()
    }

    /// Ask the bridge to close. Idempotent; the socket closes asynchronously.
    pub fn disconnect(&mut self) {
        if let Some(tx) = self.disconnect_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl SubscriptionGuard for ConnectionHandle {
    fn close(&mut self) {
        self.disconnect();
    }
}
