//! Runtime-free pieces of the broker client: reconnect backoff and the
//! subscription registry.
//!
//! The socket itself lives in `client`; these types hold no I/O so the
//! reconnect math and subscription bookkeeping can be tested directly.

// Reconnection constants
pub const INITIAL_RETRY_DELAY_MS: u64 = 1_000;
pub const MAX_RETRY_DELAY_MS: u64 = 30_000;
pub const MAX_RETRY_ATTEMPTS: u32 = 10;
pub const BACKOFF_MULTIPLIER: f64 = 2.0;

/// Heart-beat we offer in CONNECT: `(client_sends_every_ms, client_wants_every_ms)`.
pub const CLIENT_HEARTBEAT_MS: (u64, u64) = (10_000, 10_000);

/// Exponential backoff state shared by reconnect logic.
#[derive(Debug, Clone, Copy)]
pub struct BackoffState {
    attempts: u32,
    delay_ms: u64,
}

impl Default for BackoffState {
    fn default() -> Self {
        Self {
            attempts: 0,
            delay_ms: INITIAL_RETRY_DELAY_MS,
        }
    }
}

impl BackoffState {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn delay_ms(&self) -> u64 {
        self.delay_ms
    }

    pub fn is_exhausted(&self) -> bool {
        self.attempts >= MAX_RETRY_ATTEMPTS
    }

    /// Advance to the next attempt, updating the delay for the subsequent attempt.
    ///
    /// Returns the delay to wait *before* performing this attempt.
    pub fn next_delay_and_advance(&mut self) -> Option<u64> {
        if self.is_exhausted() {
            return None;
        }

        let current_delay = self.delay_ms;
        self.attempts += 1;
        self.delay_ms =
            ((self.delay_ms as f64) * BACKOFF_MULTIPLIER).min(MAX_RETRY_DELAY_MS as f64) as u64;
        Some(current_delay)
    }
}

/// Client-side heart-beat interval agreed with the server, if any.
///
/// STOMP 1.2: the client sends every `max(cx, sy)` ms when both are non-zero.
pub fn outgoing_heartbeat_ms(client_offer: u64, server_expects: u64) -> Option<u64> {
    if client_offer == 0 || server_expects == 0 {
        None
    } else {
        Some(client_offer.max(server_expects))
    }
}

/// Destinations this client is subscribed to, keyed by stable subscription id.
///
/// Ids survive reconnects so the same SUBSCRIBE frames can be replayed.
#[derive(Debug, Default)]
pub struct SubscriptionRegistry {
    next_id: u32,
    entries: Vec<(String, String)>,
}

impl SubscriptionRegistry {
    /// Register `destination` and return its id. Registering twice returns the existing id.
    pub fn register(&mut self, destination: &str) -> String {
        if let Some((id, _)) = self.entries.iter().find(|(_, d)| d == destination) {
            return id.clone();
        }
        let id = format!("sub-{}", self.next_id);
        self.next_id += 1;
        self.entries.push((id.clone(), destination.to_string()));
        id
    }

    pub fn destination(&self, id: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(i, _)| i == id)
            .map(|(_, d)| d.as_str())
    }

    /// `(id, destination)` pairs in registration order.
    pub fn entries(&self) -> &[(String, String)] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every registration, returning how many were removed.
    pub fn clear(&mut self) -> usize {
        let count = self.entries.len();
        self.entries.clear();
        count
    }
}
