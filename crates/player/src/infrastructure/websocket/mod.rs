//! WebSocket transport for the match broker
//!
//! - `client`: tokio-tungstenite STOMP client with reconnect backoff
//! - `bridge`: connects the client to the `EventBus` and exposes the
//!   `RealtimePort` adapter
//! - `core`: runtime-free backoff and subscription bookkeeping

mod bridge;
mod client;
mod core;

pub use bridge::{
    create_connection, jar_cookie_source, ws_url_from_api_base, StompRealtimeAdapter,
};
pub use client::{CookieSource, StompClient};
pub use core::{BackoffState, SubscriptionRegistry};
