//! Infrastructure adapters: REST client, broker transport, local storage.

pub mod http_client;
pub mod message_translator;
pub mod messaging;
pub mod platform;
pub mod websocket;

pub use http_client::ApiAdapter;
pub use messaging::{ConnectionState, EventBus};
pub use websocket::StompRealtimeAdapter;
