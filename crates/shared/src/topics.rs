//! STOMP destinations published by the match service.

use galaxytalk_domain::UserId;

/// Broadcast when a user joins the waiting pool.
pub const NEW_USER_TOPIC: &str = "/topic/matching/users/new";

/// Broadcast when a user leaves the waiting pool.
pub const EXIT_USER_TOPIC: &str = "/topic/matching/users/exit";

/// Broker endpoint path, relative to the API base URL.
pub const MATCH_WS_PATH: &str = "/match/ws";

/// The endpoint is served through SockJS; raw WebSocket clients use its
/// `/websocket` transport.
pub const SOCKJS_WEBSOCKET_SUFFIX: &str = "/websocket";

/// Per-user destination carrying offers, waiting notices and chat handoffs.
pub fn user_topic(user_id: &UserId) -> String {
    format!("/topic/matching/{}", user_id)
}

/// The kind of stream a destination carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TopicKind {
    User,
    Pool,
}

/// Classify a destination the client subscribed to.
pub fn classify(destination: &str) -> Option<TopicKind> {
    match destination {
        NEW_USER_TOPIC | EXIT_USER_TOPIC => Some(TopicKind::Pool),
        d if d.starts_with("/topic/matching/") => Some(TopicKind::User),
        _ => None,
    }
}
