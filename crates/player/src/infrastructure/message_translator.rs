//! Translates broker MESSAGE bodies into `RealtimeEvent`s for the application layer
//!
//! The destination decides which envelope family applies: the per-user topic
//! carries `MatchingEvent`s, the two pool topics carry `PoolEvent`s. Anything
//! that fails to decode is logged and dropped here so transport noise never
//! reaches the matching room.

use galaxytalk_shared::topics::{self, TopicKind};
use galaxytalk_shared::{MatchingEnvelope, MatchingEvent, PoolEvent};

use crate::ports::outbound::RealtimeEvent;

/// Translate a MESSAGE body received on `destination`.
///
/// Returns `None` for unknown destinations, malformed bodies and unknown
/// event types.
pub fn translate(destination: &str, body: &str) -> Option<RealtimeEvent> {
    let Some(kind) = topics::classify(destination) else {
        tracing::warn!(destination, "Message on unexpected destination");
        return None;
    };

    let envelope = match MatchingEnvelope::parse(body) {
        Ok(envelope) => envelope,
        Err(e) => {
            tracing::warn!(destination, error = %e, "Failed to parse envelope");
            return None;
        }
    };

    let decoded = match kind {
        TopicKind::User => MatchingEvent::from_envelope(&envelope).map(RealtimeEvent::Matching),
        TopicKind::Pool => PoolEvent::from_envelope(&envelope).map(RealtimeEvent::Pool),
    };

    match decoded {
        Ok(event) => {
            tracing::debug!(destination, kind = %envelope.kind, "Real-time event");
            Some(event)
        }
        Err(e) => {
            tracing::warn!(destination, kind = %envelope.kind, error = %e, "Dropping real-time message");
            None
        }
    }
}
