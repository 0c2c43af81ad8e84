//! Real-time envelope carried in every STOMP MESSAGE body
//!
//! ```json
//! { "type": "MATCH_SUCCESS", "message": "...", "data": { ... } }
//! ```
//!
//! The canonical encoding is a plain JSON object. Some broker paths send the
//! envelope serialized a second time (a JSON string whose contents are the
//! object); both forms decode to the same event.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use galaxytalk_domain::{ChatHandoff, MatchOffer, UserId, WaitingUser};

#[derive(Debug, Error)]
pub enum EnvelopeError {
    #[error("Envelope is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Unknown event type: {0}")]
    UnknownType(String),
    #[error("Invalid payload for {kind}: {source}")]
    Payload {
        kind: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("Envelope body is not an object")]
    NotAnObject,
}

/// Raw envelope, before dispatch on `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchingEnvelope {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Value,
}

impl MatchingEnvelope {
    pub fn new(kind: impl Into<String>, data: Value) -> Self {
        Self {
            kind: kind.into(),
            message: None,
            data,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Parse a MESSAGE body, unwrapping one level of string encoding if present.
    pub fn parse(body: &str) -> Result<Self, EnvelopeError> {
        let value: Value = serde_json::from_str(body)?;
        let value = match value {
            Value::String(inner) => serde_json::from_str(&inner)?,
            other => other,
        };
        if !value.is_object() {
            return Err(EnvelopeError::NotAnObject);
        }
        Ok(serde_json::from_value(value)?)
    }

    fn payload<T: for<'de> Deserialize<'de>>(
        &self,
        kind: &'static str,
    ) -> Result<T, EnvelopeError> {
        T::deserialize(&self.data).map_err(|source| EnvelopeError::Payload { kind, source })
    }
}

/// Events on the per-user topic `/topic/matching/{userId}`.
#[derive(Debug, Clone, PartialEq)]
pub enum MatchingEvent {
    MatchSuccess(MatchOffer),
    Waiting { message: Option<String> },
    MatchFailed { message: Option<String> },
    ChatCreated(ChatHandoff),
}

impl MatchingEvent {
    pub const MATCH_SUCCESS: &'static str = "MATCH_SUCCESS";
    pub const WAITING: &'static str = "WAITING";
    pub const MATCH_FAILED: &'static str = "MATCH_FAILED";
    pub const CHAT_CREATED: &'static str = "CHAT_CREATED";

    pub fn kind(&self) -> &'static str {
        match self {
            MatchingEvent::MatchSuccess(_) => Self::MATCH_SUCCESS,
            MatchingEvent::Waiting { .. } => Self::WAITING,
            MatchingEvent::MatchFailed { .. } => Self::MATCH_FAILED,
            MatchingEvent::ChatCreated(_) => Self::CHAT_CREATED,
        }
    }

    pub fn from_envelope(envelope: &MatchingEnvelope) -> Result<Self, EnvelopeError> {
        match envelope.kind.as_str() {
            Self::MATCH_SUCCESS => Ok(MatchingEvent::MatchSuccess(
                envelope.payload(Self::MATCH_SUCCESS)?,
            )),
            Self::WAITING => Ok(MatchingEvent::Waiting {
                message: envelope.message.clone(),
            }),
            Self::MATCH_FAILED => Ok(MatchingEvent::MatchFailed {
                message: envelope.message.clone(),
            }),
            Self::CHAT_CREATED => Ok(MatchingEvent::ChatCreated(
                envelope.payload(Self::CHAT_CREATED)?,
            )),
            other => Err(EnvelopeError::UnknownType(other.to_string())),
        }
    }

    pub fn decode(body: &str) -> Result<Self, EnvelopeError> {
        Self::from_envelope(&MatchingEnvelope::parse(body)?)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExitPayload {
    user_id: UserId,
}

/// Events on the pool-wide topics.
#[derive(Debug, Clone, PartialEq)]
pub enum PoolEvent {
    NewUser(WaitingUser),
    ExitUser(UserId),
}

impl PoolEvent {
    pub const NEW_USER: &'static str = "NEW_USER";
    pub const EXIT_USER: &'static str = "EXIT_USER";

    pub fn from_envelope(envelope: &MatchingEnvelope) -> Result<Self, EnvelopeError> {
        match envelope.kind.as_str() {
            Self::NEW_USER => Ok(PoolEvent::NewUser(envelope.payload(Self::NEW_USER)?)),
            Self::EXIT_USER => {
                let exit: ExitPayload = envelope.payload(Self::EXIT_USER)?;
                Ok(PoolEvent::ExitUser(exit.user_id))
            }
            other => Err(EnvelopeError::UnknownType(other.to_string())),
        }
    }

    pub fn decode(body: &str) -> Result<Self, EnvelopeError> {
        Self::from_envelope(&MatchingEnvelope::parse(body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use galaxytalk_domain::Mbti;
    use serde_json::json;

    #[test]
    fn decodes_match_success() {
        let body = json!({
            "type": "MATCH_SUCCESS",
            "message": "matched",
            "data": {
                "matchId": "42",
                "userId": "me",
                "matchUserId": "you",
                "concern": "career",
                "mbti": "ENTP",
                "energy": 55,
                "similarity": 87
            }
        })
        .to_string();

        let MatchingEvent::MatchSuccess(offer) = MatchingEvent::decode(&body).unwrap() else {
            panic!("expected MATCH_SUCCESS");
        };
        assert_eq!(offer.match_id, "42");
        assert_eq!(offer.concern, "career");
        assert_eq!(offer.mbti, Some(Mbti::Entp));
        assert_eq!(offer.energy, 55);
    }

    #[test]
    fn double_encoded_body_decodes_the_same() {
        let inner = json!({
            "type": "CHAT_CREATED",
            "data": {"chatRoomId": "room-9", "sessionId": "ses-1", "token": "tok"}
        })
        .to_string();
        let outer = serde_json::to_string(&inner).unwrap();

        let plain = MatchingEvent::decode(&inner).unwrap();
        let doubled = MatchingEvent::decode(&outer).unwrap();
        assert_eq!(plain, doubled);
        assert_eq!(plain.kind(), MatchingEvent::CHAT_CREATED);
    }

    #[test]
    fn waiting_and_failed_carry_message_only() {
        let body = r#"{"type":"WAITING","message":"still looking","data":null}"#;
        assert_eq!(
            MatchingEvent::decode(body).unwrap(),
            MatchingEvent::Waiting {
                message: Some("still looking".into())
            }
        );

        let body = r#"{"type":"MATCH_FAILED","data":{}}"#;
        assert_eq!(
            MatchingEvent::decode(body).unwrap(),
            MatchingEvent::MatchFailed { message: None }
        );
    }

    #[test]
    fn decodes_pool_events() {
        let body = r#"{"type":"NEW_USER","data":{"userId":"u-2","concern":"exam stress","mbti":"ISFJ","status":"WAITING"}}"#;
        let PoolEvent::NewUser(user) = PoolEvent::decode(body).unwrap() else {
            panic!("expected NEW_USER");
        };
        assert_eq!(user.user_id, "u-2");

        let body = r#"{"type":"EXIT_USER","data":{"userId":"u-2"}}"#;
        assert_eq!(
            PoolEvent::decode(body).unwrap(),
            PoolEvent::ExitUser(UserId::new("u-2"))
        );
    }

    #[test]
    fn rejects_unknown_and_malformed() {
        assert!(matches!(
            MatchingEvent::decode(r#"{"type":"SOMETHING","data":{}}"#),
            Err(EnvelopeError::UnknownType(t)) if t == "SOMETHING"
        ));
        assert!(matches!(
            MatchingEvent::decode("not json"),
            Err(EnvelopeError::Json(_))
        ));
        assert!(matches!(
            MatchingEvent::decode("[1,2]"),
            Err(EnvelopeError::NotAnObject)
        ));
        assert!(matches!(
            MatchingEvent::decode(r#"{"type":"MATCH_SUCCESS","data":{"concern":"x"}}"#),
            Err(EnvelopeError::Payload { kind: "MATCH_SUCCESS", .. })
        ));
        assert!(matches!(
            PoolEvent::decode(r#"{"type":"EXIT_USER","data":{}}"#),
            Err(EnvelopeError::Payload { .. })
        ));
    }
}
