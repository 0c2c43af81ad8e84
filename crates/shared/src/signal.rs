//! Data-channel signals exchanged between the two chat participants.
//!
//! The media relay forwards these verbatim; each signal has a topic name and a
//! small JSON payload stamped with the sender's clock.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const LEAVE_TOPIC: &str = "leave";
pub const REACTION_TOPIC: &str = "reaction";
pub const LEAVE_TEXT: &str = "leave room";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeavePayload {
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactionPayload {
    pub emoji: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatSignal {
    /// The counterpart left; the receiver should close the chat.
    Leave(LeavePayload),
    Reaction(ReactionPayload),
}

impl ChatSignal {
    pub fn leave(now: DateTime<Utc>) -> Self {
        ChatSignal::Leave(LeavePayload {
            text: LEAVE_TEXT.to_string(),
            timestamp: now,
        })
    }

    pub fn reaction(emoji: impl Into<String>, now: DateTime<Utc>) -> Self {
        ChatSignal::Reaction(ReactionPayload {
            emoji: emoji.into(),
            timestamp: now,
        })
    }

    pub fn topic(&self) -> &'static str {
        match self {
            ChatSignal::Leave(_) => LEAVE_TOPIC,
            ChatSignal::Reaction(_) => REACTION_TOPIC,
        }
    }

    /// Payload as sent on the data channel.
    pub fn to_payload(&self) -> Result<String, serde_json::Error> {
        match self {
            ChatSignal::Leave(p) => serde_json::to_string(p),
            ChatSignal::Reaction(p) => serde_json::to_string(p),
        }
    }

    /// Decode a received signal. Unknown topics yield `Ok(None)`.
    pub fn from_parts(topic: &str, payload: &str) -> Result<Option<Self>, serde_json::Error> {
        match topic {
            LEAVE_TOPIC => Ok(Some(ChatSignal::Leave(serde_json::from_str(payload)?))),
            REACTION_TOPIC => Ok(Some(ChatSignal::Reaction(serde_json::from_str(payload)?))),
            _ => Ok(None),
        }
    }
}
