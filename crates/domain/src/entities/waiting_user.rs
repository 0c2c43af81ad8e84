//! Users currently sitting in the matching pool.

use serde::{Deserialize, Serialize};

use crate::serde_helpers::{lenient_mbti, optional_string_or_number};
use crate::{Mbti, UserId};

/// Lifecycle status of a pool member as reported by the match service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchStatus {
    #[default]
    Waiting,
    MatchSuccess,
    MatchFailed,
    ChatCreated,

    /// Forward-compatibility fallback for newer variants.
    #[serde(other)]
    Unknown,
}

/// Another user waiting to be matched, as shown in the local pool view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WaitingUser {
    pub user_id: UserId,
    #[serde(default)]
    pub concern: String,
    #[serde(default, deserialize_with = "lenient_mbti")]
    pub mbti: Option<Mbti>,
    #[serde(default)]
    pub status: MatchStatus,
    /// Pool entry time; epoch milliseconds on the wire
    #[serde(
        default,
        deserialize_with = "optional_string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub start_time: Option<String>,
}

impl WaitingUser {
    pub fn new(user_id: impl Into<UserId>, concern: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            concern: concern.into(),
            mbti: None,
            status: MatchStatus::Waiting,
            start_time: None,
        }
    }

    pub fn with_mbti(mut self, mbti: Mbti) -> Self {
        self.mbti = Some(mbti);
        self
    }
}
