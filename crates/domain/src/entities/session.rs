//! Identity, profile attributes and interaction status of the local user.
//!
//! Base attributes and interaction status are fetched from different
//! endpoints on different triggers, so they are kept as separate values and
//! only combined inside [`Session`].

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::serde_helpers::lenient_mbti;
use crate::{Mbti, UserId};

/// Account role granted by the auth service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "ROLE_ADMIN")]
    Admin,
    #[serde(rename = "ROLE_USER")]
    User,
    #[serde(rename = "ROLE_GUEST")]
    Guest,
    #[serde(rename = "ROLE_WITHDRAW")]
    Withdrawn,
    #[serde(rename = "ROLE_RESTRICTED")]
    Restricted,
}

impl Role {
    /// Roles allowed to enter the matching pool.
    pub fn can_match(&self) -> bool {
        matches!(self, Role::Admin | Role::User)
    }
}

/// Coarse-grained activity mode, independent of profile attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum InteractionState {
    #[default]
    Idle,
    Matching,
    Chatting,
}

impl fmt::Display for InteractionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InteractionState::Idle => write!(f, "idle"),
            InteractionState::Matching => write!(f, "matching"),
            InteractionState::Chatting => write!(f, "chatting"),
        }
    }
}

/// Base attributes returned by the session-info query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UserBase {
    pub user_id: UserId,
    #[serde(default, deserialize_with = "lenient_mbti")]
    pub mbti: Option<Mbti>,
    #[serde(default)]
    pub planet_id: i32,
    #[serde(default)]
    pub energy: i32,
    #[serde(default)]
    pub role: Option<Role>,
}

impl UserBase {
    pub fn is_anonymous(&self) -> bool {
        self.user_id.is_empty()
    }
}

/// Interaction status returned by the status query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UserStatus {
    #[serde(default)]
    pub user_interaction_state: InteractionState,
}

/// Full local session snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Session {
    pub base: UserBase,
    pub status: UserStatus,
}

impl Session {
    /// Anonymous default used before login and after logout.
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn user_id(&self) -> &UserId {
        &self.base.user_id
    }

    pub fn interaction_state(&self) -> InteractionState {
        self.status.user_interaction_state
    }
}
