//! GalaxyTalk domain: matching entities, value objects and invariants.
//!
//! Pure types only. No I/O, no async, no transport concerns.

pub mod entities;
pub mod error;
pub mod ids;
pub mod serde_helpers;
pub mod value_objects;

pub use entities::{
    ChatHandoff, InteractionState, MatchOffer, MatchStatus, Role, Session, UserBase, UserStatus,
    WaitingUser,
};
pub use error::DomainError;
pub use ids::{ChatRoomId, MatchId, MediaSessionId, UserId};
pub use value_objects::{Concern, Mbti, CONCERN_MAX_CHARS, CONCERN_MIN_CHARS};
