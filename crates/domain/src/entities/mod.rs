//! Domain entities for the matching flow

mod chat;
mod match_offer;
mod session;
mod waiting_user;

pub use chat::ChatHandoff;
pub use match_offer::MatchOffer;
pub use session::{InteractionState, Role, Session, UserBase, UserStatus};
pub use waiting_user::{MatchStatus, WaitingUser};
