//! Client-side state owned by the application layer.

pub mod match_offer;
pub mod session_store;
pub mod waiting_pool;

pub use match_offer::{Effect, MatchOfferMachine, OfferInput, OfferState, OFFER_TIMEOUT_SECS};
pub use session_store::{SessionStore, SessionUpdate};
pub use waiting_pool::{WaitingPool, WAITING_POOL_CAP};
