//! Application layer - use cases and orchestration of the matching flow

pub mod api;
pub mod countdown;
pub mod dispatcher;
pub mod error;
pub mod matching_room;
pub mod notice;
pub mod services;
pub mod state;
pub mod validation;

pub use api::Api;
pub use error::ServiceError;
pub use notice::{notice_for_error, Notice, NoticeLevel};
