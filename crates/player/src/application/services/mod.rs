//! Application services
//!
//! One service per backend area. Services validate input, call the backend
//! through [`crate::application::Api`], and keep local state in sync.

pub mod chat_service;
pub mod match_service;
pub mod support_service;
pub mod user_service;

pub use chat_service::ChatService;
pub use match_service::MatchService;
pub use support_service::SupportService;
pub use user_service::UserService;
