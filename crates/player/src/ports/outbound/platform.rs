//! Platform abstraction ports
//!
//! Storage and time sit behind traits so the session store and chat handoff
//! persistence can be exercised in tests without touching the real config
//! directory or the wall clock.

use chrono::{DateTime, Utc};

/// Time operations abstraction
pub trait TimeProvider: Send + Sync + 'static {
    fn now(&self) -> DateTime<Utc>;
}

/// Persistent key/value storage (file-backed on desktop)
pub trait StorageProvider: Send + Sync + 'static {
    /// Save a string value with the given key
    fn save(&self, key: &str, value: &str);

    /// Load a string value by key, returns None if not found
    fn load(&self, key: &str) -> Option<String>;

    /// Remove a value by key
    fn remove(&self, key: &str);
}

/// Storage key constants
///
/// These are kept in the ports layer as they define the contract for
/// what keys are used across the application.
pub mod storage_keys {
    /// Serialized `UserBase` of the logged-in user
    pub const USER_BASE: &str = "galaxytalk_user_base";
    /// Last known interaction state (idle/matching/chatting)
    pub const INTERACTION_STATE: &str = "galaxytalk_interaction_state";
    /// Chat handoff record read by the chat surface
    pub const CHAT_HANDOFF: &str = "chatdata";
}
