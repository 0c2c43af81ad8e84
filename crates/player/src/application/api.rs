//! Typed API wrapper for application services.
//!
//! `Api` wraps an `Arc<dyn RawApiPort>` so the composition root can hand the
//! same object-safe adapter to every service, while services work with typed
//! request and response bodies via serde_json conversions.

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::sync::Arc;

use crate::ports::outbound::{ApiError, RawApiPort};

/// REST paths, relative to the versioned base URL.
pub mod paths {
    pub const SESSION: &str = "/oauth";
    pub const STATUS: &str = "/oauth/status";
    pub const LOGOUT: &str = "/oauth/logout";

    pub const MATCH: &str = "/match";
    pub const WAITING_USERS: &str = "/match/waiting-users";
    pub const START_TIME: &str = "/match/start-time";
    pub const APPROVE: &str = "/match/approve";

    pub const CHAT_RECONNECT: &str = "/chat/reconnect";
    pub const CHAT_ROOMS: &str = "/chat/rooms";

    pub const LETTERS: &str = "/comment";
    pub const FEEDBACK: &str = "/feedback";

    pub fn chat_leave(room: &str) -> String {
        format!("/chat/{room}/leave")
    }

    pub fn chat_message(room: &str) -> String {
        format!("/chat/{room}/message")
    }

    pub fn chat_messages(room: &str) -> String {
        format!("/chat/{room}/messages")
    }

    pub fn chat_ai(room: &str) -> String {
        format!("/chat/{room}/ai")
    }

    pub fn chat_participants(room: &str) -> String {
        format!("/chat/{room}/participants")
    }
}

#[derive(Clone)]
pub struct Api {
    raw: Arc<dyn RawApiPort>,
}

impl Api {
    pub fn new(raw: Arc<dyn RawApiPort>) -> Self {
        Self { raw }
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let value = self.raw.get_json(path).await?;
        parse(value)
    }

    /// `data: null` becomes `None`.
    pub async fn get_optional<T: DeserializeOwned>(
        &self,
        path: &str,
    ) -> Result<Option<T>, ApiError> {
        let value = self.raw.get_json(path).await?;
        parse_optional(value)
    }

    pub async fn post<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let body_value = to_body(body)?;
        let value = self.raw.post_json(path, &body_value).await?;
        parse(value)
    }

    pub async fn post_no_response<B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<(), ApiError> {
        let body_value = to_body(body)?;
        self.raw.post_json(path, &body_value).await.map(|_| ())
    }

    pub async fn post_empty_optional<T: DeserializeOwned>(
        &self,
        path: &str,
    ) -> Result<Option<T>, ApiError> {
        let value = self.raw.post_empty(path).await?;
        parse_optional(value)
    }

    pub async fn post_empty(&self, path: &str) -> Result<(), ApiError> {
        self.raw.post_empty(path).await.map(|_| ())
    }

    pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
        self.raw.delete(path).await.map(|_| ())
    }
}

fn to_body<B: Serialize>(body: &B) -> Result<Value, ApiError> {
    serde_json::to_value(body).map_err(|e| ApiError::SerializeError(e.to_string()))
}

fn parse<T: DeserializeOwned>(value: Value) -> Result<T, ApiError> {
    serde_json::from_value(value).map_err(|e| ApiError::ParseError(e.to_string()))
}

fn parse_optional<T: DeserializeOwned>(value: Value) -> Result<Option<T>, ApiError> {
    match value {
        Value::Null => Ok(None),
        value => parse(value).map(Some),
    }
}
