//! Chat Service - chat room REST calls and the chat handoff record
//!
//! The handoff (`chatRoomId`, media `sessionId`, `token`) is persisted under
//! [`storage_keys::CHAT_HANDOFF`] so the chat surface can pick it up after the
//! matching room exits, and so a reconnect can restore it.
//!
//! Data-channel signals (`leave`, `reaction`) are built here too; the media
//! transport that carries them lives outside this crate.

use std::sync::Arc;

use galaxytalk_domain::{ChatHandoff, ChatRoomId};
use galaxytalk_shared::{
    AiQuestionDto, ChatMessageDto, ChatMessageRequest, ChatRoomPage, ChatSignal, ParticipantsDto,
};

use crate::application::api::paths;
use crate::application::{validation, Api, ServiceError};
use crate::ports::outbound::{storage_keys, ApiError, StorageProvider, TimeProvider};

/// Page size the chat history list asks for when none is given.
pub const DEFAULT_ROOMS_PAGE_SIZE: u32 = 10;

pub struct ChatService {
    api: Api,
    storage: Arc<dyn StorageProvider>,
    time: Arc<dyn TimeProvider>,
}

impl ChatService {
    pub fn new(
        api: Api,
        storage: Arc<dyn StorageProvider>,
        time: Arc<dyn TimeProvider>,
    ) -> Self {
        Self { api, storage, time }
    }

    /// Ask the server for the room the user is still in, if any, and store it.
    pub async fn reconnect(&self) -> Result<Option<ChatHandoff>, ApiError> {
        let handoff: Option<ChatHandoff> =
            self.api.post_empty_optional(paths::CHAT_RECONNECT).await?;
        match &handoff {
            Some(handoff) => {
                tracing::info!(chat_room_id = %handoff.chat_room_id, "Rejoining chat room");
                store_handoff(self.storage.as_ref(), handoff);
            }
            None => clear_handoff(self.storage.as_ref()),
        }
        Ok(handoff)
    }

    /// Leave the room. Returns the `leave` signal to send to the counterpart.
    pub async fn leave(&self, room: &ChatRoomId) -> Result<ChatSignal, ApiError> {
        self.api.delete(&paths::chat_leave(room.as_str())).await?;
        clear_handoff(self.storage.as_ref());
        tracing::info!(chat_room_id = %room, "Left chat room");
        Ok(ChatSignal::leave(self.time.now()))
    }

    pub fn reaction(&self, emoji: &str) -> ChatSignal {
        ChatSignal::reaction(emoji, self.time.now())
    }

    pub async fn send_message(&self, room: &ChatRoomId, content: &str) -> Result<(), ServiceError> {
        let request = ChatMessageRequest {
            content: validation::chat_message(content)?,
        };
        self.api
            .post_no_response(&paths::chat_message(room.as_str()), &request)
            .await?;
        Ok(())
    }

    pub async fn messages(&self, room: &ChatRoomId) -> Result<Vec<ChatMessageDto>, ApiError> {
        Ok(self
            .api
            .get_optional(&paths::chat_messages(room.as_str()))
            .await?
            .unwrap_or_default())
    }

    /// Conversation starters; fails with [`ApiError::AiAnswerNotReady`] while
    /// the backend is still generating them.
    pub async fn ai_questions(&self, room: &ChatRoomId) -> Result<Vec<AiQuestionDto>, ApiError> {
        Ok(self
            .api
            .post_empty_optional(&paths::chat_ai(room.as_str()))
            .await?
            .unwrap_or_default())
    }

    pub async fn participants(&self, room: &ChatRoomId) -> Result<ParticipantsDto, ServiceError> {
        self.api
            .get_optional(&paths::chat_participants(room.as_str()))
            .await?
            .ok_or(ServiceError::EmptyResponse)
    }

    /// Past rooms, newest first, `limit` per page starting after `cursor`.
    pub async fn rooms(
        &self,
        cursor: Option<&str>,
        limit: Option<u32>,
    ) -> Result<ChatRoomPage, ApiError> {
        let mut query = url::form_urlencoded::Serializer::new(String::new());
        if let Some(cursor) = cursor {
            query.append_pair("cursor", cursor);
        }
        query.append_pair(
            "limit",
            &limit.unwrap_or(DEFAULT_ROOMS_PAGE_SIZE).to_string(),
        );
        let path = format!("{}?{}", paths::CHAT_ROOMS, query.finish());
        let page: Option<ChatRoomPage> = self.api.get_optional(&path).await?;
        Ok(page.unwrap_or(ChatRoomPage {
            data: Vec::new(),
            next_cursor: None,
        }))
    }

    pub fn stored_handoff(&self) -> Option<ChatHandoff> {
        load_handoff(self.storage.as_ref())
    }
}

pub fn store_handoff(storage: &dyn StorageProvider, handoff: &ChatHandoff) {
    match serde_json::to_string(handoff) {
        Ok(raw) => storage.save(storage_keys::CHAT_HANDOFF, &raw),
        Err(e) => tracing::warn!("Failed to store chat handoff: {}", e),
    }
}

pub fn load_handoff(storage: &dyn StorageProvider) -> Option<ChatHandoff> {
    let raw = storage.load(storage_keys::CHAT_HANDOFF)?;
    serde_json::from_str(&raw)
        .map_err(|e| tracing::warn!("Ignoring unreadable chat handoff: {}", e))
        .ok()
}

pub fn clear_handoff(storage: &dyn StorageProvider) {
    storage.remove(storage_keys::CHAT_HANDOFF);
}
