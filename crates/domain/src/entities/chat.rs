//! Chat-room handoff issued once both sides accept a match.

use serde::{Deserialize, Serialize};

use crate::serde_helpers::string_or_number;
use crate::{ChatRoomId, MediaSessionId};

/// Everything the chat surface needs to join the media session.
///
/// Delivered with `CHAT_CREATED` and by the chat reconnect endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatHandoff {
    pub chat_room_id: ChatRoomId,
    #[serde(deserialize_with = "string_or_number")]
    pub session_id: MediaSessionId,
    pub token: String,
}
