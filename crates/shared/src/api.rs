//! REST request and response contracts
//!
//! Every backend response is wrapped in [`ApiResponse`]. Request bodies and the
//! chat/letter payloads live here; session and matching payloads reuse the
//! domain entities directly.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use galaxytalk_domain::serde_helpers::lenient_mbti;
use galaxytalk_domain::{ChatRoomId, Concern, MatchId, Mbti, UserId};

// =============================================================================
// Response envelope
// =============================================================================

/// `{ success, message, data }` wrapper used by every endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default = "Option::default")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            message: String::new(),
            data: Some(data),
        }
    }

    pub fn ok_empty() -> Self {
        Self {
            success: true,
            message: String::new(),
            data: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
        }
    }
}

// =============================================================================
// Requests
// =============================================================================

/// Body of `POST /match`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchStartRequest {
    pub concern: Concern,
    pub preferred_mbti: Option<Mbti>,
}

/// Body of `POST /match/approve`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchApproveRequest {
    pub match_id: MatchId,
    pub accepted: bool,
}

/// Body of `POST /chat/{id}/message`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessageRequest {
    pub content: String,
}

/// Body of `POST /comment`: a letter left for the counterpart after a chat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LetterRequest {
    pub receiver_id: UserId,
    pub content: String,
    pub chat_room_id: ChatRoomId,
}

/// Body of `POST /feedback`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackRequest {
    pub title: String,
    pub content: String,
}

// =============================================================================
// Responses
// =============================================================================

/// `data` of `GET /match/start-time`: a bare epoch-milliseconds number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MatchStartTime(#[serde(with = "chrono::serde::ts_milliseconds")] pub DateTime<Utc>);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessageDto {
    pub sender_id: UserId,
    pub content: String,
    #[serde(default)]
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiQuestionDto {
    pub question_id: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatParticipantDto {
    pub user_id: UserId,
    #[serde(default, deserialize_with = "lenient_mbti")]
    pub mbti: Option<Mbti>,
    #[serde(default)]
    pub concern: String,
    #[serde(default)]
    pub planet_id: i32,
    #[serde(default)]
    pub energy: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticipantsDto {
    pub participants: Vec<ChatParticipantDto>,
    #[serde(default)]
    pub similarity: f64,
}

impl ParticipantsDto {
    /// The participant that is not `me`.
    pub fn counterpart(&self, me: &UserId) -> Option<&ChatParticipantDto> {
        self.participants.iter().find(|p| &p.user_id != me)
    }
}

/// Summary row of `GET /chat/rooms`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRoomDto {
    pub chat_room_id: ChatRoomId,
    #[serde(default)]
    pub my_concern: String,
    #[serde(default)]
    pub participant_concern: String,
    #[serde(default)]
    pub participant_planet: String,
    #[serde(default)]
    pub chat_room_created_at: String,
    #[serde(default)]
    pub participant_review: String,
}

/// Cursor page returned by `GET /chat/rooms`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRoomPage {
    pub data: Vec<ChatRoomDto>,
    #[serde(default)]
    pub next_cursor: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LetterDto {
    pub id: i64,
    pub sender_id: UserId,
    pub receiver_id: UserId,
    pub content: String,
    #[serde(default)]
    pub created_at: String,
    pub chat_room_id: ChatRoomId,
    #[serde(default)]
    pub is_hide: i32,
}

impl LetterDto {
    pub fn is_hidden(&self) -> bool {
        self.is_hide != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn start_time_is_a_bare_millisecond_number() {
        let resp: ApiResponse<MatchStartTime> =
            serde_json::from_str(r#"{"success":true,"message":"ok","data":1700000000000}"#)
                .unwrap();
        let MatchStartTime(at) = resp.data.unwrap();
        assert_eq!(at.timestamp_millis(), 1_700_000_000_000);
    }

    #[test]
    fn envelope_with_null_data() {
        let resp: ApiResponse<ChatMessageDto> =
            serde_json::from_str(r#"{"success":true,"message":"ok","data":null}"#).unwrap();
        assert!(resp.success);
        assert!(resp.data.is_none());
    }

    #[test]
    fn envelope_without_message_or_data() {
        let resp: ApiResponse<Vec<LetterDto>> = serde_json::from_str(r#"{"success":false}"#).unwrap();
        assert!(!resp.success);
        assert_eq!(resp.message, "");
        assert!(resp.data.is_none());
    }

    #[test]
    fn start_request_uses_camel_case() {
        let req = MatchStartRequest {
            concern: Concern::new("I am worried about my career").unwrap(),
            preferred_mbti: Some(Mbti::Infp),
        };
        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            json!({"concern": "I am worried about my career", "preferredMbti": "INFP"})
        );

        let req = MatchStartRequest {
            concern: Concern::new("I am worried about my career").unwrap(),
            preferred_mbti: None,
        };
        assert_eq!(serde_json::to_value(&req).unwrap()["preferredMbti"], json!(null));
    }

    #[test]
    fn approve_request_shape() {
        let req = MatchApproveRequest {
            match_id: MatchId::new("42"),
            accepted: false,
        };
        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            json!({"matchId": "42", "accepted": false})
        );
    }

    #[test]
    fn participants_counterpart() {
        let dto: ParticipantsDto = serde_json::from_value(json!({
            "participants": [
                {"userId": "me", "mbti": "ISTP", "concern": "a", "planetId": 1, "energy": 30},
                {"userId": "you", "mbti": "ESTP", "concern": "b", "planetId": 2, "energy": 50}
            ],
            "similarity": 0.123
        }))
        .unwrap();
        let other = dto.counterpart(&UserId::new("me")).unwrap();
        assert_eq!(other.user_id, "you");
        assert_eq!(other.mbti, Some(Mbti::Estp));
    }

    #[test]
    fn chat_room_page_with_cursor() {
        let page: ChatRoomPage = serde_json::from_value(json!({
            "data": [{"chatRoomId": "r1", "myConcern": "x", "participantConcern": "y",
                      "participantPlanet": "1", "chatRoomCreatedAt": "2025-02-06T13:20:07",
                      "participantReview": "thanks"}],
            "nextCursor": "r2"
        }))
        .unwrap();
        assert_eq!(page.data.len(), 1);
        assert_eq!(page.next_cursor.as_deref(), Some("r2"));
    }

    #[test]
    fn letter_hidden_flag() {
        let letter: LetterDto = serde_json::from_value(json!({
            "id": 1, "senderId": "a", "receiverId": "b", "content": "thanks",
            "createdAt": "2025-02-15T19:56:43", "chatRoomId": "11111", "isHide": 1
        }))
        .unwrap();
        assert!(letter.is_hidden());
    }
}
