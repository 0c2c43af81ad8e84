//! Form validation performed before any request leaves the client.

use galaxytalk_domain::{ChatRoomId, Concern, DomainError, Mbti, UserId};
use galaxytalk_shared::{FeedbackRequest, LetterRequest, MatchStartRequest};

/// Build the body of `POST /match`. An empty preferred MBTI means "no preference".
pub fn match_start_request(
    concern: &str,
    preferred_mbti: Option<&str>,
) -> Result<MatchStartRequest, DomainError> {
    let concern = Concern::new(concern)?;
    let preferred_mbti = match preferred_mbti.map(str::trim) {
        None | Some("") => None,
        Some(code) => Some(code.parse::<Mbti>()?),
    };
    Ok(MatchStartRequest {
        concern,
        preferred_mbti,
    })
}

pub fn feedback_request(title: &str, content: &str) -> Result<FeedbackRequest, DomainError> {
    if title.trim().is_empty() {
        return Err(DomainError::validation("Feedback title cannot be empty"));
    }
    if content.trim().is_empty() {
        return Err(DomainError::validation("Feedback content cannot be empty"));
    }
    Ok(FeedbackRequest {
        title: title.trim().to_string(),
        content: content.trim().to_string(),
    })
}

pub fn letter_request(
    receiver_id: &UserId,
    chat_room_id: &ChatRoomId,
    content: &str,
) -> Result<LetterRequest, DomainError> {
    if receiver_id.is_empty() {
        return Err(DomainError::validation("Letter needs a receiver"));
    }
    if content.trim().is_empty() {
        return Err(DomainError::validation("Letter content cannot be empty"));
    }
    Ok(LetterRequest {
        receiver_id: receiver_id.clone(),
        content: content.trim().to_string(),
        chat_room_id: chat_room_id.clone(),
    })
}

pub fn chat_message(content: &str) -> Result<String, DomainError> {
    let content = content.trim();
    if content.is_empty() {
        return Err(DomainError::validation("Message cannot be empty"));
    }
    Ok(content.to_string())
}
