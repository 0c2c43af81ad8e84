//! Support Service - letters between chat partners, and feedback

use galaxytalk_domain::{ChatRoomId, UserId};
use galaxytalk_shared::LetterDto;

use crate::application::api::paths;
use crate::application::{validation, Api, ServiceError};
use crate::ports::outbound::ApiError;

pub struct SupportService {
    api: Api,
}

impl SupportService {
    pub fn new(api: Api) -> Self {
        Self { api }
    }

    /// Leave a letter for the counterpart of a finished chat.
    pub async fn send_letter(
        &self,
        receiver_id: &UserId,
        chat_room_id: &ChatRoomId,
        content: &str,
    ) -> Result<(), ServiceError> {
        let request = validation::letter_request(receiver_id, chat_room_id, content)?;
        self.api.post_no_response(paths::LETTERS, &request).await?;
        Ok(())
    }

    /// Letters received, hidden ones excluded.
    pub async fn letters(&self) -> Result<Vec<LetterDto>, ApiError> {
        let letters: Vec<LetterDto> = self
            .api
            .get_optional(paths::LETTERS)
            .await?
            .unwrap_or_default();
        Ok(letters.into_iter().filter(|l| !l.is_hidden()).collect())
    }

    pub async fn submit_feedback(&self, title: &str, content: &str) -> Result<(), ServiceError> {
        let request = validation::feedback_request(title, content)?;
        self.api.post_no_response(paths::FEEDBACK, &request).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::outbound::MockRawApiPort;
    use mockall::predicate::eq;
    use serde_json::{json, Value};
    use std::sync::Arc;

    #[tokio::test]
    async fn letter_body_is_camel_case() {
        let mut raw = MockRawApiPort::new();
        raw.expect_post_json()
            .with(
                eq(paths::LETTERS),
                eq(json!({"receiverId": "u-2", "content": "thank you", "chatRoomId": "r1"})),
            )
            .times(1)
            .returning(|_, _| Ok(Value::Null));
        let service = SupportService::new(Api::new(Arc::new(raw)));

        service
            .send_letter(&UserId::new("u-2"), &ChatRoomId::new("r1"), "thank you")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn hidden_letters_are_filtered() {
        let mut raw = MockRawApiPort::new();
        raw.expect_get_json().with(eq(paths::LETTERS)).returning(|_| {
            Ok(json!([
                {"id": 1, "senderId": "a", "receiverId": "me", "content": "hi", "chatRoomId": "r1", "isHide": 0},
                {"id": 2, "senderId": "b", "receiverId": "me", "content": "bye", "chatRoomId": "r2", "isHide": 1}
            ]))
        });
        let service = SupportService::new(Api::new(Arc::new(raw)));

        let letters = service.letters().await.unwrap();
        assert_eq!(letters.len(), 1);
        assert_eq!(letters[0].id, 1);
    }

    #[tokio::test]
    async fn blank_feedback_is_rejected_locally() {
        let service = SupportService::new(Api::new(Arc::new(MockRawApiPort::new())));
        assert!(matches!(
            service.submit_feedback("", "something broke").await,
            Err(ServiceError::Invalid(_))
        ));
    }

    #[tokio::test]
    async fn feedback_is_posted() {
        let mut raw = MockRawApiPort::new();
        raw.expect_post_json()
            .with(eq(paths::FEEDBACK), eq(json!({"title": "Bug", "content": "video froze"})))
            .times(1)
            .returning(|_, _| Ok(Value::Null));
        let service = SupportService::new(Api::new(Arc::new(raw)));

        service.submit_feedback("Bug", "video froze").await.unwrap();
    }
}
