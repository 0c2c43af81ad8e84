//! A proposed pairing delivered with `MATCH_SUCCESS`.

use serde::{Deserialize, Serialize};

use crate::serde_helpers::{lenient_mbti, string_or_number};
use crate::{Mbti, MatchId, UserId};

/// Offer metadata describing the counterpart.
///
/// `user_id` is the local user; `match_user_id` is the counterpart. The
/// concern, trait tag and energy all describe the counterpart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchOffer {
    #[serde(deserialize_with = "string_or_number")]
    pub match_id: MatchId,
    #[serde(default)]
    pub user_id: Option<UserId>,
    #[serde(default)]
    pub match_user_id: Option<UserId>,
    #[serde(default)]
    pub concern: String,
    #[serde(default, deserialize_with = "lenient_mbti")]
    pub mbti: Option<Mbti>,
    #[serde(default)]
    pub energy: i32,
    #[serde(default)]
    pub similarity: f64,
}

impl MatchOffer {
    pub fn new(match_id: impl Into<MatchId>, concern: impl Into<String>) -> Self {
        Self {
            match_id: match_id.into(),
            user_id: None,
            match_user_id: None,
            concern: concern.into(),
            mbti: None,
            energy: 0,
            similarity: 0.0,
        }
    }

    pub fn with_counterpart(mut self, user_id: impl Into<UserId>) -> Self {
        self.match_user_id = Some(user_id.into());
        self
    }

    pub fn with_mbti(mut self, mbti: Mbti) -> Self {
        self.mbti = Some(mbti);
        self
    }

    pub fn with_scores(mut self, energy: i32, similarity: f64) -> Self {
        self.energy = energy;
        self.similarity = similarity;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_numeric_match_id() {
        let json = r#"{"matchId":42,"userId":"me","matchUserId":"you","concern":"career","mbti":"ENTP","energy":55,"similarity":87}"#;
        let offer: MatchOffer = serde_json::from_str(json).unwrap();
        assert_eq!(offer.match_id, "42");
        assert_eq!(offer.match_user_id, Some(UserId::new("you")));
        assert_eq!(offer.mbti, Some(Mbti::Entp));
        assert_eq!(offer.energy, 55);
        assert_eq!(offer.similarity, 87.0);
    }

    #[test]
    fn accepts_string_match_id() {
        let json = r#"{"matchId":"abc-1","concern":"career"}"#;
        let offer: MatchOffer = serde_json::from_str(json).unwrap();
        assert_eq!(offer.match_id, "abc-1");
        assert_eq!(offer.energy, 0);
    }

    #[test]
    fn rejects_missing_match_id() {
        let json = r#"{"concern":"career"}"#;
        assert!(serde_json::from_str::<MatchOffer>(json).is_err());
    }
}
