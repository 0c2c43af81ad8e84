//! Personality-trait tag attached to users and match offers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::DomainError;

/// One of the sixteen four-letter personality codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Mbti {
    Enfj,
    Enfp,
    Entj,
    Entp,
    Esfj,
    Esfp,
    Estj,
    Estp,
    Infj,
    Infp,
    Intj,
    Intp,
    Isfj,
    Isfp,
    Istj,
    Istp,
}

impl Mbti {
    pub fn all() -> &'static [Mbti] {
        &[
            Mbti::Enfj,
            Mbti::Enfp,
            Mbti::Entj,
            Mbti::Entp,
            Mbti::Esfj,
            Mbti::Esfp,
            Mbti::Estj,
            Mbti::Estp,
            Mbti::Infj,
            Mbti::Infp,
            Mbti::Intj,
            Mbti::Intp,
            Mbti::Isfj,
            Mbti::Isfp,
            Mbti::Istj,
            Mbti::Istp,
        ]
    }

    pub fn code(&self) -> &'static str {
        match self {
            Mbti::Enfj => "ENFJ",
            Mbti::Enfp => "ENFP",
            Mbti::Entj => "ENTJ",
            Mbti::Entp => "ENTP",
            Mbti::Esfj => "ESFJ",
            Mbti::Esfp => "ESFP",
            Mbti::Estj => "ESTJ",
            Mbti::Estp => "ESTP",
            Mbti::Infj => "INFJ",
            Mbti::Infp => "INFP",
            Mbti::Intj => "INTJ",
            Mbti::Intp => "INTP",
            Mbti::Isfj => "ISFJ",
            Mbti::Isfp => "ISFP",
            Mbti::Istj => "ISTJ",
            Mbti::Istp => "ISTP",
        }
    }
}

impl fmt::Display for Mbti {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Mbti {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        Mbti::all()
            .iter()
            .copied()
            .find(|m| m.code() == upper)
            .ok_or_else(|| DomainError::parse(format!("Unknown MBTI: {}", s)))
    }
}
