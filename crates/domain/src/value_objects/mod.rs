//! Value objects - immutable, validated matching vocabulary

mod concern;
mod mbti;

pub use concern::{Concern, CONCERN_MAX_CHARS, CONCERN_MIN_CHARS};
pub use mbti::Mbti;
