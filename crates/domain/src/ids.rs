use std::fmt;

use serde::{Deserialize, Serialize};

/// Backend identifiers are opaque strings (OAuth subject ids, numeric match ids,
/// room ids). The wrappers keep them from being mixed up at call sites.
macro_rules! define_id {
    ($name:ident) => {
        #[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn into_inner(self) -> String {
                self.0
            }

            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl PartialEq<str> for $name {
            fn eq(&self, other: &str) -> bool {
                self.0 == other
            }
        }

        impl PartialEq<&str> for $name {
            fn eq(&self, other: &&str) -> bool {
                self.0 == *other
            }
        }
    };
}

define_id!(UserId);
define_id!(MatchId);
define_id!(ChatRoomId);
define_id!(MediaSessionId);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_serialize_as_plain_strings() {
        let id = UserId::new("kakao_1234");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"kakao_1234\"");

        let back: UserId = serde_json::from_str("\"kakao_1234\"").unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn ids_compare_against_str() {
        let id = MatchId::from("42");
        assert_eq!(id, "42");
        assert_eq!(id.to_string(), "42");
    }
}
