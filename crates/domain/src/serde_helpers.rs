//! Lenient deserializers for backend fields whose JSON type drifts between
//! services (numeric ids serialized as numbers by one service, strings by another).

use serde::de::{self, Deserializer, Visitor};
use serde::Deserialize;
use std::fmt;
use std::marker::PhantomData;

use crate::Mbti;

/// Accepts a JSON string or number and converts it to `T` via its string form.
pub fn string_or_number<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: From<String>,
{
    struct StringOrNumber<T>(PhantomData<T>);

    impl<'de, T: From<String>> Visitor<'de> for StringOrNumber<T> {
        type Value = T;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a string or a number")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<T, E> {
            Ok(T::from(v.to_string()))
        }

        fn visit_string<E: de::Error>(self, v: String) -> Result<T, E> {
            Ok(T::from(v))
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<T, E> {
            Ok(T::from(v.to_string()))
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<T, E> {
            Ok(T::from(v.to_string()))
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<T, E> {
            Ok(T::from(v.to_string()))
        }
    }

    deserializer.deserialize_any(StringOrNumber(PhantomData))
}

/// [`string_or_number`] for optional fields: `null` or a missing key is `None`.
pub fn optional_string_or_number<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: From<String>,
{
    #[derive(Deserialize)]
    #[serde(bound = "T: From<String>")]
    struct Lenient<T>(#[serde(deserialize_with = "string_or_number")] T);

    let value: Option<Lenient<T>> = Option::deserialize(deserializer)?;
    Ok(value.map(|Lenient(inner)| inner))
}

/// Unknown or missing personality codes become `None` instead of failing the
/// whole payload.
pub fn lenient_mbti<'de, D>(deserializer: D) -> Result<Option<Mbti>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.and_then(|s| s.parse().ok()))
}
