//! Serde helper functions shared across the configuration model.
//!
//! Used with `skip_serializing_if` and `deserialize_with` attributes so that
//! emitted JSON only carries fields that differ from their defaults.

use serde::{Deserialize, Deserializer};

/// Returns `true` if the boolean value is `false`.
///
/// Used with `#[serde(skip_serializing_if = "is_false")]` to omit false values.
#[inline]
pub fn is_false(b: &bool) -> bool {
    !*b
}

/// Returns `true` if the u32 value is zero.
///
/// Used with `#[serde(skip_serializing_if = "is_zero_u32")]` to omit zero values.
#[inline]
pub fn is_zero_u32(v: &u32) -> bool {
    *v == 0
}

/// Helper enum for fields that accept either a single string or an array.
///
/// Several sing-box fields come in both shapes:
/// - `"protocol": "dns"` (single string)
/// - `"protocol": ["dns", "quic"]` (array of strings)
#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrVec {
    Single(String),
    Multiple(Vec<String>),
}

/// Deserializes a field that can be either a single string or an array of strings.
///
/// Use with `#[serde(default, deserialize_with = "string_or_vec")]`.
pub fn string_or_vec<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match StringOrVec::deserialize(deserializer)? {
        StringOrVec::Single(s) => Ok(vec![s]),
        StringOrVec::Multiple(v) => Ok(v),
    }
}
