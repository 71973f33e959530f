mod spike;
mod user;

pub use spike::*;
pub use user::*;

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Accept a string, a number or `null` for fields the backend is not
/// consistent about (Telegram chat ids arrive as either).
pub(crate) fn opt_string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected string or number, got {other}"
        ))),
    }
}

/// Numeric statistics fields may arrive as numbers or numeric strings.
pub(crate) fn opt_f64_lenient<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => Ok(n.as_f64()),
        Some(Value::String(s)) => Ok(crate::threshold::parse_numeric(&s)),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected number, got {other}"
        ))),
    }
}
