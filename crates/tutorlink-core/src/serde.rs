use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Accepts a decimal amount encoded either as a JSON string (`"25.00"`) or a
/// number (`25.0`) and keeps it as a string. Money is never parsed into floats.
pub fn deserialize_decimal_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Null => Ok("0.00".to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected decimal amount, got {other}"
        ))),
    }
}

/// Optional variant of [`deserialize_decimal_string`]. Empty strings become `None`.
pub fn deserialize_optional_decimal_string<'de, D>(
    deserializer: D,
) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.is_empty() => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected decimal amount, got {other}"
        ))),
    }
}

/// Treats an explicit `null` as the type's default (e.g. `"subjects": null` -> `[]`).
pub fn deserialize_null_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
