//! Inbound frame envelope.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};

use super::error::StreamError;

/// Reserved keep-alive request type.
pub const PING_TYPE: &str = "ping";
/// Reserved keep-alive response type; never delivered to listeners.
pub const PONG_TYPE: &str = "pong";

/// A received frame: a JSON object with a string `type` discriminant.
///
/// The manager does not interpret payloads beyond `type`; consumers decode
/// the full object (or its `data` member) into their own types.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamMessage {
    kind: String,
    payload: Map<String, Value>,
}

impl StreamMessage {
    pub fn parse(text: &str) -> Result<Self, StreamError> {
        let value: Value =
            serde_json::from_str(text).map_err(|e| StreamError::InvalidFrame(e.to_string()))?;
        let Value::Object(payload) = value else {
            return Err(StreamError::InvalidFrame("frame is not a JSON object".into()));
        };
        let kind = match payload.get("type") {
            Some(Value::String(kind)) => kind.clone(),
            Some(_) => return Err(StreamError::InvalidFrame("`type` is not a string".into())),
            None => return Err(StreamError::InvalidFrame("missing `type`".into())),
        };
        Ok(Self { kind, payload })
    }

    /// The `type` discriminant.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn is_pong(&self) -> bool {
        self.kind == PONG_TYPE
    }

    /// The `data` member, if present.
    pub fn data(&self) -> Option<&Value> {
        self.payload.get("data")
    }

    pub fn payload(&self) -> &Map<String, Value> {
        &self.payload
    }

    /// Decodes the whole frame, discriminant included.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(Value::Object(self.payload.clone()))
    }

    /// Decodes only the `data` member (`null` when absent).
    pub fn decode_data<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(self.data().cloned().unwrap_or(Value::Null))
    }
}

/// The keep-alive frame sent while a connection is open.
pub fn ping_frame() -> String {
    json!({ "type": PING_TYPE }).to_string()
}
