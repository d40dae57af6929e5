//! Request and response bodies for the HTTP API

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::video::VideoResult;

pub const RESET_STATUS: &str = "Chat reset.";

/// `POST /message` body. Every field is optional on the wire; an empty
/// `message` is rejected by the handler.
#[derive(Debug, Default)]
pub struct MessageRequest {
    pub message: Option<String>,
    pub system: Option<String>,
    /// Kept raw: anything but a valid turn list seeds an empty history
    pub history: Option<Value>,
}

impl MessageRequest {
    /// Fields are read one by one, so a mistyped optional field never hides
    /// the message. Non-object bodies are treated as an empty object.
    pub fn from_body(body: &[u8]) -> Self {
        let Ok(Value::Object(mut fields)) = serde_json::from_slice::<Value>(body) else {
            return Self::default();
        };

        Self {
            message: take_string(&mut fields, "message"),
            system: take_string(&mut fields, "system"),
            history: fields.remove("history").filter(|v| !v.is_null()),
        }
    }

    /// The message with surrounding whitespace removed, or "" if absent
    pub fn text(&self) -> &str {
        self.message.as_deref().unwrap_or("").trim()
    }
}

/// Strings only; any other JSON type counts as absent.
fn take_string(fields: &mut Map<String, Value>, name: &str) -> Option<String> {
    match fields.remove(name) {
        Some(Value::String(s)) => Some(s),
        _ => None,
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub reply: String,
    pub youtube: Option<VideoResult>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ResetResponse {
    pub status: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
    pub provider: Option<String>,
    pub model: String,
    pub video_lookup: bool,
    /// "active", "uninitialized" or "busy" while a message is in flight
    pub session: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_body_lenient() {
        assert_eq!(MessageRequest::from_body(b"not json").text(), "");
        assert_eq!(MessageRequest::from_body(b"").text(), "");
        assert_eq!(MessageRequest::from_body(b"[1, 2]").text(), "");
        assert_eq!(MessageRequest::from_body(br#"{"message": null}"#).text(), "");
    }

    #[test]
    fn test_from_body_trims() {
        let request = MessageRequest::from_body(br#"{"message": "  pasta?  ", "system": "Chef"}"#);
        assert_eq!(request.text(), "pasta?");
        assert_eq!(request.system.as_deref(), Some("Chef"));
        assert!(request.history.is_none());
    }

    #[test]
    fn test_from_body_ignores_mistyped_optional_fields() {
        let request =
            MessageRequest::from_body(br#"{"message": "hello", "system": 5, "history": "nope"}"#);
        assert_eq!(request.text(), "hello");
        assert!(request.system.is_none());
        assert_eq!(request.history, Some(Value::String("nope".into())));

        assert_eq!(MessageRequest::from_body(br#"{"message": 42}"#).text(), "");
        assert!(MessageRequest::from_body(br#"{"message": "x", "history": null}"#).history.is_none());
    }

    #[test]
    fn test_response_shape() {
        let response = MessageResponse { reply: "hi".into(), youtube: None };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json, serde_json::json!({"reply": "hi", "youtube": null}));
    }
}
