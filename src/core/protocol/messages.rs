//! Inbound and outbound message types.

use std::fmt;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use thiserror::Error;

// =============================================================================
// Error Types
// =============================================================================

/// Errors raised while decoding an inbound structured frame.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Payload is not valid JSON
    #[error("Malformed payload: {0}")]
    Malformed(String),

    /// Payload is valid JSON but not a record
    #[error("Expected a JSON object, got {0}")]
    NotAnObject(&'static str),
}

/// Result type for protocol decoding.
pub type ProtocolResult<T> = Result<T, ProtocolError>;

// =============================================================================
// Inbound Frames
// =============================================================================

/// One unit delivered by the connection, classified by frame kind.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundFrame {
    /// Binary payload: a speech clip
    Audio(Bytes),
    /// Text payload: a structured event still to be decoded
    Structured(String),
}

/// Identifier handed to the rendering engine's expression setter.
///
/// Engines accept either an index into the model's expression list or the
/// expression's name/file id. Catalog mappings use both forms.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExpressionId {
    /// Index into the model's expression definitions
    Index(u32),
    /// Expression name or file id
    Name(String),
}

impl ExpressionId {
    /// Returns true when this id renders to the same text as `value`.
    pub fn matches(&self, value: &str) -> bool {
        match self {
            ExpressionId::Name(name) => name == value,
            ExpressionId::Index(index) => value.parse::<u32>().is_ok_and(|v| v == *index),
        }
    }

    /// Returns the name when this id is a name.
    pub fn as_name(&self) -> Option<&str> {
        match self {
            ExpressionId::Name(name) => Some(name),
            ExpressionId::Index(_) => None,
        }
    }
}

impl fmt::Display for ExpressionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExpressionId::Index(index) => write!(f, "{index}"),
            ExpressionId::Name(name) => f.write_str(name),
        }
    }
}

impl From<&str> for ExpressionId {
    fn from(value: &str) -> Self {
        ExpressionId::Name(value.to_string())
    }
}

impl From<String> for ExpressionId {
    fn from(value: String) -> Self {
        ExpressionId::Name(value)
    }
}

impl From<u32> for ExpressionId {
    fn from(value: u32) -> Self {
        ExpressionId::Index(value)
    }
}

/// Motion request forwarded to the rendering engine.
///
/// The backend may send a bare group name; it is normalized into a spec with
/// only `group` set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MotionSpec {
    /// Motion group name (e.g. "Idle", "TapBody")
    pub group: String,
    /// Index inside the group; engine picks one when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<u32>,
    /// Engine priority level
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<u8>,
}

impl MotionSpec {
    /// Motion spec naming only a group.
    pub fn group(group: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            index: None,
            priority: None,
        }
    }
}

/// A decoded structured event. Every field is independently optional.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InboundEvent {
    /// Complete bot message
    pub message: Option<String>,
    /// Incremental bot text fragment
    pub text: Option<String>,
    /// Completion flag for the streamed message
    pub done: bool,
    /// Expression name or id
    pub expression: Option<ExpressionId>,
    /// Model parameters forwarded verbatim to the engine
    pub model: Option<Value>,
    /// Motion request
    pub motion: Option<MotionSpec>,
}

impl InboundEvent {
    /// Decode a text frame.
    ///
    /// Field values are coerced at this boundary: `null`, `false` and empty
    /// strings count as absent, as does `0` everywhere except `expression`,
    /// where it is a valid index. A field of an unusable shape is dropped on
    /// its own without discarding the rest of the record.
    pub fn parse(payload: &str) -> ProtocolResult<Self> {
        let value: Value =
            serde_json::from_str(payload).map_err(|e| ProtocolError::Malformed(e.to_string()))?;

        let record = match value {
            Value::Object(record) => record,
            other => return Err(ProtocolError::NotAnObject(json_kind(&other))),
        };

        let mut event = InboundEvent {
            message: record.get("message").and_then(coerce_text),
            text: record.get("text").and_then(coerce_text),
            done: record.get("done").is_some_and(is_truthy),
            ..Default::default()
        };

        if let Some(raw) = record.get("expression") {
            event.expression = coerce_expression(raw);
            if event.expression.is_none() && is_truthy(raw) {
                tracing::debug!("Ignoring expression of unsupported shape: {}", raw);
            }
        }

        if let Some(raw) = record.get("model")
            && is_truthy(raw)
        {
            event.model = Some(raw.clone());
        }

        if let Some(raw) = record.get("motion") {
            event.motion = coerce_motion(raw);
        }

        Ok(event)
    }

    /// Returns true when no recognized field is present.
    pub fn is_empty(&self) -> bool {
        self.message.is_none()
            && self.text.is_none()
            && !self.done
            && self.expression.is_none()
            && self.model.is_none()
            && self.motion.is_none()
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|v| v != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn coerce_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) if is_truthy(value) => Some(n.to_string()),
        _ => None,
    }
}

fn coerce_expression(value: &Value) -> Option<ExpressionId> {
    match value {
        Value::String(s) if !s.is_empty() => Some(ExpressionId::Name(s.clone())),
        Value::Number(n) => n
            .as_u64()
            .and_then(|v| u32::try_from(v).ok())
            .map(ExpressionId::Index),
        _ => None,
    }
}

fn coerce_motion(value: &Value) -> Option<MotionSpec> {
    match value {
        Value::String(s) if !s.is_empty() => Some(MotionSpec::group(s.clone())),
        Value::Object(_) => match serde_json::from_value::<MotionSpec>(value.clone()) {
            Ok(spec) => Some(spec),
            Err(e) => {
                tracing::warn!("Ignoring malformed motion {}: {}", value, e);
                None
            }
        },
        _ => None,
    }
}

// =============================================================================
// Outbound Messages
// =============================================================================

/// Messages the client sends to the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientMessage {
    /// Raw user chat text, sent as-is
    UserText(String),
    /// Avatar model switch
    SelectModel(String),
    /// Voice selection
    SelectVoice { language: String, speaker: String },
    /// Language model selection
    SelectLlm(String),
}

impl ClientMessage {
    /// Encode into the text frame payload.
    pub fn encode(&self) -> String {
        match self {
            ClientMessage::UserText(text) => text.clone(),
            ClientMessage::SelectModel(model) => json!({ "model": model }).to_string(),
            ClientMessage::SelectVoice { language, speaker } => json!({
                "voice": { "language": language, "speaker": speaker }
            })
            .to_string(),
            ClientMessage::SelectLlm(llm) => json!({ "llm": llm }).to_string(),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_all_fields() {
        let event = InboundEvent::parse(
            r#"{"message":"Hi","text":"Hel","done":true,"expression":"happy","model":{"x":1},"motion":"Idle"}"#,
        )
        .unwrap();

        assert_eq!(event.message.as_deref(), Some("Hi"));
        assert_eq!(event.text.as_deref(), Some("Hel"));
        assert!(event.done);
        assert_eq!(event.expression, Some(ExpressionId::from("happy")));
        assert_eq!(event.model, Some(json!({"x": 1})));
        assert_eq!(event.motion, Some(MotionSpec::group("Idle")));
    }

    #[test]
    fn test_parse_motion_object() {
        let event =
            InboundEvent::parse(r#"{"motion":{"group":"TapBody","index":2,"priority":3}}"#).unwrap();
        let motion = event.motion.unwrap();
        assert_eq!(motion.group, "TapBody");
        assert_eq!(motion.index, Some(2));
        assert_eq!(motion.priority, Some(3));
    }

    #[test]
    fn test_parse_malformed_motion_keeps_other_fields() {
        let event = InboundEvent::parse(r#"{"motion":{"index":1},"message":"still here"}"#).unwrap();
        assert!(event.motion.is_none());
        assert_eq!(event.message.as_deref(), Some("still here"));
    }

    #[test]
    fn test_parse_numeric_expression() {
        let event = InboundEvent::parse(r#"{"expression":3}"#).unwrap();
        assert_eq!(event.expression, Some(ExpressionId::Index(3)));
    }

    #[test]
    fn test_zero_is_absent_text_but_valid_expression() {
        let event = InboundEvent::parse(r#"{"message":0,"text":0,"expression":0}"#).unwrap();
        assert!(event.message.is_none());
        assert!(event.text.is_none());
        assert_eq!(event.expression, Some(ExpressionId::Index(0)));

        let event = InboundEvent::parse(r#"{"text":42}"#).unwrap();
        assert_eq!(event.text.as_deref(), Some("42"));
    }

    #[test]
    fn test_falsy_fields_are_absent() {
        let event = InboundEvent::parse(
            r#"{"message":"","text":null,"done":false,"expression":"","model":0,"motion":""}"#,
        )
        .unwrap();
        assert!(event.is_empty());
    }

    #[test]
    fn test_truncated_payload_is_malformed() {
        let result = InboundEvent::parse(r#"{"message":"Hel"#);
        assert!(matches!(result, Err(ProtocolError::Malformed(_))));
    }

    #[test]
    fn test_non_object_payloads_rejected() {
        assert!(matches!(
            InboundEvent::parse("null"),
            Err(ProtocolError::NotAnObject("null"))
        ));
        assert!(matches!(
            InboundEvent::parse("[1,2]"),
            Err(ProtocolError::NotAnObject("array"))
        ));
    }

    #[test]
    fn test_expression_id_matches() {
        assert!(ExpressionId::from("f04").matches("f04"));
        assert!(!ExpressionId::from("f04").matches("f05"));
        assert!(ExpressionId::Index(2).matches("2"));
        assert!(!ExpressionId::Index(2).matches("two"));
        assert_eq!(ExpressionId::Index(7).to_string(), "7");
    }

    #[test]
    fn test_encode_client_messages() {
        assert_eq!(
            ClientMessage::UserText("hello there".to_string()).encode(),
            "hello there"
        );

        let model: Value =
            serde_json::from_str(&ClientMessage::SelectModel("haru".to_string()).encode()).unwrap();
        assert_eq!(model, json!({"model": "haru"}));

        let voice: Value = serde_json::from_str(
            &ClientMessage::SelectVoice {
                language: "en".to_string(),
                speaker: "en_1".to_string(),
            }
            .encode(),
        )
        .unwrap();
        assert_eq!(voice, json!({"voice": {"language": "en", "speaker": "en_1"}}));

        let llm: Value =
            serde_json::from_str(&ClientMessage::SelectLlm("openai/gpt-5-mini".to_string()).encode())
                .unwrap();
        assert_eq!(llm, json!({"llm": "openai/gpt-5-mini"}));
    }
}
