//! Client → server protocol messages

use super::errors::ProtocolError;
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartPayload {
    pub user_id: String,
    pub question_id: String,
    #[serde(default)]
    pub response_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FramePayload {
    #[serde(default)]
    pub session_id: Option<String>,
    /// Base64 image, optionally wrapped in a data URL
    pub image_data: String,
    /// Client clock, echoed back unchanged
    #[serde(default)]
    pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndPayload {
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub response_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ClientMessage {
    Start(StartPayload),
    Frame(FramePayload),
    End(EndPayload),
}

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    payload: serde_json::Value,
}

impl ClientMessage {
    /// Parse a `{type, payload}` envelope.
    ///
    /// The envelope is read first so an unknown type is reported separately
    /// from a payload that does not match its type.
    pub fn parse(text: &str) -> Result<Self, ProtocolError> {
        let envelope: Envelope = serde_json::from_str(text)
            .map_err(|e| ProtocolError::InvalidFormat(e.to_string()))?;

        let payload = envelope.payload;
        match envelope.kind.as_str() {
            "start" => serde_json::from_value(payload)
                .map(Self::Start)
                .map_err(|e| ProtocolError::InvalidPayload { kind: "start", reason: e.to_string() }),
            "frame" => serde_json::from_value(payload)
                .map(Self::Frame)
                .map_err(|e| ProtocolError::InvalidPayload { kind: "frame", reason: e.to_string() }),
            "end" => serde_json::from_value(payload)
                .map(Self::End)
                .map_err(|e| ProtocolError::InvalidPayload { kind: "end", reason: e.to_string() }),
            other => Err(ProtocolError::UnknownType(other.to_string())),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Start(_) => "start",
            Self::Frame(_) => "frame",
            Self::End(_) => "end",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_start() {
        let msg = ClientMessage::parse(
            r#"{"type":"start","payload":{"userId":"u1","questionId":"q1","responseId":"r1"}}"#,
        )
        .unwrap();
        assert_eq!(
            msg,
            ClientMessage::Start(StartPayload {
                user_id: "u1".to_string(),
                question_id: "q1".to_string(),
                response_id: Some("r1".to_string()),
            })
        );
    }

    #[test]
    fn test_parse_end_without_response_id() {
        let msg = ClientMessage::parse(r#"{"type":"end","payload":{"sessionId":"s1"}}"#).unwrap();
        match msg {
            ClientMessage::End(end) => {
                assert_eq!(end.session_id.as_deref(), Some("s1"));
                assert!(end.response_id.is_none());
            }
            other => panic!("unexpected message: {:?}", other),
        }
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            ClientMessage::parse("not json"),
            Err(ProtocolError::InvalidFormat(_))
        ));
        assert!(matches!(
            ClientMessage::parse(r#"{"type":"metrics","payload":{}}"#),
            Err(ProtocolError::UnknownType(t)) if t == "metrics"
        ));
        assert!(matches!(
            ClientMessage::parse(r#"{"type":"frame","payload":{"sessionId":"s1"}}"#),
            Err(ProtocolError::InvalidPayload { kind: "frame", .. })
        ));
    }
}
