//! Server → client protocol messages

use super::detection::{DetectionResult, Expression};
use super::metrics::AnalysisMetrics;
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum StartReply {
    Connected { connected: bool, message: String },
    #[serde(rename_all = "camelCase")]
    Started { session_id: String, success: bool },
}

/// Reduced projection of a frame measurement, sent back per frame
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameReply {
    pub session_id: String,
    pub timestamp: i64,
    pub face_detected: bool,
    pub dominant: Option<Expression>,
    pub eye_contact: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorReply {
    pub error: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "payload", rename_all = "lowercase")]
pub enum ServerMessage {
    Start(StartReply),
    Frame(FrameReply),
    Metrics(Arc<AnalysisMetrics>),
    Error(ErrorReply),
}

impl ServerMessage {
    pub fn connected() -> Self {
        Self::Start(StartReply::Connected {
            connected: true,
            message: "Connected to CV analysis server".to_string(),
        })
    }

    pub fn started(session_id: String) -> Self {
        Self::Start(StartReply::Started { session_id, success: true })
    }

    pub fn frame(session_id: String, timestamp: i64, result: &DetectionResult) -> Self {
        Self::Frame(FrameReply {
            session_id,
            timestamp,
            face_detected: result.face_detected,
            dominant: result.dominant(),
            eye_contact: result.eye_contact(),
        })
    }

    pub fn metrics(metrics: Arc<AnalysisMetrics>) -> Self {
        Self::Metrics(metrics)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error(ErrorReply { error: message.into() })
    }

    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Start(_) => "start",
            Self::Frame(_) => "frame",
            Self::Metrics(_) => "metrics",
            Self::Error(_) => "error",
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}
