//! Session management types

use super::detection::DetectionResult;
use super::metrics::AnalysisMetrics;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;

/// One continuous recording attempt and its accumulated frames
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub session_id: String,
    pub user_id: String,
    pub question_id: String,
    pub response_id: Option<String>,
    pub start_time: DateTime<Utc>,
    pub frames: Vec<DetectionResult>,
    pub is_active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics: Option<Arc<AnalysisMetrics>>,
}

impl Session {
    pub fn new(
        session_id: String,
        user_id: String,
        question_id: String,
        response_id: Option<String>,
    ) -> Self {
        Self {
            session_id,
            user_id,
            question_id,
            response_id,
            start_time: Utc::now(),
            frames: Vec::new(),
            is_active: true,
            metrics: None,
        }
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            session_id: self.session_id.clone(),
            user_id: self.user_id.clone(),
            question_id: self.question_id.clone(),
            response_id: self.response_id.clone(),
            start_time: self.start_time.timestamp_millis(),
            is_active: self.is_active,
            frames_count: self.frames.len(),
        }
    }
}

/// Frame-free projection served by the admin API
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub session_id: String,
    pub user_id: String,
    pub question_id: String,
    pub response_id: Option<String>,
    pub start_time: i64,
    pub is_active: bool,
    pub frames_count: usize,
}
