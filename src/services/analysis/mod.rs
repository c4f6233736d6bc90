//! Aggregation of a session's frame history into behavioral metrics

pub mod scoring;
pub mod stats;

#[cfg(test)]
pub(crate) mod fixtures;

use crate::config::AnalysisConfig;
use crate::types::{AnalysisMetrics, DetectionResult, ExpressionBreakdown, Session};
use chrono::{DateTime, Utc};

pub use stats::standard_deviation;

/// Computes `AnalysisMetrics` from a session. Holds no per-session state.
#[derive(Debug, Clone, Default)]
pub struct MetricsAggregator {
    config: AnalysisConfig,
}

impl MetricsAggregator {
    pub fn new(config: AnalysisConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn compute(&self, session: &Session) -> AnalysisMetrics {
        self.compute_at(session, Utc::now())
    }

    /// Same as [`compute`](Self::compute) against a fixed clock
    pub fn compute_at(&self, session: &Session, now: DateTime<Utc>) -> AnalysisMetrics {
        let valid: Vec<&DetectionResult> = session.frames.iter().filter(|f| f.face_detected).collect();
        if valid.is_empty() {
            return empty_metrics(session, now);
        }

        let config = &self.config;
        let breakdown = scoring::expression_breakdown(&valid);
        let eye_contact = scoring::eye_contact(&valid, config);
        let distraction = scoring::distraction(&valid, config);

        AnalysisMetrics {
            confidence: scoring::confidence(&valid, &breakdown, config),
            nervousness: scoring::nervousness(&valid, &breakdown, config),
            eye_contact,
            distraction,
            attentiveness: scoring::attentiveness(eye_contact, distraction),
            head_movement: scoring::head_movement(&valid),
            posture: scoring::posture(&valid),
            engagement: scoring::engagement(&valid),
            emotional_stability: scoring::emotional_stability(&valid),
            expression_variability: scoring::expression_variability(&valid),
            facial_authenticity: scoring::facial_authenticity(&valid, config),
            head_movement_rate: scoring::head_movement_rate(&valid),
            facial_expression_breakdown: breakdown,
            ..identity(session, now)
        }
    }
}

/// Metrics for a session without a single detected face
fn empty_metrics(session: &Session, now: DateTime<Utc>) -> AnalysisMetrics {
    identity(session, now)
}

fn identity(session: &Session, now: DateTime<Utc>) -> AnalysisMetrics {
    AnalysisMetrics {
        session_id: session.session_id.clone(),
        user_id: session.user_id.clone(),
        question_id: session.question_id.clone(),
        response_id: session.response_id.clone(),
        duration: (now - session.start_time).num_milliseconds() as f64 / 1000.0,
        confidence: 0.0,
        eye_contact: 0.0,
        distraction: 0.0,
        nervousness: 0.0,
        facial_expression_breakdown: ExpressionBreakdown::default(),
        attentiveness: 0.0,
        head_movement: 0.0,
        posture: 0.0,
        engagement: 0.0,
        emotional_stability: 0.0,
        expression_variability: 0.0,
        facial_authenticity: 0.0,
        head_movement_rate: 0.0,
        timestamp: now.timestamp_millis(),
    }
}
