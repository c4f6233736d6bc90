//! Derived per-session behavioral metrics

use super::detection::Expression;
use serde::{Deserialize, Serialize};

/// Percentage of valid frames per dominant expression
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ExpressionBreakdown {
    pub neutral: f64,
    pub happy: f64,
    pub sad: f64,
    pub angry: f64,
    pub fearful: f64,
    pub disgusted: f64,
    pub surprised: f64,
}

impl ExpressionBreakdown {
    pub fn get(&self, expression: Expression) -> f64 {
        match expression {
            Expression::Neutral => self.neutral,
            Expression::Happy => self.happy,
            Expression::Sad => self.sad,
            Expression::Angry => self.angry,
            Expression::Fearful => self.fearful,
            Expression::Disgusted => self.disgusted,
            Expression::Surprised => self.surprised,
        }
    }

    pub fn get_mut(&mut self, expression: Expression) -> &mut f64 {
        match expression {
            Expression::Neutral => &mut self.neutral,
            Expression::Happy => &mut self.happy,
            Expression::Sad => &mut self.sad,
            Expression::Angry => &mut self.angry,
            Expression::Fearful => &mut self.fearful,
            Expression::Disgusted => &mut self.disgusted,
            Expression::Surprised => &mut self.surprised,
        }
    }

    pub fn sum_of(&self, expressions: &[Expression]) -> f64 {
        expressions.iter().map(|e| self.get(*e)).sum()
    }

    pub fn total(&self) -> f64 {
        self.sum_of(&Expression::ALL)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisMetrics {
    pub session_id: String,
    pub user_id: String,
    pub question_id: String,
    pub response_id: Option<String>,
    /// Seconds since the session started
    pub duration: f64,
    pub confidence: f64,
    pub eye_contact: f64,
    pub distraction: f64,
    pub nervousness: f64,
    pub facial_expression_breakdown: ExpressionBreakdown,
    pub attentiveness: f64,
    pub head_movement: f64,
    pub posture: f64,
    pub engagement: f64,
    pub emotional_stability: f64,
    pub expression_variability: f64,
    pub facial_authenticity: f64,
    pub head_movement_rate: f64,
    /// Milliseconds since the Unix epoch at computation
    pub timestamp: i64,
}

impl AnalysisMetrics {
    /// Bounded scores by name, in wire order
    pub fn scores(&self) -> [(&'static str, f64); 12] {
        [
            ("confidence", self.confidence),
            ("eyeContact", self.eye_contact),
            ("distraction", self.distraction),
            ("nervousness", self.nervousness),
            ("attentiveness", self.attentiveness),
            ("headMovement", self.head_movement),
            ("posture", self.posture),
            ("engagement", self.engagement),
            ("emotionalStability", self.emotional_stability),
            ("expressionVariability", self.expression_variability),
            ("facialAuthenticity", self.facial_authenticity),
            ("headMovementRate", self.head_movement_rate),
        ]
    }
}
