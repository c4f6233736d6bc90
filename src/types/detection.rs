//! Per-frame measurement types produced by a face detector

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Expression categories reported by the detector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Expression {
    Neutral,
    Happy,
    Sad,
    Angry,
    Fearful,
    Disgusted,
    Surprised,
}

impl Expression {
    /// All categories in canonical order. Arg-max ties resolve to the earliest.
    pub const ALL: [Expression; 7] = [
        Expression::Neutral,
        Expression::Happy,
        Expression::Sad,
        Expression::Angry,
        Expression::Fearful,
        Expression::Disgusted,
        Expression::Surprised,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Neutral => "neutral",
            Self::Happy => "happy",
            Self::Sad => "sad",
            Self::Angry => "angry",
            Self::Fearful => "fearful",
            Self::Disgusted => "disgusted",
            Self::Surprised => "surprised",
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Expression {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Expression::ALL
            .iter()
            .copied()
            .find(|e| e.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| anyhow::anyhow!("unknown expression: {}", s))
    }
}

/// Probability per category plus the arg-max
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expressions {
    pub neutral: f64,
    pub happy: f64,
    pub sad: f64,
    pub angry: f64,
    pub fearful: f64,
    pub disgusted: f64,
    pub surprised: f64,
    pub dominant: Expression,
}

impl Expressions {
    pub fn probability(&self, expression: Expression) -> f64 {
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
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Point) -> f64 {
        ((other.x - self.x).powi(2) + (other.y - self.y).powi(2)).sqrt()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Landmarks {
    pub positions: Vec<Point>,
    pub left_eye: Vec<Point>,
    pub right_eye: Vec<Point>,
    pub nose: Vec<Point>,
    pub mouth: Vec<Point>,
    pub jaw_outline: Vec<Point>,
}

/// Head rotation in degrees
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct HeadPose {
    pub pitch: f64,
    pub yaw: f64,
    pub roll: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GazeDirection {
    /// -1 (left) to 1 (right)
    pub x: f64,
    /// -1 (up) to 1 (down)
    pub y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EyeMetrics {
    pub left_eye_open: f64,
    pub right_eye_open: f64,
    pub gaze_direction: GazeDirection,
    pub eye_contact: f64,
}

/// One measurement for a single video frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionResult {
    pub face_detected: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub landmarks: Option<Landmarks>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expressions: Option<Expressions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub head_pose: Option<HeadPose>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eye_metrics: Option<EyeMetrics>,
    /// Milliseconds since the Unix epoch
    pub timestamp: i64,
}

impl DetectionResult {
    /// A frame where no face was found (or detection failed)
    pub fn no_face() -> Self {
        Self {
            face_detected: false,
            landmarks: None,
            expressions: None,
            head_pose: None,
            eye_metrics: None,
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }

    pub fn dominant(&self) -> Option<Expression> {
        self.expressions.as_ref().map(|e| e.dominant)
    }

    pub fn eye_contact(&self) -> Option<f64> {
        self.eye_metrics.as_ref().map(|m| m.eye_contact)
    }
}
