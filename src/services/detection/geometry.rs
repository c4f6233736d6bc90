//! Derives head pose and eye metrics from 68-point facial landmarks.
//!
//! Point indices follow the common 68-point layout: jaw 0-16, brows
//! 17-26, nose 27-35, left eye 36-41, right eye 42-47, mouth 48-67.

use super::DetectionError;
use crate::types::{
    DetectionResult, Expression, Expressions, EyeMetrics, GazeDirection, HeadPose, Landmarks, Point,
};
use serde::Deserialize;
use std::ops::Range;

pub const LANDMARK_COUNT: usize = 68;

const JAW: Range<usize> = 0..17;
const NOSE: Range<usize> = 27..36;
const LEFT_EYE: Range<usize> = 36..42;
const RIGHT_EYE: Range<usize> = 42..48;
const MOUTH: Range<usize> = 48..68;

/// Yaw in degrees when one eye corner is a full inter-eye distance closer to the nose
const YAW_SCALE: f64 = 45.0;
/// Expected eye height relative to eye width when fully open
const OPEN_EYE_RATIO: f64 = 0.4;

/// Raw per-category probabilities as returned by an expression model
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(default)]
pub struct ExpressionProbabilities {
    pub neutral: f64,
    pub happy: f64,
    pub sad: f64,
    pub angry: f64,
    pub fearful: f64,
    pub disgusted: f64,
    pub surprised: f64,
}

impl ExpressionProbabilities {
    fn values(&self) -> [f64; 7] {
        [
            self.neutral,
            self.happy,
            self.sad,
            self.angry,
            self.fearful,
            self.disgusted,
            self.surprised,
        ]
    }

    /// Arg-max category; ties go to the earliest in canonical order
    pub fn dominant(&self) -> Expression {
        let values = self.values();
        let mut best = 0;
        for (i, value) in values.iter().enumerate().skip(1) {
            if *value > values[best] {
                best = i;
            }
        }
        Expression::ALL[best]
    }

    pub fn into_expressions(self) -> Expressions {
        Expressions {
            neutral: self.neutral,
            happy: self.happy,
            sad: self.sad,
            angry: self.angry,
            fearful: self.fearful,
            disgusted: self.disgusted,
            surprised: self.surprised,
            dominant: self.dominant(),
        }
    }
}

/// Split a flat 68-point list into named facial regions
pub fn group_landmarks(positions: Vec<Point>) -> Result<Landmarks, DetectionError> {
    if positions.len() != LANDMARK_COUNT {
        return Err(DetectionError::Malformed(format!(
            "expected {} landmarks, got {}",
            LANDMARK_COUNT,
            positions.len()
        )));
    }

    Ok(Landmarks {
        left_eye: positions[LEFT_EYE].to_vec(),
        right_eye: positions[RIGHT_EYE].to_vec(),
        nose: positions[NOSE].to_vec(),
        mouth: positions[MOUTH].to_vec(),
        jaw_outline: positions[JAW].to_vec(),
        positions,
    })
}

pub fn head_pose(landmarks: &Landmarks) -> HeadPose {
    let nose = landmarks.nose[0];
    let left_eye = landmarks.left_eye[0];
    let right_eye = landmarks.right_eye[0];
    let mouth_left = landmarks.mouth[0];
    let mouth_right = landmarks.mouth[6];

    let eye_distance = left_eye.distance(&right_eye);
    let yaw = if eye_distance > 0.0 {
        (right_eye.distance(&nose) - left_eye.distance(&nose)) / eye_distance * YAW_SCALE
    } else {
        0.0
    };

    let eye_center = midpoint(&left_eye, &right_eye);
    let mouth_center = midpoint(&mouth_left, &mouth_right);
    let vertical = mouth_center.y - eye_center.y;
    let horizontal = (mouth_center.x - eye_center.x).abs();
    let pitch = vertical.atan2(horizontal).to_degrees() - 90.0;

    let roll = (right_eye.y - left_eye.y).atan2(right_eye.x - left_eye.x).to_degrees();

    HeadPose { pitch, yaw, roll }
}

pub fn eye_metrics(landmarks: &Landmarks) -> EyeMetrics {
    let left = measure_eye(&landmarks.left_eye);
    let right = measure_eye(&landmarks.right_eye);

    let gaze = GazeDirection {
        x: (left.iris_x + right.iris_x) / 2.0,
        y: (left.iris_y + right.iris_y) / 2.0,
    };

    EyeMetrics {
        left_eye_open: left.openness,
        right_eye_open: right.openness,
        gaze_direction: gaze,
        eye_contact: 1.0 - (gaze.x.abs() + gaze.y.abs()) / 2.0,
    }
}

/// Build a full measurement from one detected face
pub fn measure_face(
    positions: Vec<Point>,
    probabilities: ExpressionProbabilities,
    timestamp: i64,
) -> Result<DetectionResult, DetectionError> {
    let landmarks = group_landmarks(positions)?;
    let head_pose = head_pose(&landmarks);
    let eye_metrics = eye_metrics(&landmarks);

    Ok(DetectionResult {
        face_detected: true,
        expressions: Some(probabilities.into_expressions()),
        head_pose: Some(head_pose),
        eye_metrics: Some(eye_metrics),
        landmarks: Some(landmarks),
        timestamp,
    })
}

struct EyeMeasurement {
    openness: f64,
    iris_x: f64,
    iris_y: f64,
}

/// Expects the six eye points: outer corner, two top, inner corner, two bottom
fn measure_eye(eye: &[Point]) -> EyeMeasurement {
    let (left, top, right, bottom) = (eye[0], eye[1], eye[3], eye[5]);
    let height = top.distance(&bottom);
    let width = left.distance(&right);

    let openness = if width > 0.0 {
        (height / (width * OPEN_EYE_RATIO)).clamp(0.0, 1.0)
    } else {
        0.0
    };

    let n = eye.len() as f64;
    let center = Point::new(
        eye.iter().map(|p| p.x).sum::<f64>() / n,
        eye.iter().map(|p| p.y).sum::<f64>() / n,
    );

    let iris_x = if width > 0.0 {
        ((center.x - (left.x + right.x) / 2.0) / (width / 2.0)).clamp(-1.0, 1.0)
    } else {
        0.0
    };
    let iris_y = if height > 0.0 {
        ((center.y - (top.y + bottom.y) / 2.0) / (height / 2.0)).clamp(-1.0, 1.0)
    } else {
        0.0
    };

    EyeMeasurement { openness, iris_x, iris_y }
}

fn midpoint(a: &Point, b: &Point) -> Point {
    Point::new((a.x + b.x) / 2.0, (a.y + b.y) / 2.0)
}
