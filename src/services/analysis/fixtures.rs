//! Frame builders shared by the analysis and registry tests

use crate::types::{DetectionResult, Expression, Expressions, EyeMetrics, GazeDirection, HeadPose};
use proptest::prelude::*;

/// A face looking straight ahead with a certain dominant expression
pub fn face(dominant: Expression, eye_contact: f64) -> DetectionResult {
    let mut expressions = Expressions {
        neutral: 0.0,
        happy: 0.0,
        sad: 0.0,
        angry: 0.0,
        fearful: 0.0,
        disgusted: 0.0,
        surprised: 0.0,
        dominant,
    };
    match dominant {
        Expression::Neutral => expressions.neutral = 1.0,
        Expression::Happy => expressions.happy = 1.0,
        Expression::Sad => expressions.sad = 1.0,
        Expression::Angry => expressions.angry = 1.0,
        Expression::Fearful => expressions.fearful = 1.0,
        Expression::Disgusted => expressions.disgusted = 1.0,
        Expression::Surprised => expressions.surprised = 1.0,
    }

    DetectionResult {
        face_detected: true,
        landmarks: None,
        expressions: Some(expressions),
        head_pose: Some(HeadPose::default()),
        eye_metrics: Some(EyeMetrics {
            left_eye_open: 1.0,
            right_eye_open: 1.0,
            gaze_direction: GazeDirection::default(),
            eye_contact,
        }),
        timestamp: 0,
    }
}

pub fn faces(dominant: Expression, eye_contact: f64, count: usize) -> Vec<DetectionResult> {
    (0..count).map(|_| face(dominant, eye_contact)).collect()
}

pub fn with_pose(mut frame: DetectionResult, yaw: f64, pitch: f64, roll: f64) -> DetectionResult {
    frame.head_pose = Some(HeadPose { pitch, yaw, roll });
    frame
}

pub fn with_gaze(mut frame: DetectionResult, x: f64, y: f64) -> DetectionResult {
    if let Some(eyes) = frame.eye_metrics.as_mut() {
        eyes.gaze_direction = GazeDirection { x, y };
    }
    frame
}

pub fn arb_expression() -> impl Strategy<Value = Expression> {
    (0..Expression::ALL.len()).prop_map(|i| Expression::ALL[i])
}

/// A frame with any pose, gaze and eye contact; one in five has no face
pub fn arb_frame() -> impl Strategy<Value = DetectionResult> {
    (
        arb_expression(),
        0.0..=1.0f64,
        (-90.0..90.0f64, -60.0..60.0f64, -45.0..45.0f64),
        (-1.0..=1.0f64, -1.0..=1.0f64),
        prop::bool::weighted(0.8),
    )
        .prop_map(|(dominant, eye_contact, (yaw, pitch, roll), (x, y), detected)| {
            let frame = with_pose(face(dominant, eye_contact), yaw, pitch, roll);
            let mut frame = with_gaze(frame, x, y);
            frame.face_detected = detected;
            frame
        })
}

pub fn arb_frames(max: usize) -> impl Strategy<Value = Vec<DetectionResult>> {
    prop::collection::vec(arb_frame(), 0..max)
}
