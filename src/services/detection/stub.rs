use super::{DetectionError, FaceDetector, FrameImage};
use crate::types::{DetectionResult, Expression, Expressions, EyeMetrics, GazeDirection, HeadPose};
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};

/// Stub detector for running without a model.
///
/// Produces a plausible, slowly drifting face for every frame so the
/// streaming path and the metrics can be exercised end to end.
pub struct StubDetector {
    frames: AtomicU64,
}

impl StubDetector {
    pub fn new() -> Self {
        tracing::info!("📦 Creating stub face detector (no model loaded)");
        Self { frames: AtomicU64::new(0) }
    }

    fn synthesize(n: u64) -> DetectionResult {
        let t = n as f64 / 10.0;
        let smiling = (n / 15) % 4 == 1;

        let (neutral, happy) = if smiling { (0.25, 0.65) } else { (0.8, 0.1) };
        let expressions = Expressions {
            neutral,
            happy,
            sad: 0.02,
            angry: 0.01,
            fearful: 0.02,
            disgusted: 0.01,
            surprised: 0.04,
            dominant: if smiling { Expression::Happy } else { Expression::Neutral },
        };

        let gaze = GazeDirection { x: 0.15 * t.sin(), y: 0.1 * (t * 0.7).cos() };

        DetectionResult {
            face_detected: true,
            landmarks: None,
            expressions: Some(expressions),
            head_pose: Some(HeadPose {
                pitch: 4.0 * (t * 0.5).sin(),
                yaw: 8.0 * t.sin(),
                roll: 2.0 * (t * 0.3).cos(),
            }),
            eye_metrics: Some(EyeMetrics {
                left_eye_open: 0.9,
                right_eye_open: 0.88,
                gaze_direction: gaze,
                eye_contact: 1.0 - (gaze.x.abs() + gaze.y.abs()) / 2.0,
            }),
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }
}

impl Default for StubDetector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FaceDetector for StubDetector {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn is_ready(&self) -> bool {
        true
    }

    async fn detect(&self, _image: &FrameImage) -> Result<DetectionResult, DetectionError> {
        let n = self.frames.fetch_add(1, Ordering::Relaxed);
        Ok(Self::synthesize(n))
    }
}
