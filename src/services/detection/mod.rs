//! Face detection boundary.
//!
//! The engine never assumes how inference happens: anything implementing
//! [`FaceDetector`] can feed sessions. A failing detector never fails the
//! stream; [`detect_frame`] turns every error into a `faceDetected: false`
//! measurement.

pub mod geometry;
pub mod image;
pub mod remote;
pub mod stub;

use crate::config::{Config, DetectorMode};
use crate::types::DetectionResult;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

pub use image::FrameImage;
pub use remote::RemoteDetector;
pub use stub::StubDetector;

#[derive(Debug, Error)]
pub enum DetectionError {
    #[error("invalid image data: {0}")]
    InvalidImage(String),

    #[error("detector request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("malformed detector response: {0}")]
    Malformed(String),
}

#[async_trait]
pub trait FaceDetector: Send + Sync {
    fn name(&self) -> &'static str;

    /// Whether the backing model is loaded and reachable
    fn is_ready(&self) -> bool;

    /// Re-check readiness; backends without a remote side just report `is_ready`
    async fn refresh_readiness(&self) -> bool {
        self.is_ready()
    }

    async fn detect(&self, image: &FrameImage) -> Result<DetectionResult, DetectionError>;
}

/// Outcome of running one frame through a detector
#[derive(Debug, Clone)]
pub struct FrameDetection {
    pub result: DetectionResult,
    /// True when detection failed and `result` is a placeholder
    pub degraded: bool,
}

/// Decode and detect one frame, degrading failures to a faceless measurement
pub async fn detect_frame(detector: &dyn FaceDetector, image_data: &str) -> FrameDetection {
    let outcome = match FrameImage::from_data_url(image_data) {
        Ok(image) => detector.detect(&image).await,
        Err(e) => Err(e),
    };

    match outcome {
        Ok(result) => FrameDetection { result, degraded: false },
        Err(e) => {
            tracing::warn!("[DETECT] {} failed, recording frame without face: {}", detector.name(), e);
            FrameDetection {
                result: DetectionResult::no_face(),
                degraded: true,
            }
        }
    }
}

/// Build the detector selected by configuration
pub fn build_detector(config: &Config) -> anyhow::Result<Arc<dyn FaceDetector>> {
    let detector: Arc<dyn FaceDetector> = match config.detector {
        DetectorMode::Remote => Arc::new(RemoteDetector::new(
            &config.detector_url,
            std::time::Duration::from_millis(config.detector_timeout_ms),
        )?),
        DetectorMode::Stub => Arc::new(StubDetector::new()),
    };
    Ok(detector)
}
