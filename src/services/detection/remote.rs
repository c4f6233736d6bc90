//! HTTP-backed detector talking to an inference sidecar

use super::geometry::{self, ExpressionProbabilities};
use super::{DetectionError, FaceDetector, FrameImage};
use crate::types::{DetectionResult, Point};
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

#[derive(Debug, Deserialize)]
struct DetectResponse {
    #[serde(default)]
    faces: Vec<DetectedFace>,
}

#[derive(Debug, Deserialize)]
struct DetectedFace {
    landmarks: Vec<[f64; 2]>,
    #[serde(default)]
    expressions: ExpressionProbabilities,
}

/// Sends frames to `POST {base}/detect` and turns the first face into a measurement
pub struct RemoteDetector {
    client: reqwest::Client,
    base_url: String,
    ready: AtomicBool,
}

impl RemoteDetector {
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            ready: AtomicBool::new(false),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn probe(&self) -> bool {
        let url = format!("{}/health", self.base_url);
        let ready = match self.client.get(&url).send().await {
            Ok(resp) => resp.status().is_success(),
            Err(e) => {
                tracing::debug!("[DETECT] probe of {} failed: {}", url, e);
                false
            }
        };

        let was_ready = self.ready.swap(ready, Ordering::Relaxed);
        if ready != was_ready {
            if ready {
                tracing::info!("✅ Face detector at {} is ready", self.base_url);
            } else {
                tracing::warn!("⚠️ Face detector at {} is unavailable", self.base_url);
            }
        }
        ready
    }
}

fn into_measurement(response: DetectResponse, timestamp: i64) -> Result<DetectionResult, DetectionError> {
    let Some(face) = response.faces.into_iter().next() else {
        return Ok(DetectionResult { timestamp, ..DetectionResult::no_face() });
    };

    let positions = face.landmarks.into_iter().map(|[x, y]| Point::new(x, y)).collect();
    geometry::measure_face(positions, face.expressions, timestamp)
}

#[async_trait]
impl FaceDetector for RemoteDetector {
    fn name(&self) -> &'static str {
        "remote"
    }

    fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Relaxed)
    }

    async fn refresh_readiness(&self) -> bool {
        self.probe().await
    }

    async fn detect(&self, image: &FrameImage) -> Result<DetectionResult, DetectionError> {
        let timestamp = chrono::Utc::now().timestamp_millis();
        let response = self
            .client
            .post(format!("{}/detect", self.base_url))
            .header(reqwest::header::CONTENT_TYPE, image.content_type())
            .body(image.bytes.clone())
            .send()
            .await?
            .error_for_status()?;

        let body: DetectResponse = response
            .json()
            .await
            .map_err(|e| DetectionError::Malformed(e.to_string()))?;

        self.ready.store(true, Ordering::Relaxed);
        into_measurement(body, timestamp)
    }
}
