use crate::config::Config;
use crate::services::analysis::MetricsAggregator;
use crate::services::detection::{self, FaceDetector};
use crate::services::metrics::ServerStats;
use crate::services::publisher::{HttpMetricsSink, MetricsSink, ResultPublisher};
use crate::services::session::SessionRegistry;
use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub sessions: Arc<SessionRegistry>,
    pub detector: Arc<dyn FaceDetector>,
    pub publisher: ResultPublisher,
    pub stats: Arc<ServerStats>,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self> {
        tracing::info!("[STATE] Initializing AppState...");
        tracing::info!("[STATE]   Detector: {:?} ({})", config.detector, config.detector_url);
        tracing::info!("[STATE]   Main API: {}", config.main_api_url);
        tracing::info!(
            "[STATE]   Thresholds: eye contact {}, distraction {}°",
            config.analysis.eye_contact_threshold,
            config.analysis.distraction_threshold
        );

        let detector = detection::build_detector(&config)?;
        let sink = Arc::new(HttpMetricsSink::new(
            &config.main_api_url,
            Duration::from_millis(config.publish_timeout_ms),
        )?);

        Ok(Self::from_parts(config, detector, sink))
    }

    /// Assemble state around explicit collaborators
    pub fn from_parts(config: Config, detector: Arc<dyn FaceDetector>, sink: Arc<dyn MetricsSink>) -> Self {
        let stats = Arc::new(ServerStats::new());
        let sessions = Arc::new(SessionRegistry::new(MetricsAggregator::new(config.analysis.clone())));

        Self {
            config: Arc::new(config),
            sessions,
            detector,
            publisher: ResultPublisher::new(sink, Arc::clone(&stats)),
            stats,
        }
    }
}
