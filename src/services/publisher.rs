//! Delivery of final session metrics to the main API.
//!
//! Delivery is fire-and-forget and at most once: a failed POST is logged and
//! counted, never retried.

use crate::services::metrics::ServerStats;
use crate::types::AnalysisMetrics;
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Destination for finished metrics
#[async_trait]
pub trait MetricsSink: Send + Sync {
    async fn deliver(&self, response_id: &str, metrics: &AnalysisMetrics) -> Result<()>;
}

/// Posts to `{base}/cv-response/{responseId}/cv-metrics`
pub struct HttpMetricsSink {
    client: reqwest::Client,
    base_url: String,
}

impl HttpMetricsSink {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn endpoint(&self, response_id: &str) -> String {
        format!("{}/cv-response/{}/cv-metrics", self.base_url, response_id)
    }
}

#[async_trait]
impl MetricsSink for HttpMetricsSink {
    async fn deliver(&self, response_id: &str, metrics: &AnalysisMetrics) -> Result<()> {
        self.client
            .post(self.endpoint(response_id))
            .json(metrics)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

#[derive(Clone)]
pub struct ResultPublisher {
    sink: Arc<dyn MetricsSink>,
    stats: Arc<ServerStats>,
}

impl ResultPublisher {
    pub fn new(sink: Arc<dyn MetricsSink>, stats: Arc<ServerStats>) -> Self {
        Self { sink, stats }
    }

    /// Schedule delivery and return immediately. Returns the delivery task,
    /// or `None` when there is no response id to publish against.
    pub fn publish(&self, metrics: Arc<AnalysisMetrics>) -> Option<tokio::task::JoinHandle<()>> {
        let Some(response_id) = metrics.response_id.clone() else {
            tracing::warn!(
                "[PUBLISH] Session {} has no responseId, metrics not sent",
                metrics.session_id
            );
            return None;
        };

        let sink = Arc::clone(&self.sink);
        let stats = Arc::clone(&self.stats);
        Some(tokio::spawn(async move {
            match sink.deliver(&response_id, &metrics).await {
                Ok(()) => {
                    tracing::info!("📤 Metrics for session {} sent to response {}", metrics.session_id, response_id);
                    stats.record_publish(true);
                }
                Err(e) => {
                    tracing::error!(
                        "❌ Failed to send metrics for session {} to response {}: {:#}",
                        metrics.session_id,
                        response_id,
                        e
                    );
                    stats.record_publish(false);
                }
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::analysis::MetricsAggregator;
    use crate::types::Session;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct RecordingSink {
        delivered: Mutex<Vec<String>>,
        fail: bool,
    }

    #[async_trait]
    impl MetricsSink for RecordingSink {
        async fn deliver(&self, response_id: &str, _metrics: &AnalysisMetrics) -> Result<()> {
            if self.fail {
                anyhow::bail!("main API unavailable");
            }
            self.delivered.lock().push(response_id.to_string());
            Ok(())
        }
    }

    fn metrics(response_id: Option<&str>) -> Arc<AnalysisMetrics> {
        let session = Session::new("s1".into(), "u1".into(), "q1".into(), response_id.map(String::from));
        Arc::new(MetricsAggregator::default().compute(&session))
    }

    #[test]
    fn test_endpoint_format() {
        let sink = HttpMetricsSink::new("http://main:3000/api/", Duration::from_secs(1)).unwrap();
        assert_eq!(sink.endpoint("r1"), "http://main:3000/api/cv-response/r1/cv-metrics");
    }

    #[tokio::test]
    async fn test_publish_delivers_once() {
        let sink = Arc::new(RecordingSink::default());
        let stats = Arc::new(ServerStats::new());
        let publisher = ResultPublisher::new(sink.clone(), stats.clone());

        publisher.publish(metrics(Some("r1"))).unwrap().await.unwrap();
        assert_eq!(*sink.delivered.lock(), vec!["r1".to_string()]);
        assert_eq!(stats.snapshot().publishes_sent, 1);
    }

    #[tokio::test]
    async fn test_missing_response_id_is_skipped() {
        let sink = Arc::new(RecordingSink::default());
        let publisher = ResultPublisher::new(sink.clone(), Arc::new(ServerStats::new()));

        assert!(publisher.publish(metrics(None)).is_none());
        assert!(sink.delivered.lock().is_empty());
    }

    #[tokio::test]
    async fn test_failure_is_counted_not_retried() {
        let sink = Arc::new(RecordingSink { fail: true, ..Default::default() });
        let stats = Arc::new(ServerStats::new());
        let publisher = ResultPublisher::new(sink, stats.clone());

        publisher.publish(metrics(Some("r1"))).unwrap().await.unwrap();
        let snapshot = stats.snapshot();
        assert_eq!(snapshot.publishes_failed, 1);
        assert_eq!(snapshot.publishes_sent, 0);
    }
}
