pub mod analysis;
pub mod detection;
pub mod metrics;
pub mod protocol;
pub mod publisher;
pub mod reclaimer;
pub mod session;

pub use analysis::MetricsAggregator;
pub use detection::FaceDetector;
pub use metrics::ServerStats;
pub use protocol::StreamProtocol;
pub use publisher::{MetricsSink, ResultPublisher};
pub use reclaimer::Reclaimer;
pub use session::SessionRegistry;
