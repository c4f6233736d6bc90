pub mod detection;
pub mod errors;
pub mod events;
pub mod message;
pub mod metrics;
pub mod session;

pub use detection::{DetectionResult, Expression, Expressions, EyeMetrics, GazeDirection, HeadPose, Landmarks, Point};
pub use errors::{AppError, ProtocolError, SessionError};
pub use events::ServerMessage;
pub use message::{ClientMessage, EndPayload, FramePayload, StartPayload};
pub use metrics::{AnalysisMetrics, ExpressionBreakdown};
pub use session::{Session, SessionSummary};
