//! End-to-end tests of the stream protocol with an in-memory detector and sink

use async_trait::async_trait;
use cv_session_engine::{
    config::Config,
    services::{
        detection::{DetectionError, FaceDetector, FrameImage},
        protocol::{ConnectionState, StreamProtocol},
        MetricsSink,
    },
    state::AppState,
    types::{
        AnalysisMetrics, DetectionResult, Expression, Expressions, EyeMetrics, GazeDirection, HeadPose,
        ServerMessage,
    },
};
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::Arc;

/// Reports a steady, neutral face looking at the camera
struct SteadyDetector {
    eye_contact: f64,
}

#[async_trait]
impl FaceDetector for SteadyDetector {
    fn name(&self) -> &'static str {
        "steady"
    }

    fn is_ready(&self) -> bool {
        true
    }

    async fn detect(&self, image: &FrameImage) -> Result<DetectionResult, DetectionError> {
        // a single zero byte stands for "nobody in frame"
        if image.bytes == [0] {
            return Ok(DetectionResult::no_face());
        }

        Ok(DetectionResult {
            face_detected: true,
            landmarks: None,
            expressions: Some(Expressions {
                neutral: 0.9,
                happy: 0.05,
                sad: 0.0,
                angry: 0.0,
                fearful: 0.0,
                disgusted: 0.0,
                surprised: 0.05,
                dominant: Expression::Neutral,
            }),
            head_pose: Some(HeadPose::default()),
            eye_metrics: Some(EyeMetrics {
                left_eye_open: 1.0,
                right_eye_open: 1.0,
                gaze_direction: GazeDirection::default(),
                eye_contact: self.eye_contact,
            }),
            timestamp: 0,
        })
    }
}

#[derive(Default)]
struct RecordingSink {
    delivered: Mutex<Vec<(String, AnalysisMetrics)>>,
}

#[async_trait]
impl MetricsSink for RecordingSink {
    async fn deliver(&self, response_id: &str, metrics: &AnalysisMetrics) -> anyhow::Result<()> {
        self.delivered.lock().push((response_id.to_string(), metrics.clone()));
        Ok(())
    }
}

fn setup() -> (AppState, Arc<RecordingSink>) {
    let sink = Arc::new(RecordingSink::default());
    let state = AppState::from_parts(
        Config::default(),
        Arc::new(SteadyDetector { eye_contact: 0.9 }),
        sink.clone(),
    );
    (state, sink)
}

fn json(reply: &ServerMessage) -> Value {
    serde_json::from_str(&reply.to_json()).unwrap()
}

async fn start(protocol: &mut StreamProtocol, payload: &str) -> String {
    let reply = json(&protocol.handle_text(&format!(r#"{{"type":"start","payload":{}}}"#, payload)).await);
    assert_eq!(reply["type"], "start");
    assert_eq!(reply["payload"]["success"], true);
    reply["payload"]["sessionId"].as_str().unwrap().to_string()
}

async fn send_frame(protocol: &mut StreamProtocol, session_id: &str, image: &str, timestamp: i64) -> Value {
    let text = format!(
        r#"{{"type":"frame","payload":{{"sessionId":"{}","imageData":"{}","timestamp":{}}}}}"#,
        session_id, image, timestamp
    );
    json(&protocol.handle_text(&text).await)
}

#[tokio::test]
async fn test_ten_neutral_frames() {
    let (state, sink) = setup();
    let mut protocol = StreamProtocol::new(state.clone());
    let id = start(&mut protocol, r#"{"userId":"u1","questionId":"q1"}"#).await;

    for ts in 0..10 {
        let reply = send_frame(&mut protocol, &id, "data:image/jpeg;base64,/9j/4AAQ", 1_000 + ts).await;
        assert_eq!(reply["type"], "frame");
        assert_eq!(reply["payload"]["timestamp"], 1_000 + ts);
        assert_eq!(reply["payload"]["faceDetected"], true);
        assert_eq!(reply["payload"]["dominant"], "neutral");
        assert_eq!(reply["payload"]["eyeContact"], 0.9);
    }

    let reply = json(
        &protocol
            .handle_text(&format!(r#"{{"type":"end","payload":{{"sessionId":"{}","responseId":"r42"}}}}"#, id))
            .await,
    );
    assert_eq!(reply["type"], "metrics");
    let metrics = &reply["payload"];
    assert_eq!(metrics["facialExpressionBreakdown"]["neutral"], 100.0);
    assert_eq!(metrics["posture"], 100.0);
    assert_eq!(metrics["headMovementRate"], 0.0);
    assert!((metrics["eyeContact"].as_f64().unwrap() - 95.0).abs() < 1e-9);
    assert_eq!(metrics["responseId"], "r42");

    tokio::task::yield_now().await;
    let delivered = sink.delivered.lock();
    assert_eq!(delivered.len(), 1);
    assert_eq!(delivered[0].0, "r42");
    assert_eq!(delivered[0].1.session_id, id);
}

#[tokio::test]
async fn test_faceless_frames_yield_zero_metrics() {
    let (state, _) = setup();
    let mut protocol = StreamProtocol::new(state);
    let id = start(&mut protocol, r#"{"userId":"u1","questionId":"q1"}"#).await;

    for ts in 0..4 {
        let reply = send_frame(&mut protocol, &id, "AA==", ts).await;
        assert_eq!(reply["payload"]["faceDetected"], false);
        assert!(reply["payload"]["dominant"].is_null());
    }

    match protocol.handle_text(r#"{"type":"end","payload":{}}"#).await {
        ServerMessage::Metrics(metrics) => {
            assert!(metrics.scores().iter().all(|(_, v)| *v == 0.0));
            assert_eq!(metrics.facial_expression_breakdown.total(), 0.0);
        }
        other => panic!("expected metrics, got {:?}", other),
    }
}

#[tokio::test]
async fn test_connections_do_not_share_sessions() {
    let (state, _) = setup();
    let mut alice = StreamProtocol::new(state.clone());
    let mut bob = StreamProtocol::new(state.clone());

    let a = start(&mut alice, r#"{"userId":"alice","questionId":"q1"}"#).await;
    let b = start(&mut bob, r#"{"userId":"bob","questionId":"q1"}"#).await;
    assert_ne!(a, b);

    send_frame(&mut alice, &a, "/9j/4AAQ", 1).await;
    send_frame(&mut alice, &a, "/9j/4AAQ", 2).await;
    send_frame(&mut bob, &b, "/9j/4AAQ", 1).await;

    alice.handle_text(r#"{"type":"end","payload":{}}"#).await;
    assert_eq!(alice.connection(), &ConnectionState::Terminal { session_id: a.clone() });
    assert_eq!(bob.connection(), &ConnectionState::Active { session_id: b.clone() });

    assert_eq!(state.sessions.summary(&a).unwrap().frames_count, 2);
    assert_eq!(state.sessions.summary(&b).unwrap().frames_count, 1);
    assert!(state.sessions.summary(&b).unwrap().is_active);
}

#[tokio::test]
async fn test_session_survives_reconnect() {
    let (state, _) = setup();
    let mut first = StreamProtocol::new(state.clone());
    let id = start(&mut first, r#"{"userId":"u1","questionId":"q1","responseId":"r1"}"#).await;
    send_frame(&mut first, &id, "/9j/4AAQ", 1).await;
    first.disconnect();
    drop(first);

    let mut second = StreamProtocol::new(state.clone());
    let reply = send_frame(&mut second, &id, "/9j/4AAQ", 2).await;
    assert_eq!(reply["type"], "frame");

    let reply = json(&second.handle_text(&format!(r#"{{"type":"end","payload":{{"sessionId":"{}"}}}}"#, id)).await);
    assert_eq!(reply["type"], "metrics");
    assert_eq!(state.sessions.summary(&id).unwrap().frames_count, 2);
}

#[tokio::test]
async fn test_frames_after_end_are_errors() {
    let (state, _) = setup();
    let mut protocol = StreamProtocol::new(state.clone());
    let id = start(&mut protocol, r#"{"userId":"u1","questionId":"q1"}"#).await;
    protocol.handle_text(r#"{"type":"end","payload":{}}"#).await;

    let reply = send_frame(&mut protocol, &id, "/9j/4AAQ", 1).await;
    assert_eq!(reply["type"], "error");
    assert_eq!(reply["payload"]["error"], format!("Session is not active: {}", id));

    let reply = send_frame(&mut protocol, "missing", "/9j/4AAQ", 1).await;
    assert_eq!(reply["payload"]["error"], "Session not found: missing");

    assert_eq!(state.sessions.summary(&id).unwrap().frames_count, 0);
}
