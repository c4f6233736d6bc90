//! Per-connection stream protocol.
//!
//! Each WebSocket connection owns one [`StreamProtocol`]. It walks
//! Idle → Active → Terminal as `start` and `end` arrive; a new `start`
//! begins another cycle. Every failure becomes an `error` reply and the
//! connection stays open.

use crate::services::detection::detect_frame;
use crate::state::AppState;
use crate::types::{ClientMessage, EndPayload, FramePayload, ProtocolError, ServerMessage, StartPayload};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    Idle,
    Active { session_id: String },
    Terminal { session_id: String },
}

impl ConnectionState {
    pub fn session_id(&self) -> Option<&str> {
        match self {
            Self::Idle => None,
            Self::Active { session_id } | Self::Terminal { session_id } => Some(session_id),
        }
    }
}

pub struct StreamProtocol {
    state: AppState,
    connection: ConnectionState,
}

impl StreamProtocol {
    pub fn new(state: AppState) -> Self {
        Self {
            state,
            connection: ConnectionState::Idle,
        }
    }

    pub fn connection(&self) -> &ConnectionState {
        &self.connection
    }

    /// Handle one text message and produce the single reply for it
    pub async fn handle_text(&mut self, text: &str) -> ServerMessage {
        let result = match ClientMessage::parse(text) {
            Ok(message) => self.handle(message).await,
            Err(e) => Err(e),
        };

        result.unwrap_or_else(|e| {
            tracing::warn!("[STREAM] {}", e);
            ServerMessage::error(e.to_string())
        })
    }

    pub async fn handle(&mut self, message: ClientMessage) -> Result<ServerMessage, ProtocolError> {
        tracing::debug!("[STREAM] {} message in state {:?}", message.kind(), self.connection);
        match message {
            ClientMessage::Start(payload) => self.start(payload),
            ClientMessage::Frame(payload) => self.frame(payload).await,
            ClientMessage::End(payload) => self.end(payload),
        }
    }

    /// Log an abandoned session when the socket goes away
    pub fn disconnect(&self) {
        if let ConnectionState::Active { session_id } = &self.connection {
            tracing::info!("[STREAM] Client left while session {} was still active", session_id);
        }
    }

    fn start(&mut self, payload: StartPayload) -> Result<ServerMessage, ProtocolError> {
        if payload.user_id.trim().is_empty() || payload.question_id.trim().is_empty() {
            return Err(ProtocolError::InvalidPayload {
                kind: "start",
                reason: "userId and questionId are required".to_string(),
            });
        }

        if let ConnectionState::Active { session_id } = &self.connection {
            tracing::warn!("[STREAM] New session started while {} is still active", session_id);
        }

        let session = self
            .state
            .sessions
            .create(&payload.user_id, &payload.question_id, payload.response_id);
        self.state.stats.record_session_started();

        self.connection = ConnectionState::Active {
            session_id: session.session_id.clone(),
        };
        Ok(ServerMessage::started(session.session_id))
    }

    async fn frame(&mut self, payload: FramePayload) -> Result<ServerMessage, ProtocolError> {
        let session_id = self.resolve(payload.session_id)?;
        let sessions = &self.state.sessions;

        sessions.ensure_active(&session_id)?;

        let detection = detect_frame(self.state.detector.as_ref(), &payload.image_data).await;
        self.state.stats.record_frame(detection.degraded);

        // the session may have ended while the detector was running
        let reply = ServerMessage::frame(session_id.clone(), payload.timestamp, &detection.result);
        sessions.append_frame(&session_id, detection.result)?;
        Ok(reply)
    }

    fn end(&mut self, payload: EndPayload) -> Result<ServerMessage, ProtocolError> {
        let session_id = self.resolve(payload.session_id)?;
        let sessions = &self.state.sessions;

        if let Some(response_id) = payload.response_id {
            sessions.attach_response_id(&session_id, response_id)?;
        }

        let ending = sessions.end(&session_id)?;
        if ending.newly_ended {
            self.state.stats.record_session_ended();
            self.state.publisher.publish(Arc::clone(&ending.metrics));
        }

        self.connection = ConnectionState::Terminal { session_id };
        Ok(ServerMessage::metrics(ending.metrics))
    }

    /// Explicit id from the payload, else the session this connection started
    fn resolve(&self, explicit: Option<String>) -> Result<String, ProtocolError> {
        explicit
            .filter(|id| !id.is_empty())
            .or_else(|| self.connection.session_id().map(str::to_string))
            .ok_or(ProtocolError::MissingSessionId)
    }
}
