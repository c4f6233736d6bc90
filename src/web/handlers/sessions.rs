//! Session administration over HTTP

use crate::state::AppState;
use crate::types::{AppError, SessionError};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CreateSessionRequest {
    pub user_id: Option<String>,
    pub question_id: Option<String>,
    pub response_id: Option<String>,
}

fn required(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

pub async fn create_session(
    State(state): State<AppState>,
    payload: Result<Json<CreateSessionRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let Json(request) = payload?;
    let (Some(user_id), Some(question_id)) = (required(request.user_id), required(request.question_id)) else {
        return Err(AppError::BadRequest("userId and questionId are required".to_string()));
    };

    let session = state.sessions.create(&user_id, &question_id, request.response_id);
    state.stats.record_session_started();

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "sessionId": session.session_id,
            "message": "Session created",
        })),
    ))
}

pub async fn get_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let summary = state
        .sessions
        .summary(&session_id)
        .ok_or_else(|| SessionError::not_found(&session_id))?;

    Ok(Json(json!({
        "success": true,
        "session": summary,
    })))
}

pub async fn get_metrics(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let metrics = state.sessions.metrics(&session_id)?;

    Ok(Json(json!({
        "success": true,
        "metrics": metrics,
    })))
}

/// Ends the session exactly like a stream `end` would
pub async fn end_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let ending = state.sessions.end(&session_id)?;
    if ending.newly_ended {
        state.stats.record_session_ended();
        state.publisher.publish(Arc::clone(&ending.metrics));
    }

    Ok(Json(json!({
        "success": true,
        "message": "Session ended",
        "metrics": ending.metrics,
    })))
}
