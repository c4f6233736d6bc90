use crate::state::AppState;
use axum::{extract::State, response::Json};
use serde_json::{json, Value};

/// Server status including detector readiness and live counters
pub async fn status(State(state): State<AppState>) -> Json<Value> {
    let models_loaded = state.detector.refresh_readiness().await;
    let stats = state.stats.snapshot();

    Json(json!({
        "success": true,
        "status": "online",
        "connectedClients": stats.connected_clients,
        "modelsLoaded": models_loaded,
        "detector": state.detector.name(),
        "activeSessions": state.sessions.active_count(),
        "stats": stats,
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().timestamp_millis(),
    }))
}
