use crate::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};

pub fn create_routes(state: AppState) -> Router {
    Router::new()
        // Frame stream
        .route("/", get(super::handlers::stream::ws_handler))
        .route("/ws", get(super::handlers::stream::ws_handler))

        // Status
        .route("/health", get(super::handlers::health::health_check))
        .route("/api/status", get(super::handlers::status::status))

        // Session administration
        .route("/api/sessions", post(super::handlers::sessions::create_session))
        .route(
            "/api/sessions/{session_id}",
            get(super::handlers::sessions::get_session).delete(super::handlers::sessions::end_session),
        )
        .route("/api/sessions/{session_id}/metrics", get(super::handlers::sessions::get_metrics))

        .fallback(super::handlers::health::not_found)
        .with_state(state)
}
