use crate::state::AppState;
use axum::{extract::DefaultBodyLimit, Router};
use tower_http::trace::TraceLayer;

pub async fn start_server(state: AppState) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind((state.config.host.as_str(), state.config.port)).await?;
    let addr = listener.local_addr()?;
    let app = create_app(state);

    tracing::info!("🌐 CV session server listening on http://{}", addr);
    tracing::info!("🔌 WebSocket stream on ws://{}/ws", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("🛑 Server stopped");
    Ok(())
}

pub fn create_app(state: AppState) -> Router {
    let max_body = state.config.max_body_bytes;
    let cors = crate::web::middleware::cors_layer(&state.config.cors_origin);

    Router::new()
        .merge(crate::web::routes::create_routes(state))
        .layer(DefaultBodyLimit::max(max_body))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
