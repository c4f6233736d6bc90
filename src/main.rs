use anyhow::Result;
use cv_session_engine::{config::Config, services::Reclaimer, state::AppState, web};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cv_session_engine=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("🚀 Starting CV session engine v{}", env!("CARGO_PKG_VERSION"));

    let config = Config::from_env()?;
    let state = AppState::new(config)?;

    if state.detector.refresh_readiness().await {
        tracing::info!("✅ Detector '{}' ready", state.detector.name());
    } else {
        tracing::warn!("⚠️ Detector '{}' not ready, frames will be recorded without faces", state.detector.name());
    }

    let reclaimer = Reclaimer::new(
        Arc::clone(&state.sessions),
        Arc::clone(&state.stats),
        state.config.session_max_age(),
        state.config.reclaim_interval(),
    )
    .spawn();

    web::start_server(state).await?;

    reclaimer.abort();
    Ok(())
}
