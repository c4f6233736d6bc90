use axum::http::HeaderValue;
use tower_http::cors::{Any, CorsLayer};

/// CORS for the configured origin; `*` allows any
pub fn cors_layer(origin: &str) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    if origin == "*" {
        return layer.allow_origin(Any);
    }

    match origin.parse::<HeaderValue>() {
        Ok(value) => layer.allow_origin(value),
        Err(e) => {
            tracing::warn!("[CORS] Invalid origin {:?} ({}), allowing any", origin, e);
            layer.allow_origin(Any)
        }
    }
}
