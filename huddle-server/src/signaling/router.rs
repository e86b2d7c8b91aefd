use crate::signaling::{SignalingService, ws_handler};
use axum::{Router, routing::get};
use tower_http::cors::{Any, CorsLayer};

/// `/ws/{room_id}` plus a liveness probe. Browser clients are served from
/// other origins, so CORS is wide open.
pub fn router(service: SignalingService) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/ws/{room_id}", get(ws_handler))
        .route("/health", get(health))
        .layer(cors)
        .with_state(service)
}

async fn health() -> &'static str {
    "ok"
}
