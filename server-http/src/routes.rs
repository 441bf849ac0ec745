use crate::handlers;
use crate::state::AppState;
use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;

/// Prefix under which the upstream API is exposed.
pub const API_PREFIX: &str = "/api/github";

/// Build and configure the application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Upstream API passthrough
        .route(
            "/api/github/{*path}",
            get(handlers::proxy_github).options(handlers::preflight),
        )
        // Middleware
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
