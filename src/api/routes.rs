//! API Routes
//!
//! Configures the Axum router: control endpoints plus the interception
//! fallback.

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    health_handler, intercept_handler, message_handler, stats_handler, AppState,
};

/// Creates the main router.
///
/// # Middleware
/// - CORS: Allows any origin on every route
/// - Tracing: Logs all requests
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/__shell/health", get(health_handler))
        .route("/__shell/stats", get(stats_handler))
        .route("/__shell/message", post(message_handler))
        .fallback(intercept_handler)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
