use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{AppState, handlers};

pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health))

        // Memoized operations
        .route("/add", get(handlers::add))
        .route("/split", get(handlers::split))

        // Caller-supplied prompts, never memoized
        .route("/add_custom", post(handlers::add_custom))
        .route("/split_custom", post(handlers::split_custom))

        // Add state
        .with_state(state)

        // Add middleware
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}
