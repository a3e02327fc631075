pub mod config;
pub mod error;
pub mod fetcher;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod models;
pub mod proxy_health;
pub mod rate_limit;
pub mod retry;
pub mod state;

use axum::routing::get;
use axum::Router;
use std::sync::Arc;

// Router layout: the API route sits behind the security middleware,
// health and metrics stay open
pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/douban/categories", get(handlers::categories_handler))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::security_middleware,
        ))
        .route("/health", get(handlers::health_handler))
        .route("/metrics", get(handlers::metrics_handler))
        .with_state(state)
}

pub use state::AppState;
