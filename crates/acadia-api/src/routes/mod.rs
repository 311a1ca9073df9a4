//! API routes

pub mod auth;
mod health;
pub mod metrics;
mod types;

use axum::Router;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::state::{AppState, MetricsHandle};

// Re-export commonly used types for external use
#[allow(unused_imports)]
pub use auth::RequireAuth;
#[allow(unused_imports)]
pub use types::*;

/// Create the main router
pub fn create_router(state: AppState, metrics_handle: Option<Arc<MetricsHandle>>) -> Router {
    let mut router = Router::new()
        // Health check
        .merge(health::routes())
        // Session API
        .merge(auth::routes())
        .with_state(state)
        // Browser clients send credentials cross-origin during local
        // development; preflights are answered here.
        .layer(CorsLayer::very_permissive());

    // Add metrics endpoint if handle is provided
    if let Some(handle) = metrics_handle {
        router = router.merge(metrics::routes(handle));
    }

    router
}
