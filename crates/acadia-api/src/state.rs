//! Application state

use acadia_auth::TokenCodec;
use acadia_db::Database;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;

/// Handle for rendering Prometheus metrics
pub type MetricsHandle = PrometheusHandle;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub tokens: Arc<TokenCodec>,
    /// Emit the `Secure` attribute on auth cookies
    pub secure_cookies: bool,
    /// Lifetime of password reset tokens, in minutes
    pub reset_token_ttl_minutes: i64,
}

impl AppState {
    pub fn new(
        db: Database,
        tokens: Arc<TokenCodec>,
        secure_cookies: bool,
        reset_token_ttl_minutes: i64,
    ) -> Self {
        Self {
            db,
            tokens,
            secure_cookies,
            reset_token_ttl_minutes,
        }
    }
}
