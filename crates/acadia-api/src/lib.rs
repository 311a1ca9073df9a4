//! Acadia Session API
//!
//! This crate provides the Axum-based HTTP API for the Acadia auth
//! service: login, logout, token refresh, and the password reset flow.

pub mod error;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::create_router;
pub use state::{AppState, MetricsHandle};
