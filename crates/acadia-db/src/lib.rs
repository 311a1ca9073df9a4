//! Acadia Database Layer
//!
//! This crate provides the persistence layer for the Acadia auth
//! service, using SQLite via sqlx: user records, password-reset
//! tokens, and the per-user refresh session.

pub mod error;
pub mod models;
pub mod repository;
mod utils;

pub use error::DbError;
pub use models::*;
pub use repository::Database;

/// Re-export sqlx types for convenience
pub use sqlx::SqlitePool;
