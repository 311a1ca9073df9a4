//! Acadia Client Session
//!
//! This crate provides the client-side session object for the Acadia
//! auth service: a cached current-user lookup, login/logout, and
//! silent token refresh over the cookie transport.

pub mod error;
pub mod session;

pub use error::ClientError;
pub use session::{AuthSession, SessionUser};
