//! Acadia Authentication
//!
//! This crate provides signed access/refresh token issuance, password
//! hashing, and the cookie transport used by the Acadia session API.

pub mod cookie;
pub mod error;
pub mod password;
pub mod token;

pub use error::AuthError;
pub use password::{hash_password, verify_password};
pub use token::{Claims, IssuedToken, TokenCodec, TokenKind};
