//! API error types

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;
use tracing::error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Missing token")]
    MissingToken,

    #[error("Invalid or expired token")]
    InvalidOrExpiredToken,

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("{0} failed")]
    Internal(&'static str),

    #[error("Database error: {0}")]
    Database(#[from] acadia_db::DbError),

    #[error("Auth error: {0}")]
    Auth(#[from] acadia_auth::AuthError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::InvalidCredentials => {
                (StatusCode::UNAUTHORIZED, "Invalid email or password".to_string())
            }
            ApiError::MissingToken => {
                (StatusCode::UNAUTHORIZED, "Authentication required".to_string())
            }
            ApiError::InvalidOrExpiredToken => {
                (StatusCode::UNAUTHORIZED, "Invalid or expired token".to_string())
            }
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::MethodNotAllowed => {
                (StatusCode::METHOD_NOT_ALLOWED, "Method not allowed".to_string())
            }
            ApiError::Internal(op) => {
                error!("Internal error: {} failed", op);
                (StatusCode::INTERNAL_SERVER_ERROR, format!("{} failed", op))
            }
            ApiError::Database(e) => {
                error!("Database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Request failed".to_string(),
                )
            }
            ApiError::Auth(e) => {
                use acadia_auth::AuthError;
                match e {
                    AuthError::PasswordHash(_) | AuthError::Jwt(_) => {
                        error!("Auth subsystem error: {}", e);
                        (
                            StatusCode::INTERNAL_SERVER_ERROR,
                            "Request failed".to_string(),
                        )
                    }
                    AuthError::InvalidCredentials => {
                        (StatusCode::UNAUTHORIZED, "Invalid email or password".to_string())
                    }
                    _ => (StatusCode::UNAUTHORIZED, "Invalid or expired token".to_string()),
                }
            }
        };

        let body = axum::Json(json!({
            "message": message
        }));

        (status, body).into_response()
    }
}
