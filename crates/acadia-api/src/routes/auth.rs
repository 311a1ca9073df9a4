//! Session handlers and authentication extractor

use acadia_auth::{Claims, cookie, hash_password, verify_password};
use axum::{
    Json, Router,
    extract::{FromRef, FromRequestParts, State},
    http::{HeaderMap, request::Parts},
    response::IntoResponse,
    routing::{get, post},
};
use chrono::{Duration, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

use super::types::{
    ForgotPasswordRequest, LoginRequest, LoginResponse, MessageResponse, RefreshResponse,
    ResetPasswordRequest, UserResponse, ValidateResetTokenRequest,
};

// ==================== Auth Extractor ====================

/// Extractor for an authenticated principal (required)
pub struct RequireAuth(pub Claims);

impl<S> FromRequestParts<S> for RequireAuth
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);

        let token = cookie::access_token(&parts.headers).ok_or(ApiError::MissingToken)?;
        let claims = app_state
            .tokens
            .verify_access_token(token)
            .ok_or(ApiError::InvalidOrExpiredToken)?;

        Ok(RequireAuth(claims))
    }
}

// ==================== Input Validation ====================

/// Maximum allowed email length
const MAX_EMAIL_LENGTH: usize = 254;
/// Maximum allowed password length (prevent DoS with very large passwords)
const MAX_PASSWORD_LENGTH: usize = 256;
/// Minimum allowed password length
const MIN_PASSWORD_LENGTH: usize = 8;

/// Acknowledgement returned by forgot-password whether or not the
/// address matches an account.
const RESET_ACK: &str = "If an account exists for that address, a password reset link has been sent";

/// Validate email shape and length
fn validate_email(email: &str) -> Result<(), ApiError> {
    if email.is_empty() {
        return Err(ApiError::BadRequest("Email cannot be empty".to_string()));
    }
    if email.len() > MAX_EMAIL_LENGTH {
        return Err(ApiError::BadRequest(format!(
            "Email exceeds maximum length of {} characters",
            MAX_EMAIL_LENGTH
        )));
    }
    if !email.contains('@') {
        return Err(ApiError::BadRequest("Email is not valid".to_string()));
    }
    Ok(())
}

/// Validate password length
fn validate_password(password: &str) -> Result<(), ApiError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(ApiError::BadRequest(format!(
            "Password must be at least {} characters long",
            MIN_PASSWORD_LENGTH
        )));
    }
    if password.len() > MAX_PASSWORD_LENGTH {
        return Err(ApiError::BadRequest(format!(
            "Password exceeds maximum length of {} characters",
            MAX_PASSWORD_LENGTH
        )));
    }
    Ok(())
}

// ==================== Session Handlers ====================

/// POST /api/auth/login
async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_email(&request.email)?;
    if request.password.len() > MAX_PASSWORD_LENGTH {
        return Err(ApiError::BadRequest(format!(
            "Password exceeds maximum length of {} characters",
            MAX_PASSWORD_LENGTH
        )));
    }

    let email = request.email.trim().to_lowercase();
    debug!("Login attempt for {}", email);

    // Find user - but don't return early to prevent timing attacks
    let user_result = state.db.get_user_by_email(&email).await?;

    // Verify password - always perform verification to prevent timing attacks
    // Use a dummy hash when user doesn't exist to maintain constant-time behavior
    // This dummy hash is a valid Argon2 hash that will always fail verification
    const DUMMY_HASH: &str = "$argon2id$v=19$m=19456,t=2,p=1$dGltaW5nX2F0dGFja19wcmV2ZW50aW9u$K8rI5T7VdQ8xkO0GqK5K2w";

    let (hash_to_verify, user) = match user_result {
        Some(u) => (u.password_hash.clone(), Some(u)),
        None => (DUMMY_HASH.to_string(), None),
    };

    let password_valid = verify_password(&request.password, &hash_to_verify)?;

    let user = match (user, password_valid) {
        (Some(u), true) => u,
        _ => {
            metrics::counter!("acadia_logins_total", "outcome" => "failure").increment(1);
            return Err(ApiError::InvalidCredentials);
        }
    };

    let access = state.tokens.create_access_token(user.id, user.role.as_str())?;
    let refresh = state.tokens.create_refresh_token(user.id, user.role.as_str())?;
    state
        .db
        .upsert_refresh_session(user.id, &refresh.jti, refresh.expires_at)
        .await?;

    metrics::counter!("acadia_logins_total", "outcome" => "success").increment(1);
    info!("User {} logged in", user.email);

    Ok((
        cookie::auth_cookies(&access, &refresh, state.secure_cookies),
        Json(LoginResponse {
            access_token: access.token,
            user: user.into(),
        }),
    ))
}

/// POST /api/auth/logout
///
/// Idempotent: clears cookies and drops the refresh session whether or
/// not the caller still holds a valid token.
async fn logout(State(state): State<AppState>, headers: HeaderMap) -> impl IntoResponse {
    if let Some(token) = cookie::refresh_token(&headers) {
        if let Some(claims) = state.tokens.verify_refresh_token(token) {
            if let Some(user_id) = claims.user_id() {
                let _ = state.db.delete_refresh_session(user_id).await;
                debug!("Refresh session dropped for user {}", user_id);
            }
        }
    }

    (
        cookie::clear_cookies(state.secure_cookies),
        Json(MessageResponse {
            message: "Logged out".to_string(),
        }),
    )
}

/// POST /api/auth/refresh
///
/// Rotates the pair unconditionally: the presented token must carry
/// the current token id for the principal; anything else revokes the
/// whole chain and forces a fresh login.
async fn refresh(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let token = cookie::refresh_token(&headers).ok_or(ApiError::MissingToken)?;

    let claims = state.tokens.verify_refresh_token(token).ok_or_else(|| {
        metrics::counter!("acadia_token_refreshes_total", "outcome" => "invalid").increment(1);
        ApiError::InvalidOrExpiredToken
    })?;
    let user_id = claims.user_id().ok_or(ApiError::InvalidOrExpiredToken)?;

    let session = state.db.get_refresh_session(user_id).await?;
    let is_current = session.map(|s| s.token_id == claims.jti).unwrap_or(false);
    if !is_current {
        warn!("Superseded refresh token presented for user {}", user_id);
        state.db.delete_refresh_session(user_id).await?;
        metrics::counter!("acadia_token_refreshes_total", "outcome" => "superseded").increment(1);
        return Err(ApiError::InvalidOrExpiredToken);
    }

    let access = state.tokens.create_access_token(user_id, &claims.role)?;
    let refresh = state.tokens.create_refresh_token(user_id, &claims.role)?;
    state
        .db
        .upsert_refresh_session(user_id, &refresh.jti, refresh.expires_at)
        .await?;

    metrics::counter!("acadia_token_refreshes_total", "outcome" => "success").increment(1);
    debug!("Token pair rotated for user {}", user_id);

    Ok((
        cookie::auth_cookies(&access, &refresh, state.secure_cookies),
        Json(RefreshResponse {
            access_token: access.token,
            message: "Token refreshed".to_string(),
        }),
    ))
}

/// GET /api/auth/user
async fn current_user(
    RequireAuth(claims): RequireAuth,
    State(state): State<AppState>,
) -> Result<Json<UserResponse>, ApiError> {
    let user_id = claims.user_id().ok_or(ApiError::InvalidOrExpiredToken)?;
    let user = state
        .db
        .get_user_by_id(user_id)
        .await?
        .ok_or(ApiError::InvalidOrExpiredToken)?;

    Ok(Json(user.into()))
}

/// POST /api/auth/forgot-password
///
/// The response is identical whether or not the address matches an
/// account. Token delivery (email) is handled outside this service.
async fn forgot_password(
    State(state): State<AppState>,
    Json(request): Json<ForgotPasswordRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let email = request.email.trim().to_lowercase();

    if let Some(user) = state.db.get_user_by_email(&email).await? {
        let token = Uuid::new_v4().to_string();
        let expires_at = Utc::now() + Duration::minutes(state.reset_token_ttl_minutes);
        state.db.create_reset_token(user.id, &token, expires_at).await?;

        metrics::counter!("acadia_password_resets_total", "stage" => "requested").increment(1);
        debug!("Password reset token issued for user {}", user.id);
    }

    Ok(Json(MessageResponse {
        message: RESET_ACK.to_string(),
    }))
}

/// POST /api/auth/validate-reset-token
async fn validate_reset_token(
    State(state): State<AppState>,
    Json(request): Json<ValidateResetTokenRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let record = state.db.get_reset_token(&request.token).await?;

    match record {
        Some(t) if t.is_usable(Utc::now()) => Ok(Json(MessageResponse {
            message: "Token is valid".to_string(),
        })),
        _ => Err(ApiError::InvalidOrExpiredToken),
    }
}

/// POST /api/auth/reset-password
async fn reset_password(
    State(state): State<AppState>,
    Json(request): Json<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    validate_password(&request.new_password)?;

    let record = state
        .db
        .get_reset_token(&request.token)
        .await?
        .filter(|t| t.is_usable(Utc::now()))
        .ok_or(ApiError::InvalidOrExpiredToken)?;

    // Atomic consumption: two racing resets cannot both pass this gate.
    if !state.db.consume_reset_token(&request.token).await? {
        return Err(ApiError::InvalidOrExpiredToken);
    }

    let password_hash = hash_password(&request.new_password)?;
    state
        .db
        .update_user_password(record.user_id, &password_hash)
        .await?;

    // A password change supersedes every outstanding refresh token.
    state.db.delete_refresh_session(record.user_id).await?;

    metrics::counter!("acadia_password_resets_total", "stage" => "completed").increment(1);
    info!("Password reset completed for user {}", record.user_id);

    Ok(Json(MessageResponse {
        message: "Password updated".to_string(),
    }))
}

/// 405 with the same `{message}` body shape the rest of the API uses.
async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}

/// Create session routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/auth/login", post(login).fallback(method_not_allowed))
        .route("/api/auth/logout", post(logout).fallback(method_not_allowed))
        .route("/api/auth/refresh", post(refresh).fallback(method_not_allowed))
        .route("/api/auth/user", get(current_user).fallback(method_not_allowed))
        .route(
            "/api/auth/forgot-password",
            post(forgot_password).fallback(method_not_allowed),
        )
        .route(
            "/api/auth/validate-reset-token",
            post(validate_reset_token).fallback(method_not_allowed),
        )
        .route(
            "/api/auth/reset-password",
            post(reset_password).fallback(method_not_allowed),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::create_router;
    use acadia_auth::TokenCodec;
    use acadia_db::{Database, NewUser, UserRole};
    use axum::body::Body;
    use axum::http::{Request, Response, StatusCode, header};
    use std::sync::Arc;
    use tower::ServiceExt;

    const TEST_SECRET: &str = "test-secret-key";
    const TEST_EMAIL: &str = "head@acadia.test";
    const TEST_PASSWORD: &str = "password123";

    struct TestApp {
        app: axum::Router,
        state: AppState,
        _db_file: tempfile::NamedTempFile,
    }

    async fn test_app() -> TestApp {
        let db_file = tempfile::NamedTempFile::new().unwrap();
        let url = format!("sqlite:{}?mode=rwc", db_file.path().display());
        let db = Database::new(&url).await.unwrap();

        db.insert_user(NewUser {
            email: TEST_EMAIL.to_string(),
            full_name: "Head Teacher".to_string(),
            password_hash: hash_password(TEST_PASSWORD).unwrap(),
            role: UserRole::Admin,
        })
        .await
        .unwrap();

        let tokens = Arc::new(TokenCodec::new(TEST_SECRET, 15, 14));
        let state = AppState::new(db, tokens, false, 60);

        TestApp {
            app: create_router(state.clone(), None),
            state,
            _db_file: db_file,
        }
    }

    fn json_post(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: Response<Body>) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn cookie_value(response: &Response<Body>, name: &str) -> Option<String> {
        let prefix = format!("{}=", name);
        response
            .headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .find_map(|c| {
                c.strip_prefix(prefix.as_str())
                    .map(|rest| rest.split(';').next().unwrap_or("").to_string())
            })
    }

    async fn login(app: &axum::Router) -> Response<Body> {
        app.clone()
            .oneshot(json_post(
                "/api/auth/login",
                serde_json::json!({"email": TEST_EMAIL, "password": TEST_PASSWORD}),
            ))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_login_sets_cookies_and_returns_user() {
        let t = test_app().await;

        let response = login(&t.app).await;
        assert_eq!(response.status(), StatusCode::OK);

        let access = cookie_value(&response, "acadia_access").unwrap();
        let refresh = cookie_value(&response, "acadia_refresh").unwrap();
        assert!(!access.is_empty());
        assert!(!refresh.is_empty());

        let body = body_json(response).await;
        assert!(body["accessToken"].is_string());
        assert_eq!(body["user"]["email"], TEST_EMAIL);
        assert!(body["user"].get("passwordHash").is_none());
    }

    #[tokio::test]
    async fn test_login_bad_password_is_unauthorized() {
        let t = test_app().await;

        let response = t
            .app
            .clone()
            .oneshot(json_post(
                "/api/auth/login",
                serde_json::json!({"email": TEST_EMAIL, "password": "wrong-password"}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(response.headers().get(header::SET_COOKIE).is_none());
    }

    #[tokio::test]
    async fn test_login_unknown_email_is_unauthorized() {
        let t = test_app().await;

        let response = t
            .app
            .clone()
            .oneshot(json_post(
                "/api/auth/login",
                serde_json::json!({"email": "nobody@acadia.test", "password": TEST_PASSWORD}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_current_user_without_cookies_is_unauthorized() {
        let t = test_app().await;

        let response = t
            .app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/api/auth/user")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_login_then_current_user_round_trip() {
        let t = test_app().await;

        let login_response = login(&t.app).await;
        let access = cookie_value(&login_response, "acadia_access").unwrap();

        let response = t
            .app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/api/auth/user")
                    .header(header::COOKIE, format!("acadia_access={}", access))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["email"], TEST_EMAIL);
        assert_eq!(body["role"], "admin");
    }

    #[tokio::test]
    async fn test_current_user_accepts_bearer_token() {
        let t = test_app().await;

        let body = body_json(login(&t.app).await).await;
        let token = body["accessToken"].as_str().unwrap();

        let response = t
            .app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/api/auth/user")
                    .header(header::AUTHORIZATION, format!("Bearer {}", token))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_refresh_without_cookie_is_unauthorized() {
        let t = test_app().await;

        let response = t
            .app
            .clone()
            .oneshot(json_post("/api/auth/refresh", serde_json::json!({})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(response.headers().get(header::SET_COOKIE).is_none());
    }

    #[tokio::test]
    async fn test_refresh_with_expired_token_is_unauthorized() {
        let t = test_app().await;

        // Past TTLs yield tokens that are already expired when issued.
        let expired_codec = TokenCodec::new(TEST_SECRET, -15, -1);
        let expired = expired_codec.create_refresh_token(1, "admin").unwrap();

        let response = t
            .app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/auth/refresh")
                    .header(header::COOKIE, format!("acadia_refresh={}", expired.token))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(response.headers().get(header::SET_COOKIE).is_none());
    }

    #[tokio::test]
    async fn test_refresh_rotates_the_pair() {
        let t = test_app().await;

        let login_response = login(&t.app).await;
        let old_access = cookie_value(&login_response, "acadia_access").unwrap();
        let old_refresh = cookie_value(&login_response, "acadia_refresh").unwrap();

        let response = t
            .app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/auth/refresh")
                    .header(header::COOKIE, format!("acadia_refresh={}", old_refresh))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let new_access = cookie_value(&response, "acadia_access").unwrap();
        let new_refresh = cookie_value(&response, "acadia_refresh").unwrap();
        assert_ne!(new_access, old_access);
        assert_ne!(new_refresh, old_refresh);

        let body = body_json(response).await;
        assert!(body["accessToken"].is_string());
    }

    #[tokio::test]
    async fn test_superseded_refresh_token_revokes_the_chain() {
        let t = test_app().await;

        let login_response = login(&t.app).await;
        let old_refresh = cookie_value(&login_response, "acadia_refresh").unwrap();

        // First rotation succeeds and supersedes the login token.
        let rotated = t
            .app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/auth/refresh")
                    .header(header::COOKIE, format!("acadia_refresh={}", old_refresh))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(rotated.status(), StatusCode::OK);
        let new_refresh = cookie_value(&rotated, "acadia_refresh").unwrap();

        // Replaying the superseded token fails and revokes the chain.
        let replay = t
            .app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/auth/refresh")
                    .header(header::COOKIE, format!("acadia_refresh={}", old_refresh))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(replay.status(), StatusCode::UNAUTHORIZED);

        // The revocation took the still-unused rotated token with it.
        let after_revoke = t
            .app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/auth/refresh")
                    .header(header::COOKIE, format!("acadia_refresh={}", new_refresh))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(after_revoke.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_logout_clears_cookies_and_is_idempotent() {
        let t = test_app().await;

        let login_response = login(&t.app).await;
        let refresh = cookie_value(&login_response, "acadia_refresh").unwrap();

        let response = t
            .app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/auth/logout")
                    .header(header::COOKIE, format!("acadia_refresh={}", refresh))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let cookies: Vec<String> = response
            .headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .map(|v| v.to_str().unwrap().to_string())
            .collect();
        assert_eq!(cookies.len(), 2);
        assert!(cookies.iter().all(|c| c.contains("Max-Age=0")));

        // Without any cookies it still succeeds.
        let bare = t
            .app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/auth/logout")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(bare.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_forgot_password_ack_is_identical_for_unknown_email() {
        let t = test_app().await;

        let known = t
            .app
            .clone()
            .oneshot(json_post(
                "/api/auth/forgot-password",
                serde_json::json!({"email": TEST_EMAIL}),
            ))
            .await
            .unwrap();
        let unknown = t
            .app
            .clone()
            .oneshot(json_post(
                "/api/auth/forgot-password",
                serde_json::json!({"email": "nobody@acadia.test"}),
            ))
            .await
            .unwrap();

        assert_eq!(known.status(), StatusCode::OK);
        assert_eq!(unknown.status(), StatusCode::OK);

        let known_body = axum::body::to_bytes(known.into_body(), usize::MAX)
            .await
            .unwrap();
        let unknown_body = axum::body::to_bytes(unknown.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(known_body, unknown_body);
    }

    #[tokio::test]
    async fn test_validate_reset_token() {
        let t = test_app().await;

        let expires_at = Utc::now() + Duration::minutes(60);
        t.state
            .db
            .create_reset_token(1, "known-token", expires_at)
            .await
            .unwrap();

        let valid = t
            .app
            .clone()
            .oneshot(json_post(
                "/api/auth/validate-reset-token",
                serde_json::json!({"token": "known-token"}),
            ))
            .await
            .unwrap();
        assert_eq!(valid.status(), StatusCode::OK);

        let unknown = t
            .app
            .clone()
            .oneshot(json_post(
                "/api/auth/validate-reset-token",
                serde_json::json!({"token": "unknown-token"}),
            ))
            .await
            .unwrap();
        assert_eq!(unknown.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_expired_reset_token_is_rejected() {
        let t = test_app().await;

        let expires_at = Utc::now() - Duration::minutes(1);
        t.state
            .db
            .create_reset_token(1, "stale-token", expires_at)
            .await
            .unwrap();

        let response = t
            .app
            .clone()
            .oneshot(json_post(
                "/api/auth/validate-reset-token",
                serde_json::json!({"token": "stale-token"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_reset_password_is_single_use() {
        let t = test_app().await;

        let expires_at = Utc::now() + Duration::minutes(60);
        t.state
            .db
            .create_reset_token(1, "reset-once", expires_at)
            .await
            .unwrap();

        let first = t
            .app
            .clone()
            .oneshot(json_post(
                "/api/auth/reset-password",
                serde_json::json!({"token": "reset-once", "newPassword": "brand-new-password"}),
            ))
            .await
            .unwrap();
        assert_eq!(first.status(), StatusCode::OK);

        let second = t
            .app
            .clone()
            .oneshot(json_post(
                "/api/auth/reset-password",
                serde_json::json!({"token": "reset-once", "newPassword": "another-password"}),
            ))
            .await
            .unwrap();
        assert_eq!(second.status(), StatusCode::UNAUTHORIZED);

        // The new password is live, the old one is not.
        let old_login = login(&t.app).await;
        assert_eq!(old_login.status(), StatusCode::UNAUTHORIZED);

        let new_login = t
            .app
            .clone()
            .oneshot(json_post(
                "/api/auth/login",
                serde_json::json!({"email": TEST_EMAIL, "password": "brand-new-password"}),
            ))
            .await
            .unwrap();
        assert_eq!(new_login.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_reset_password_rejects_short_password() {
        let t = test_app().await;

        let response = t
            .app
            .clone()
            .oneshot(json_post(
                "/api/auth/reset-password",
                serde_json::json!({"token": "whatever", "newPassword": "short"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unsupported_method_is_rejected() {
        let t = test_app().await;

        let response = t
            .app
            .clone()
            .oneshot(
                Request::builder()
                    .method("GET")
                    .uri("/api/auth/login")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_cors_preflight_is_accepted() {
        let t = test_app().await;

        let response = t
            .app
            .clone()
            .oneshot(
                Request::builder()
                    .method("OPTIONS")
                    .uri("/api/auth/login")
                    .header(header::ORIGIN, "http://localhost:5173")
                    .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }
}
