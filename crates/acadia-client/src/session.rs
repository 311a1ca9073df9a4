//! Client session state

use chrono::{DateTime, Duration, Utc};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::error::ClientError;

/// Freshness window for the cached current-user lookup.
const USER_CACHE_TTL_SECS: i64 = 5 * 60;

/// User record as returned by the session API
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    pub id: i64,
    pub email: String,
    pub full_name: String,
    pub role: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginResponse {
    #[allow(dead_code)]
    access_token: String,
    user: SessionUser,
}

#[derive(Debug, Clone)]
struct CachedUser {
    user: SessionUser,
    fetched_at: DateTime<Utc>,
}

/// Session-scoped authentication state. Created on application start,
/// cleared on logout; tokens ride on the embedded cookie store.
pub struct AuthSession {
    base_url: String,
    client: Client,
    cache: Arc<RwLock<Option<CachedUser>>>,
}

impl AuthSession {
    /// Create a new session against the given service base URL.
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        let client = Client::builder().cookie_store(true).build()?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
            cache: Arc::new(RwLock::new(None)),
        })
    }

    /// Current user, served from cache inside the freshness window and
    /// refetched beyond it. Any failure means "not authenticated" - no
    /// automatic retry.
    pub async fn current_user(&self) -> Option<SessionUser> {
        {
            let cache = self.cache.read().await;
            if let Some(cached) = cache.as_ref() {
                if Utc::now() - cached.fetched_at < Duration::seconds(USER_CACHE_TTL_SECS) {
                    return Some(cached.user.clone());
                }
            }
        }

        match self.fetch_user().await {
            Ok(user) => {
                *self.cache.write().await = Some(CachedUser {
                    user: user.clone(),
                    fetched_at: Utc::now(),
                });
                Some(user)
            }
            Err(e) => {
                debug!("Current-user lookup failed: {}", e);
                *self.cache.write().await = None;
                None
            }
        }
    }

    async fn fetch_user(&self) -> Result<SessionUser, ClientError> {
        let response = self
            .client
            .get(format!("{}/api/auth/user", self.base_url))
            .send()
            .await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            return Err(ClientError::Unauthenticated);
        }
        if !response.status().is_success() {
            return Err(ClientError::UnexpectedStatus(response.status().as_u16()));
        }

        Ok(response.json().await?)
    }

    /// Whether a user is currently authenticated.
    pub async fn is_authenticated(&self) -> bool {
        self.current_user().await.is_some()
    }

    /// Authenticate with email and password. The token pair arrives as
    /// cookies on the embedded store.
    pub async fn login(&self, email: &str, password: &str) -> Result<SessionUser, ClientError> {
        let response = self
            .client
            .post(format!("{}/api/auth/login", self.base_url))
            .json(&serde_json::json!({"email": email, "password": password}))
            .send()
            .await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            return Err(ClientError::InvalidCredentials);
        }
        if !response.status().is_success() {
            return Err(ClientError::UnexpectedStatus(response.status().as_u16()));
        }

        let body: LoginResponse = response.json().await?;

        *self.cache.write().await = Some(CachedUser {
            user: body.user.clone(),
            fetched_at: Utc::now(),
        });

        debug!("Logged in as {}", body.user.email);
        Ok(body.user)
    }

    /// Best-effort logout. The server call may fail; the cached
    /// identity is released either way.
    pub async fn logout(&self) {
        let result = self
            .client
            .post(format!("{}/api/auth/logout", self.base_url))
            .send()
            .await;

        *self.cache.write().await = None;

        match result {
            Ok(_) => debug!("Logged out"),
            Err(e) => warn!("Logout request failed, local session cleared anyway: {}", e),
        }
    }

    /// Attempt silent renewal of the token pair. Returns `true` when
    /// the caller may retry the original request, `false` when a fresh
    /// login is required.
    pub async fn refresh(&self) -> bool {
        let result = self
            .client
            .post(format!("{}/api/auth/refresh", self.base_url))
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => {
                debug!("Token pair refreshed");
                true
            }
            Ok(response) => {
                debug!("Token refresh rejected: {}", response.status());
                *self.cache.write().await = None;
                false
            }
            Err(e) => {
                debug!("Token refresh failed: {}", e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Nothing listens on this port; every request fails fast.
    const DEAD_SERVER: &str = "http://127.0.0.1:9";

    fn test_user() -> SessionUser {
        SessionUser {
            id: 1,
            email: "head@acadia.test".to_string(),
            full_name: "Head Teacher".to_string(),
            role: "admin".to_string(),
        }
    }

    async fn seed_cache(session: &AuthSession, fetched_at: DateTime<Utc>) {
        *session.cache.write().await = Some(CachedUser {
            user: test_user(),
            fetched_at,
        });
    }

    #[test]
    fn test_base_url_is_normalized() {
        let session = AuthSession::new("http://localhost:8080/").unwrap();
        assert_eq!(session.base_url, "http://localhost:8080");
    }

    #[tokio::test]
    async fn test_fresh_cache_is_served_without_network() {
        let session = AuthSession::new(DEAD_SERVER).unwrap();
        seed_cache(&session, Utc::now()).await;

        // The server is unreachable, so a hit proves the cache answered.
        let user = session.current_user().await.unwrap();
        assert_eq!(user, test_user());
        assert!(session.is_authenticated().await);
    }

    #[tokio::test]
    async fn test_stale_cache_falls_back_to_unauthenticated() {
        let session = AuthSession::new(DEAD_SERVER).unwrap();
        seed_cache(
            &session,
            Utc::now() - Duration::seconds(USER_CACHE_TTL_SECS + 1),
        )
        .await;

        assert!(session.current_user().await.is_none());
        assert!(!session.is_authenticated().await);
    }

    #[tokio::test]
    async fn test_logout_clears_cache_even_when_server_is_unreachable() {
        let session = AuthSession::new(DEAD_SERVER).unwrap();
        seed_cache(&session, Utc::now()).await;

        session.logout().await;

        assert!(session.cache.read().await.is_none());
    }

    #[tokio::test]
    async fn test_refresh_fails_when_server_is_unreachable() {
        let session = AuthSession::new(DEAD_SERVER).unwrap();

        assert!(!session.refresh().await);
    }
}
