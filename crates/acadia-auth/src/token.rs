//! Access and refresh token management

use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::error::AuthError;

/// Token kind, embedded in the claims so an access token can never be
/// presented as a refresh token and vice versa.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    Access,
    Refresh,
}

impl TokenKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::Access => "access",
            TokenKind::Refresh => "refresh",
        }
    }
}

/// JWT claims
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Token ID (unique per issued token)
    pub jti: String,
    /// Subject (user ID)
    pub sub: String,
    /// User role
    pub role: String,
    /// Token kind
    #[serde(rename = "typ")]
    pub kind: TokenKind,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl Claims {
    /// Parse the subject back into a user ID.
    pub fn user_id(&self) -> Option<i64> {
        self.sub.parse().ok()
    }
}

/// A freshly issued token together with the metadata the transport
/// layer needs.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    /// Encoded JWT
    pub token: String,
    /// Token ID embedded in the claims
    pub jti: String,
    /// Expiration time
    pub expires_at: chrono::DateTime<Utc>,
    /// Lifetime in seconds (cookie Max-Age)
    pub max_age: i64,
}

/// Token codec for generating and verifying access/refresh pairs
#[derive(Clone)]
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenCodec {
    /// Create a new token codec
    pub fn new(secret: &str, access_ttl_minutes: i64, refresh_ttl_days: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            access_ttl: Duration::minutes(access_ttl_minutes),
            refresh_ttl: Duration::days(refresh_ttl_days),
        }
    }

    /// Generate a short-lived access token for a user
    pub fn create_access_token(&self, user_id: i64, role: &str) -> Result<IssuedToken, AuthError> {
        self.issue(user_id, role, TokenKind::Access, self.access_ttl)
    }

    /// Generate a long-lived refresh token for a user
    pub fn create_refresh_token(&self, user_id: i64, role: &str) -> Result<IssuedToken, AuthError> {
        self.issue(user_id, role, TokenKind::Refresh, self.refresh_ttl)
    }

    fn issue(
        &self,
        user_id: i64,
        role: &str,
        kind: TokenKind,
        ttl: Duration,
    ) -> Result<IssuedToken, AuthError> {
        let now = Utc::now();
        let exp = now + ttl;
        let jti = Uuid::new_v4().to_string();

        let claims = Claims {
            jti: jti.clone(),
            sub: user_id.to_string(),
            role: role.to_string(),
            kind,
            iat: now.timestamp(),
            exp: exp.timestamp(),
        };

        debug!("Issuing {} token for user {}", kind.as_str(), user_id);

        let token = encode(&Header::default(), &claims, &self.encoding_key).map_err(AuthError::Jwt)?;

        Ok(IssuedToken {
            token,
            jti,
            expires_at: exp,
            max_age: ttl.num_seconds(),
        })
    }

    /// Verify an access token. Fails closed: any signature mismatch,
    /// malformed structure, wrong kind, or past expiry yields `None`.
    pub fn verify_access_token(&self, token: &str) -> Option<Claims> {
        self.verify(token, TokenKind::Access)
    }

    /// Verify a refresh token. Same failure policy as
    /// [`verify_access_token`](Self::verify_access_token).
    pub fn verify_refresh_token(&self, token: &str) -> Option<Claims> {
        self.verify(token, TokenKind::Refresh)
    }

    fn verify(&self, token: &str, kind: TokenKind) -> Option<Claims> {
        let mut validation = Validation::default();
        validation.leeway = 0;

        let claims = decode::<Claims>(token, &self.decoding_key, &validation)
            .ok()?
            .claims;

        if claims.kind != kind {
            return None;
        }

        Some(claims)
    }
}
