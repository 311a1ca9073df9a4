//! Refresh session operations
//!
//! One row per user: the token id of the most recently issued refresh
//! token. A refresh request presenting any other token id is
//! superseded and rejected by the API layer.

use chrono::{DateTime, Utc};

use crate::error::DbError;
use crate::models::RefreshSession;
use crate::repository::Database;

impl Database {
    // ==================== Refresh Session Operations ====================

    /// Record the current refresh token for a user, replacing any
    /// previous one.
    pub async fn upsert_refresh_session(
        &self,
        user_id: i64,
        token_id: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), DbError> {
        let now = Utc::now();
        sqlx::query(
            r#"
            INSERT INTO refresh_sessions (user_id, token_id, issued_at, expires_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(user_id) DO UPDATE SET
                token_id = excluded.token_id,
                issued_at = excluded.issued_at,
                expires_at = excluded.expires_at
            "#,
        )
        .bind(user_id)
        .bind(token_id)
        .bind(now.to_rfc3339())
        .bind(expires_at.to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Get the current refresh session for a user
    pub async fn get_refresh_session(&self, user_id: i64) -> Result<Option<RefreshSession>, DbError> {
        let result = sqlx::query(
            r#"
            SELECT user_id, token_id, issued_at, expires_at
            FROM refresh_sessions
            WHERE user_id = ?
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        result
            .map(|row| RefreshSession::try_from(&row).map_err(DbError::from))
            .transpose()
    }

    /// Delete the refresh session for a user, superseding every
    /// outstanding refresh token in the chain.
    pub async fn delete_refresh_session(&self, user_id: i64) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM refresh_sessions WHERE user_id = ?")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
