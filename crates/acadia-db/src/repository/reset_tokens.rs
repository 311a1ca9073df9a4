//! Password reset token operations

use chrono::{DateTime, Utc};

use crate::error::DbError;
use crate::models::PasswordResetToken;
use crate::repository::Database;

impl Database {
    // ==================== Reset Token Operations ====================

    /// Store a new reset token for a user. Any earlier tokens for the
    /// same user are discarded so only the latest one can succeed.
    pub async fn create_reset_token(
        &self,
        user_id: i64,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<PasswordResetToken, DbError> {
        let now = Utc::now();

        sqlx::query("DELETE FROM password_reset_tokens WHERE user_id = ?")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        sqlx::query(
            r#"
            INSERT INTO password_reset_tokens (token, user_id, expires_at, used_at, created_at)
            VALUES (?, ?, ?, NULL, ?)
            "#,
        )
        .bind(token)
        .bind(user_id)
        .bind(expires_at.to_rfc3339())
        .bind(now.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(PasswordResetToken {
            token: token.to_string(),
            user_id,
            expires_at,
            used_at: None,
            created_at: now,
        })
    }

    /// Look up a reset token
    pub async fn get_reset_token(&self, token: &str) -> Result<Option<PasswordResetToken>, DbError> {
        let result = sqlx::query(
            r#"
            SELECT token, user_id, expires_at, used_at, created_at
            FROM password_reset_tokens
            WHERE token = ?
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        result
            .map(|row| PasswordResetToken::try_from(&row).map_err(DbError::from))
            .transpose()
    }

    /// Mark a reset token as used. Returns false when the token was
    /// already consumed or has expired, so two racing resets cannot
    /// both succeed.
    pub async fn consume_reset_token(&self, token: &str) -> Result<bool, DbError> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            UPDATE password_reset_tokens
            SET used_at = ?
            WHERE token = ? AND used_at IS NULL AND expires_at > ?
            "#,
        )
        .bind(now.to_rfc3339())
        .bind(token)
        .bind(now.to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
