//! Bearer session tokens.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

/// The account behind a live session.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SessionUserRow {
    pub uid: Uuid,
    pub name: String,
    pub expires_at: DateTime<Utc>,
}

/// Stores a new session token for `uid`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn create_session(
    pool: &PgPool,
    token: &str,
    uid: Uuid,
    expires_at: DateTime<Utc>,
) -> Result<(), DbError> {
    sqlx::query("INSERT INTO sessions (token, uid, expires_at) VALUES ($1, $2, $3)")
        .bind(token)
        .bind(uid)
        .bind(expires_at)
        .execute(pool)
        .await?;
    Ok(())
}

/// Resolves a token to its user. Expired sessions resolve to `None`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn find_session_user(
    pool: &PgPool,
    token: &str,
) -> Result<Option<SessionUserRow>, DbError> {
    let row = sqlx::query_as::<_, SessionUserRow>(
        "SELECT u.uid, u.name, s.expires_at \
         FROM sessions s \
         JOIN users u ON u.uid = s.uid \
         WHERE s.token = $1 AND s.expires_at > NOW()",
    )
    .bind(token)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Deletes a session. Returns `true` if a row was removed.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the delete fails.
pub async fn delete_session(pool: &PgPool, token: &str) -> Result<bool, DbError> {
    let result = sqlx::query("DELETE FROM sessions WHERE token = $1")
        .bind(token)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Removes every expired session and returns how many were deleted.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the delete fails.
pub async fn purge_expired_sessions(pool: &PgPool) -> Result<u64, DbError> {
    let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= NOW()")
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}
