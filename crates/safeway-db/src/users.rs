//! Database operations for the `users` table.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{is_unique_violation, DbError};

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// Public profile columns of a `users` row.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRow {
    pub uid: Uuid,
    pub email: String,
    pub name: String,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Columns needed to verify a login.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CredentialsRow {
    pub uid: Uuid,
    pub name: String,
    pub password_hash: String,
}

#[derive(Debug, Clone)]
pub struct NewUser<'a> {
    pub email: &'a str,
    pub name: &'a str,
    pub phone: Option<&'a str>,
    pub password_hash: &'a str,
}

/// Partial profile update. `None` leaves a column unchanged; for `phone`,
/// `Some(None)` clears it.
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    pub name: Option<String>,
    pub phone: Option<Option<String>>,
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Inserts a new account.
///
/// # Errors
///
/// Returns [`DbError::Duplicate`] if the email (case-insensitive) is already
/// registered, or [`DbError::Sqlx`] for other failures.
pub async fn create_user(pool: &PgPool, user: &NewUser<'_>) -> Result<UserRow, DbError> {
    sqlx::query_as::<_, UserRow>(
        "INSERT INTO users (uid, email, name, phone, password_hash) \
         VALUES ($1, $2, $3, $4, $5) \
         RETURNING uid, email, name, phone, created_at, updated_at",
    )
    .bind(Uuid::new_v4())
    .bind(user.email)
    .bind(user.name)
    .bind(user.phone)
    .bind(user.password_hash)
    .fetch_one(pool)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            DbError::Duplicate("email".to_owned())
        } else {
            DbError::Sqlx(e)
        }
    })
}

/// Returns a user by uid, or `None` if absent.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_user(pool: &PgPool, uid: Uuid) -> Result<Option<UserRow>, DbError> {
    let row = sqlx::query_as::<_, UserRow>(
        "SELECT uid, email, name, phone, created_at, updated_at \
         FROM users WHERE uid = $1",
    )
    .bind(uid)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Looks up login material by email, case-insensitively.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_credentials_by_email(
    pool: &PgPool,
    email: &str,
) -> Result<Option<CredentialsRow>, DbError> {
    let row = sqlx::query_as::<_, CredentialsRow>(
        "SELECT uid, name, password_hash \
         FROM users WHERE LOWER(email) = LOWER($1)",
    )
    .bind(email)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Applies a partial profile update and returns the new row, or `None` if
/// the user does not exist.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn update_user(
    pool: &PgPool,
    uid: Uuid,
    update: &UserUpdate,
) -> Result<Option<UserRow>, DbError> {
    let (set_phone, phone) = match &update.phone {
        Some(value) => (true, value.as_deref()),
        None => (false, None),
    };

    let row = sqlx::query_as::<_, UserRow>(
        "UPDATE users \
         SET name = COALESCE($2, name), \
             phone = CASE WHEN $3 THEN $4 ELSE phone END, \
             updated_at = NOW() \
         WHERE uid = $1 \
         RETURNING uid, email, name, phone, created_at, updated_at",
    )
    .bind(uid)
    .bind(update.name.as_deref())
    .bind(set_phone)
    .bind(phone)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}
