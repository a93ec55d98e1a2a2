//! Append-only navigation history.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct HistoryRow {
    pub id: Uuid,
    pub uid: Uuid,
    pub start_label: String,
    pub end_label: String,
    pub score: i32,
    pub distance: String,
    pub time: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewHistoryEntry<'a> {
    pub start_label: &'a str,
    pub end_label: &'a str,
    pub score: i32,
    pub distance: &'a str,
    pub time: &'a str,
}

/// Newest entries first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_history(pool: &PgPool, uid: Uuid) -> Result<Vec<HistoryRow>, DbError> {
    let rows = sqlx::query_as::<_, HistoryRow>(
        "SELECT id, uid, start_label, end_label, score, distance, time, created_at \
         FROM navigation_history \
         WHERE uid = $1 \
         ORDER BY created_at DESC, id",
    )
    .bind(uid)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn insert_history(
    pool: &PgPool,
    uid: Uuid,
    entry: &NewHistoryEntry<'_>,
) -> Result<HistoryRow, DbError> {
    let row = sqlx::query_as::<_, HistoryRow>(
        "INSERT INTO navigation_history (id, uid, start_label, end_label, score, distance, time) \
         VALUES ($1, $2, $3, $4, $5, $6, $7) \
         RETURNING id, uid, start_label, end_label, score, distance, time, created_at",
    )
    .bind(Uuid::new_v4())
    .bind(uid)
    .bind(entry.start_label)
    .bind(entry.end_label)
    .bind(entry.score)
    .bind(entry.distance)
    .bind(entry.time)
    .fetch_one(pool)
    .await?;
    Ok(row)
}

/// Deletes one of `uid`'s entries.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no such entry belongs to `uid`.
pub async fn delete_history_entry(pool: &PgPool, uid: Uuid, id: Uuid) -> Result<(), DbError> {
    let result = sqlx::query("DELETE FROM navigation_history WHERE id = $1 AND uid = $2")
        .bind(id)
        .bind(uid)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}

/// Deletes every entry for `uid` and returns how many were removed.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the delete fails.
pub async fn clear_history(pool: &PgPool, uid: Uuid) -> Result<u64, DbError> {
    let result = sqlx::query("DELETE FROM navigation_history WHERE uid = $1")
        .bind(uid)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}
