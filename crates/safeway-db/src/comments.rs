//! Comments on community reports.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CommentRow {
    pub id: Uuid,
    pub report_id: Uuid,
    pub uid: Uuid,
    pub author_name: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewComment<'a> {
    pub report_id: Uuid,
    pub uid: Uuid,
    pub author_name: &'a str,
    pub content: &'a str,
}

/// Comments on a report, oldest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_comments(pool: &PgPool, report_id: Uuid) -> Result<Vec<CommentRow>, DbError> {
    let rows = sqlx::query_as::<_, CommentRow>(
        "SELECT id, report_id, uid, author_name, content, created_at \
         FROM report_comments \
         WHERE report_id = $1 \
         ORDER BY created_at ASC, id",
    )
    .bind(report_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Adds a comment and bumps the report's `comment_count` in one transaction.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the report does not exist.
pub async fn insert_comment(pool: &PgPool, comment: &NewComment<'_>) -> Result<CommentRow, DbError> {
    let mut tx = pool.begin().await?;

    let bumped = sqlx::query("UPDATE reports SET comment_count = comment_count + 1 WHERE id = $1")
        .bind(comment.report_id)
        .execute(&mut *tx)
        .await?;
    if bumped.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }

    let row = sqlx::query_as::<_, CommentRow>(
        "INSERT INTO report_comments (id, report_id, uid, author_name, content) \
         VALUES ($1, $2, $3, $4, $5) \
         RETURNING id, report_id, uid, author_name, content, created_at",
    )
    .bind(Uuid::new_v4())
    .bind(comment.report_id)
    .bind(comment.uid)
    .bind(comment.author_name)
    .bind(comment.content)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(row)
}
