//! Database operations for community reports and per-user likes.

use chrono::{DateTime, Utc};
use safeway_core::{Coordinate, ReportType};
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from the `reports` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ReportRow {
    pub id: Uuid,
    pub uid: Uuid,
    pub title: String,
    pub report_type: String,
    pub content: String,
    pub location: String,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub likes: i32,
    pub comment_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ReportRow {
    /// Pinned position, when the author supplied one.
    #[must_use]
    pub fn coordinate(&self) -> Option<Coordinate> {
        Some(Coordinate::new(self.lat?, self.lng?))
    }
}

#[derive(Debug, Clone)]
pub struct NewReport<'a> {
    pub title: &'a str,
    pub report_type: ReportType,
    pub content: &'a str,
    pub location: &'a str,
    pub coordinate: Option<Coordinate>,
}

/// Partial report update; `None` leaves the column unchanged.
#[derive(Debug, Clone, Default)]
pub struct ReportUpdate {
    pub title: Option<String>,
    pub report_type: Option<ReportType>,
    pub content: Option<String>,
    pub location: Option<String>,
}

/// Outcome of a like toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LikeToggle {
    pub liked: bool,
    pub likes: i32,
}

const REPORT_COLUMNS: &str = "id, uid, title, report_type, content, location, lat, lng, \
                              likes, comment_count, created_at, updated_at";

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Newest reports first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_reports(pool: &PgPool, limit: i64) -> Result<Vec<ReportRow>, DbError> {
    let rows = sqlx::query_as::<_, ReportRow>(&format!(
        "SELECT {REPORT_COLUMNS} FROM reports ORDER BY created_at DESC, id LIMIT $1"
    ))
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_report(pool: &PgPool, id: Uuid) -> Result<Option<ReportRow>, DbError> {
    let row = sqlx::query_as::<_, ReportRow>(&format!(
        "SELECT {REPORT_COLUMNS} FROM reports WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Inserts a report authored by `uid` with zero likes and comments.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn insert_report(
    pool: &PgPool,
    uid: Uuid,
    report: &NewReport<'_>,
) -> Result<ReportRow, DbError> {
    let row = sqlx::query_as::<_, ReportRow>(&format!(
        "INSERT INTO reports (id, uid, title, report_type, content, location, lat, lng) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
         RETURNING {REPORT_COLUMNS}"
    ))
    .bind(Uuid::new_v4())
    .bind(uid)
    .bind(report.title)
    .bind(report.report_type.as_str())
    .bind(report.content)
    .bind(report.location)
    .bind(report.coordinate.map(|c| c.lat))
    .bind(report.coordinate.map(|c| c.lng))
    .fetch_one(pool)
    .await?;
    Ok(row)
}

/// Applies a partial update. Ownership is checked by the caller.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the report does not exist.
pub async fn update_report(
    pool: &PgPool,
    id: Uuid,
    update: &ReportUpdate,
) -> Result<ReportRow, DbError> {
    sqlx::query_as::<_, ReportRow>(&format!(
        "UPDATE reports \
         SET title = COALESCE($2, title), \
             report_type = COALESCE($3, report_type), \
             content = COALESCE($4, content), \
             location = COALESCE($5, location), \
             updated_at = NOW() \
         WHERE id = $1 \
         RETURNING {REPORT_COLUMNS}"
    ))
    .bind(id)
    .bind(update.title.as_deref())
    .bind(update.report_type.map(ReportType::as_str))
    .bind(update.content.as_deref())
    .bind(update.location.as_deref())
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)
}

/// Deletes a report together with its likes and comments.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the report does not exist.
pub async fn delete_report(pool: &PgPool, id: Uuid) -> Result<(), DbError> {
    let result = sqlx::query("DELETE FROM reports WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}

/// Flips `uid`'s like on a report and returns the new state and count.
///
/// The like row and the counter change in one transaction.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the report does not exist.
pub async fn toggle_like(pool: &PgPool, report_id: Uuid, uid: Uuid) -> Result<LikeToggle, DbError> {
    let mut tx = pool.begin().await?;

    // Row lock serialises concurrent toggles on the same report.
    let exists = sqlx::query_scalar::<_, Uuid>("SELECT id FROM reports WHERE id = $1 FOR UPDATE")
        .bind(report_id)
        .fetch_optional(&mut *tx)
        .await?;
    if exists.is_none() {
        return Err(DbError::NotFound);
    }

    let removed = sqlx::query("DELETE FROM report_likes WHERE report_id = $1 AND uid = $2")
        .bind(report_id)
        .bind(uid)
        .execute(&mut *tx)
        .await?
        .rows_affected()
        > 0;

    let (liked, delta) = if removed {
        (false, -1_i32)
    } else {
        sqlx::query("INSERT INTO report_likes (report_id, uid) VALUES ($1, $2)")
            .bind(report_id)
            .bind(uid)
            .execute(&mut *tx)
            .await?;
        (true, 1_i32)
    };

    let likes = sqlx::query_scalar::<_, i32>(
        "UPDATE reports SET likes = GREATEST(likes + $2, 0) WHERE id = $1 RETURNING likes",
    )
    .bind(report_id)
    .bind(delta)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(LikeToggle { liked, likes })
}

/// Pinned report positions inside a lat/lng box, for route scoring.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_report_coordinates_within(
    pool: &PgPool,
    south_west: Coordinate,
    north_east: Coordinate,
) -> Result<Vec<Coordinate>, DbError> {
    let rows = sqlx::query_as::<_, (f64, f64)>(
        "SELECT lat, lng FROM reports \
         WHERE lat IS NOT NULL AND lng IS NOT NULL \
           AND lat BETWEEN $1 AND $2 \
           AND lng BETWEEN $3 AND $4",
    )
    .bind(south_west.lat)
    .bind(north_east.lat)
    .bind(south_west.lng)
    .bind(north_east.lng)
    .fetch_all(pool)
    .await?;
    Ok(rows
        .into_iter()
        .map(|(lat, lng)| Coordinate::new(lat, lng))
        .collect())
}
