//! Emergency contacts, each owned by one user.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ContactRow {
    pub id: Uuid,
    pub uid: Uuid,
    pub name: String,
    pub phone: String,
    pub relation: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewContact<'a> {
    pub name: &'a str,
    pub phone: &'a str,
    pub relation: Option<&'a str>,
}

/// Contacts for `uid` in the order they were added.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_contacts(pool: &PgPool, uid: Uuid) -> Result<Vec<ContactRow>, DbError> {
    let rows = sqlx::query_as::<_, ContactRow>(
        "SELECT id, uid, name, phone, relation, created_at \
         FROM emergency_contacts \
         WHERE uid = $1 \
         ORDER BY created_at, id",
    )
    .bind(uid)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn insert_contact(
    pool: &PgPool,
    uid: Uuid,
    contact: &NewContact<'_>,
) -> Result<ContactRow, DbError> {
    let row = sqlx::query_as::<_, ContactRow>(
        "INSERT INTO emergency_contacts (id, uid, name, phone, relation) \
         VALUES ($1, $2, $3, $4, $5) \
         RETURNING id, uid, name, phone, relation, created_at",
    )
    .bind(Uuid::new_v4())
    .bind(uid)
    .bind(contact.name)
    .bind(contact.phone)
    .bind(contact.relation)
    .fetch_one(pool)
    .await?;
    Ok(row)
}

/// Deletes one of `uid`'s contacts. Another user's contact id is treated
/// as absent.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no such contact belongs to `uid`.
pub async fn delete_contact(pool: &PgPool, uid: Uuid, id: Uuid) -> Result<(), DbError> {
    let result = sqlx::query("DELETE FROM emergency_contacts WHERE id = $1 AND uid = $2")
        .bind(id)
        .bind(uid)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}
