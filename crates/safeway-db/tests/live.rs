//! Live integration tests for safeway-db using `#[sqlx::test]`.
//!
//! Each test gets a fresh, fully-migrated Postgres database spun up by the
//! sqlx test harness. `"../../migrations"` is relative to the crate root.

use chrono::{Duration, Utc};
use safeway_core::{Coordinate, ReportType};
use safeway_db::{
    clear_history, create_session, create_user, delete_contact, delete_history_entry,
    delete_report, delete_session, find_session_user, get_credentials_by_email, get_report,
    get_user, insert_comment, insert_contact, insert_history, insert_report, list_comments,
    list_contacts, list_history, list_report_coordinates_within, list_reports,
    purge_expired_sessions, toggle_like, update_report, update_user, DbError, NewComment,
    NewContact, NewHistoryEntry, NewReport, NewUser, ReportUpdate, UserUpdate,
};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn insert_test_user(pool: &sqlx::PgPool, email: &str) -> Uuid {
    create_user(
        pool,
        &NewUser {
            email,
            name: "Test User",
            phone: None,
            password_hash: "hash",
        },
    )
    .await
    .unwrap_or_else(|e| panic!("insert_test_user failed for '{email}': {e}"))
    .uid
}

async fn insert_test_report(pool: &sqlx::PgPool, uid: Uuid, coordinate: Option<Coordinate>) -> Uuid {
    insert_report(
        pool,
        uid,
        &NewReport {
            title: "Broken streetlight",
            report_type: ReportType::Warning,
            content: "The light at the corner has been out for a week",
            location: "Myeong-dong",
            coordinate,
        },
    )
    .await
    .expect("insert_report failed")
    .id
}

// ---------------------------------------------------------------------------
// Section 1: Users and sessions
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn duplicate_email_is_rejected_case_insensitively(pool: sqlx::PgPool) {
    insert_test_user(&pool, "walker@example.com").await;

    let err = create_user(
        &pool,
        &NewUser {
            email: "Walker@Example.com",
            name: "Other",
            phone: None,
            password_hash: "h",
        },
    )
    .await
    .unwrap_err();

    assert!(matches!(err, DbError::Duplicate(_)), "got {err:?}");
}

#[sqlx::test(migrations = "../../migrations")]
async fn credentials_lookup_ignores_email_case(pool: sqlx::PgPool) {
    let uid = insert_test_user(&pool, "walker@example.com").await;

    let creds = get_credentials_by_email(&pool, "WALKER@example.com")
        .await
        .expect("query")
        .expect("credentials present");
    assert_eq!(creds.uid, uid);
    assert_eq!(creds.password_hash, "hash");
}

#[sqlx::test(migrations = "../../migrations")]
async fn update_user_sets_and_clears_phone(pool: sqlx::PgPool) {
    let uid = insert_test_user(&pool, "a@example.com").await;

    let updated = update_user(
        &pool,
        uid,
        &UserUpdate {
            name: Some("Renamed".to_string()),
            phone: Some(Some("010-1234-5678".to_string())),
        },
    )
    .await
    .expect("update")
    .expect("row");
    assert_eq!(updated.name, "Renamed");
    assert_eq!(updated.phone.as_deref(), Some("010-1234-5678"));

    let cleared = update_user(
        &pool,
        uid,
        &UserUpdate {
            name: None,
            phone: Some(None),
        },
    )
    .await
    .expect("update")
    .expect("row");
    assert_eq!(cleared.name, "Renamed");
    assert!(cleared.phone.is_none());

    assert!(update_user(&pool, Uuid::new_v4(), &UserUpdate::default())
        .await
        .expect("update")
        .is_none());
}

#[sqlx::test(migrations = "../../migrations")]
async fn sessions_resolve_until_expired_or_deleted(pool: sqlx::PgPool) {
    let uid = insert_test_user(&pool, "s@example.com").await;

    create_session(&pool, "live", uid, Utc::now() + Duration::hours(1))
        .await
        .expect("create live");
    create_session(&pool, "stale", uid, Utc::now() - Duration::hours(1))
        .await
        .expect("create stale");

    let live = find_session_user(&pool, "live").await.expect("find");
    assert_eq!(live.map(|s| s.uid), Some(uid));
    assert!(find_session_user(&pool, "stale").await.expect("find").is_none());

    assert_eq!(purge_expired_sessions(&pool).await.expect("purge"), 1);

    assert!(delete_session(&pool, "live").await.expect("delete"));
    assert!(!delete_session(&pool, "live").await.expect("delete again"));
    assert!(find_session_user(&pool, "live").await.expect("find").is_none());
    assert!(get_user(&pool, uid).await.expect("get").is_some());
}

// ---------------------------------------------------------------------------
// Section 2: Emergency contacts
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn contacts_are_scoped_to_their_owner(pool: sqlx::PgPool) {
    let owner = insert_test_user(&pool, "owner@example.com").await;
    let other = insert_test_user(&pool, "other@example.com").await;

    let contact = insert_contact(
        &pool,
        owner,
        &NewContact {
            name: "Mom",
            phone: "010-0000-0000",
            relation: Some("family"),
        },
    )
    .await
    .expect("insert");

    assert_eq!(list_contacts(&pool, owner).await.expect("list").len(), 1);
    assert!(list_contacts(&pool, other).await.expect("list").is_empty());

    let err = delete_contact(&pool, other, contact.id).await.unwrap_err();
    assert!(matches!(err, DbError::NotFound));

    delete_contact(&pool, owner, contact.id).await.expect("delete");
    assert!(list_contacts(&pool, owner).await.expect("list").is_empty());
}

// ---------------------------------------------------------------------------
// Section 3: Reports, likes, comments
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn like_toggle_flips_per_user(pool: sqlx::PgPool) {
    let author = insert_test_user(&pool, "author@example.com").await;
    let fan = insert_test_user(&pool, "fan@example.com").await;
    let report = insert_test_report(&pool, author, None).await;

    let first = toggle_like(&pool, report, fan).await.expect("like");
    assert!(first.liked);
    assert_eq!(first.likes, 1);

    let second = toggle_like(&pool, report, author).await.expect("like");
    assert_eq!(second.likes, 2);

    let undo = toggle_like(&pool, report, fan).await.expect("unlike");
    assert!(!undo.liked);
    assert_eq!(undo.likes, 1);

    let missing = toggle_like(&pool, Uuid::new_v4(), fan).await.unwrap_err();
    assert!(matches!(missing, DbError::NotFound));
}

#[sqlx::test(migrations = "../../migrations")]
async fn comments_are_ordered_and_counted(pool: sqlx::PgPool) {
    let uid = insert_test_user(&pool, "c@example.com").await;
    let report = insert_test_report(&pool, uid, None).await;

    for content in ["first", "second"] {
        insert_comment(
            &pool,
            &NewComment {
                report_id: report,
                uid,
                author_name: "Test User",
                content,
            },
        )
        .await
        .expect("insert comment");
    }

    let comments = list_comments(&pool, report).await.expect("list");
    let contents: Vec<_> = comments.iter().map(|c| c.content.as_str()).collect();
    assert_eq!(contents, vec!["first", "second"]);

    let row = get_report(&pool, report).await.expect("get").expect("row");
    assert_eq!(row.comment_count, 2);

    let err = insert_comment(
        &pool,
        &NewComment {
            report_id: Uuid::new_v4(),
            uid,
            author_name: "Test User",
            content: "orphan",
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, DbError::NotFound));
}

#[sqlx::test(migrations = "../../migrations")]
async fn report_update_and_delete(pool: sqlx::PgPool) {
    let uid = insert_test_user(&pool, "r@example.com").await;
    let report = insert_test_report(&pool, uid, None).await;

    let updated = update_report(
        &pool,
        report,
        &ReportUpdate {
            report_type: Some(ReportType::Safe),
            content: Some("Fixed yesterday".to_string()),
            ..ReportUpdate::default()
        },
    )
    .await
    .expect("update");
    assert_eq!(updated.report_type, "safe");
    assert_eq!(updated.title, "Broken streetlight");
    assert_eq!(updated.content, "Fixed yesterday");

    assert_eq!(list_reports(&pool, 10).await.expect("list").len(), 1);
    delete_report(&pool, report).await.expect("delete");
    assert!(matches!(
        delete_report(&pool, report).await.unwrap_err(),
        DbError::NotFound
    ));
}

#[sqlx::test(migrations = "../../migrations")]
async fn located_reports_are_filtered_by_box(pool: sqlx::PgPool) {
    let uid = insert_test_user(&pool, "geo@example.com").await;
    insert_test_report(&pool, uid, Some(Coordinate::new(37.566, 126.978))).await;
    insert_test_report(&pool, uid, Some(Coordinate::new(35.1, 129.0))).await;
    insert_test_report(&pool, uid, None).await;

    let inside = list_report_coordinates_within(
        &pool,
        Coordinate::new(37.5, 126.9),
        Coordinate::new(37.6, 127.0),
    )
    .await
    .expect("query");

    assert_eq!(inside, vec![Coordinate::new(37.566, 126.978)]);
}

// ---------------------------------------------------------------------------
// Section 4: Navigation history
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn history_lists_newest_first_and_deletes(pool: sqlx::PgPool) {
    let uid = insert_test_user(&pool, "h@example.com").await;
    let other = insert_test_user(&pool, "h2@example.com").await;

    let mut ids = Vec::new();
    for end in ["Seoul Station", "City Hall"] {
        let row = insert_history(
            &pool,
            uid,
            &NewHistoryEntry {
                start_label: "Home",
                end_label: end,
                score: 78,
                distance: "1.2km",
                time: "18min",
            },
        )
        .await
        .expect("insert");
        ids.push(row.id);
    }

    let rows = list_history(&pool, uid).await.expect("list");
    assert_eq!(rows.len(), 2);
    assert!(rows[0].created_at >= rows[1].created_at);

    assert!(matches!(
        delete_history_entry(&pool, other, ids[0]).await.unwrap_err(),
        DbError::NotFound
    ));
    delete_history_entry(&pool, uid, ids[0]).await.expect("delete");
    assert_eq!(clear_history(&pool, uid).await.expect("clear"), 1);
    assert!(list_history(&pool, uid).await.expect("list").is_empty());
}
