//! Optimistic removal for the contact and history screens.
//!
//! Rows leave the local list before the request goes out. When the server
//! refuses, the list is replaced by a fresh fetch; if that fetch fails too,
//! the list as it was before the removal is put back. Either way the
//! original error is returned for the screen to show.

use std::future::Future;

use uuid::Uuid;

use crate::api::ApiClient;
use crate::error::ClientError;
use crate::session::Session;
use crate::types::{EmergencyContact, HistoryEntry};

async fn reconcile<T, Fut>(
    list: &mut Vec<T>,
    previous: Vec<T>,
    error: ClientError,
    refetch: Fut,
) -> ClientError
where
    Fut: Future<Output = Result<Vec<T>, ClientError>>,
{
    tracing::warn!(error = %error, "delete rejected; refetching list");
    match refetch.await {
        Ok(fresh) => *list = fresh,
        Err(e) => {
            tracing::warn!(error = %e, "refetch failed; restoring previous list");
            *list = previous;
        }
    }
    error
}

/// Removes contact `id` from `contacts`, then deletes it on the server.
///
/// # Errors
///
/// The delete error, after `contacts` has been reconciled.
pub async fn remove_contact(
    api: &ApiClient,
    session: &Session,
    contacts: &mut Vec<EmergencyContact>,
    id: Uuid,
) -> Result<(), ClientError> {
    let previous = contacts.clone();
    contacts.retain(|c| c.id != id);

    match api.delete_contact(session, id).await {
        Ok(()) => Ok(()),
        Err(e) => Err(reconcile(contacts, previous, e, api.list_contacts(session)).await),
    }
}

/// Removes history entry `id` from `history`, then deletes it on the server.
///
/// # Errors
///
/// The delete error, after `history` has been reconciled.
pub async fn remove_history_entry(
    api: &ApiClient,
    session: &Session,
    history: &mut Vec<HistoryEntry>,
    id: Uuid,
) -> Result<(), ClientError> {
    let previous = history.clone();
    history.retain(|h| h.id != id);

    match api.delete_history_entry(session, id).await {
        Ok(()) => Ok(()),
        Err(e) => Err(reconcile(history, previous, e, api.list_history(session)).await),
    }
}

/// Empties `history`, then clears it on the server. Returns the server's
/// removed count.
///
/// # Errors
///
/// The clear error, after `history` has been reconciled.
pub async fn clear_history_list(
    api: &ApiClient,
    session: &Session,
    history: &mut Vec<HistoryEntry>,
) -> Result<u64, ClientError> {
    let previous = std::mem::take(history);

    match api.clear_history(session).await {
        Ok(cleared) => Ok(cleared),
        Err(e) => Err(reconcile(history, previous, e, api.list_history(session)).await),
    }
}
