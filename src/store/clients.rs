//! Client persistence - create, look up, patch, list, and guarded deletion.
//!
//! Deletion counts live invoices and soft-deletes the client inside one
//! transaction, so an invoice cannot be attached between the check and the write.

use crate::{
    core::{
        client::{ClientDraft, ClientPatch, apply_client_patch, validate_client, validate_client_patch},
        lifecycle::ensure_client_deletable,
    },
    entities::{Client, Invoice, client, invoice},
    errors::{Error, Result},
    store::{Page, Paginated, fetch_page, is_unique_violation},
};
use chrono::Utc;
use sea_orm::{Condition, QueryOrder, Set, TransactionTrait, prelude::*};
use tracing::{debug, info};

fn map_email_conflict(err: DbErr) -> Error {
    if is_unique_violation(&err) {
        Error::validation("email", "is already registered to another client")
    } else {
        err.into()
    }
}

/// Creates a new client after validating the payload.
///
/// # Errors
/// Returns an error if:
/// - A field fails validation
/// - The email is already used by another client (including deleted ones)
/// - The database insert fails
pub async fn create_client(db: &DatabaseConnection, draft: &ClientDraft) -> Result<client::Model> {
    let draft = draft.trimmed();
    validate_client(&draft)?;

    let now = Utc::now();
    let client = client::ActiveModel {
        name: Set(draft.name),
        email: Set(draft.email),
        phone: Set(draft.phone),
        address: Set(draft.address),
        is_deleted: Set(false),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    let client = client.insert(db).await.map_err(map_email_conflict)?;
    info!(client_id = client.id, "Created client {}", client.name);
    Ok(client)
}

/// Loads a client by id. Soft-deleted clients count as missing unless
/// `include_deleted` is set.
///
/// # Errors
/// Returns [`Error::NotFound`] if no matching client exists.
pub async fn find_client<C>(db: &C, client_id: i64, include_deleted: bool) -> Result<client::Model>
where
    C: ConnectionTrait,
{
    Client::find_by_id(client_id)
        .one(db)
        .await?
        .filter(|c| include_deleted || !c.is_deleted)
        .ok_or_else(|| Error::not_found("Client", client_id))
}

/// Lists clients ordered by name, optionally filtered by a name/email substring.
pub async fn list_clients(
    db: &DatabaseConnection,
    search: Option<&str>,
    page: Page,
    include_deleted: bool,
) -> Result<Paginated<client::Model>> {
    let mut query = Client::find();
    if !include_deleted {
        query = query.filter(client::Column::IsDeleted.eq(false));
    }
    if let Some(term) = search.map(str::trim).filter(|t| !t.is_empty()) {
        query = query.filter(
            Condition::any()
                .add(client::Column::Name.contains(term))
                .add(client::Column::Email.contains(term)),
        );
    }
    let query = query
        .order_by_asc(client::Column::Name)
        .order_by_asc(client::Column::Id);
    fetch_page(db, query, page).await
}

/// Applies a partial update to a live client.
///
/// Empty strings in the patch are ignored rather than clearing fields.
///
/// # Errors
/// Returns an error if:
/// - A supplied field fails validation
/// - The client does not exist or is deleted
/// - The new email is already taken
pub async fn update_client(
    db: &DatabaseConnection,
    client_id: i64,
    patch: &ClientPatch,
) -> Result<client::Model> {
    validate_client_patch(patch)?;

    let existing = find_client(db, client_id, false).await?;
    if patch.is_empty() {
        debug!(client_id, "Empty client patch, nothing to update");
        return Ok(existing);
    }

    let updated = apply_client_patch(&existing, patch);
    let mut active: client::ActiveModel = existing.into();
    active.name = Set(updated.name);
    active.email = Set(updated.email);
    active.phone = Set(updated.phone);
    active.address = Set(updated.address);
    active.updated_at = Set(Utc::now());

    active.update(db).await.map_err(map_email_conflict)
}

/// Counts invoices that reference the client and are not soft-deleted.
pub async fn count_live_invoices_for_client<C>(db: &C, client_id: i64) -> Result<u64>
where
    C: ConnectionTrait,
{
    Invoice::find()
        .filter(invoice::Column::ClientId.eq(client_id))
        .filter(invoice::Column::IsDeleted.eq(false))
        .count(db)
        .await
        .map_err(Into::into)
}

/// Soft-deletes a client that has no live invoices.
///
/// # Errors
/// Returns an error if:
/// - The client does not exist or is already deleted
/// - At least one live invoice references the client
/// - The database update fails
pub async fn delete_client(db: &DatabaseConnection, client_id: i64) -> Result<client::Model> {
    let txn = db.begin().await?;

    let existing = find_client(&txn, client_id, false).await?;
    let live_invoices = count_live_invoices_for_client(&txn, client_id).await?;
    ensure_client_deletable(client_id, live_invoices)?;

    let mut active: client::ActiveModel = existing.into();
    active.is_deleted = Set(true);
    active.updated_at = Set(Utc::now());
    let deleted = active.update(&txn).await?;

    txn.commit().await?;
    info!(client_id, "Deleted client");
    Ok(deleted)
}
