//! Invoice persistence - numbering, guarded updates, deletion, listing, and the
//! overdue sweep.
//!
//! Invoice creation reads the highest sequence already issued for the day and
//! inserts the next number in a single transaction. If two writers still pick the same number, the unique
//! index on `invoices.number` rejects the second insert and the caller receives
//! [`Error::ConcurrencyConflict`]; [`create_invoice_with_retry`] re-runs the whole
//! sequence a bounded number of times.

use crate::{
    config::InvoiceSettings,
    core::{
        invoice::{InvoiceDraft, InvoicePatch, apply_invoice_patch, resolve_dates, validate_for_create},
        lifecycle::{apply_status_change, ensure_invoice_deletable, is_overdue, needs_overdue_flag},
        numbering::{generate_number_with_prefix, number_stem, parse_number},
        status::InvoiceStatus,
    },
    entities::{Invoice, invoice},
    errors::{Error, Result},
    store::{Page, Paginated, clients::find_client, fetch_page, is_unique_violation},
};
use chrono::{NaiveDate, Utc};
use sea_orm::{QueryOrder, QuerySelect, Set, TransactionTrait, prelude::*};
use tracing::{debug, info, warn};

/// Optional filters for [`list_invoices`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InvoiceFilter {
    /// Only invoices of this client
    pub client_id: Option<i64>,
    /// Only invoices in this status
    pub status: Option<InvoiceStatus>,
}

/// One invoice moved to `overdue` by [`flag_overdue_invoices`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlaggedInvoice {
    /// Invoice that changed
    pub invoice_id: i64,
    /// Its number
    pub number: String,
    /// Owning client
    pub client_id: i64,
    /// Due date it missed
    pub due_date: NaiveDate,
    /// Whole days between the due date and the sweep date
    pub days_late: i64,
}

/// Represents the result of one overdue sweep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverdueSweepResult {
    /// Date the sweep compared due dates against
    pub as_of: NaiveDate,
    /// Invoices whose status changed from `sent` to `overdue`
    pub flagged: Vec<FlaggedInvoice>,
    /// Late invoices that were already marked overdue
    pub already_overdue: usize,
}

fn map_number_conflict(err: DbErr, number: &str) -> Error {
    if is_unique_violation(&err) {
        Error::ConcurrencyConflict {
            message: format!("invoice number {number} was taken by a concurrent insert"),
        }
    } else {
        err.into()
    }
}

/// Loads a live invoice by id.
///
/// # Errors
/// Returns [`Error::NotFound`] if the invoice does not exist or is soft-deleted.
pub async fn find_invoice<C>(db: &C, invoice_id: i64) -> Result<invoice::Model>
where
    C: ConnectionTrait,
{
    Invoice::find_by_id(invoice_id)
        .one(db)
        .await?
        .filter(|i| !i.is_deleted)
        .ok_or_else(|| Error::not_found("Invoice", invoice_id))
}

/// Looks up a live invoice by its number.
pub async fn find_invoice_by_number(
    db: &DatabaseConnection,
    number: &str,
) -> Result<Option<invoice::Model>> {
    Invoice::find()
        .filter(invoice::Column::Number.eq(number))
        .filter(invoice::Column::IsDeleted.eq(false))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Number of invoices already numbered for `issue_date` under `prefix`.
///
/// This is read from the stored numbers, not from the `issue_date` column:
/// a number never changes once assigned, while an issue date may be edited
/// later. Soft-deleted invoices keep their numbers and are included. The
/// result is the highest sequence found, so a gap never hands out a number twice.
pub async fn count_invoices_issued_on<C>(db: &C, prefix: &str, issue_date: NaiveDate) -> Result<u64>
where
    C: ConnectionTrait,
{
    let stem = number_stem(prefix, issue_date);
    let numbers: Vec<String> = Invoice::find()
        .select_only()
        .column(invoice::Column::Number)
        .filter(invoice::Column::Number.starts_with(stem.as_str()))
        .into_tuple()
        .all(db)
        .await?;

    // LIKE is case-insensitive and treats `_` as a wildcard, so re-check each match.
    Ok(numbers
        .iter()
        .filter_map(|number| parse_number(number))
        .filter(|parsed| parsed.prefix == prefix && parsed.issue_date == issue_date)
        .map(|parsed| parsed.sequence)
        .max()
        .unwrap_or(0))
}

/// Creates an invoice with a freshly generated number.
///
/// Missing dates are filled from today and the configured payment terms before
/// validation. The status defaults to `draft`.
///
/// # Errors
/// Returns an error if:
/// - The payload fails validation
/// - The client does not exist or is deleted
/// - Another writer claimed the same number ([`Error::ConcurrencyConflict`])
/// - The database operation fails
pub async fn create_invoice(
    db: &DatabaseConnection,
    settings: &InvoiceSettings,
    draft: &InvoiceDraft,
) -> Result<invoice::Model> {
    let (issue_date, due_date) =
        resolve_dates(draft, Utc::now().date_naive(), settings.payment_terms_days);
    let resolved = InvoiceDraft {
        issue_date: Some(issue_date),
        due_date: Some(due_date),
        ..draft.clone()
    };
    validate_for_create(&resolved)?;

    let txn = db.begin().await?;

    find_client(&txn, draft.client_id, false).await?;
    let same_day = count_invoices_issued_on(&txn, &settings.number_prefix, issue_date).await?;
    let number = generate_number_with_prefix(&settings.number_prefix, issue_date, same_day);

    let now = Utc::now();
    let invoice = invoice::ActiveModel {
        number: Set(number.clone()),
        client_id: Set(draft.client_id),
        amount: Set(draft.amount),
        status: Set(draft.status.unwrap_or_default()),
        issue_date: Set(issue_date),
        due_date: Set(due_date),
        description: Set(draft.description.clone().filter(|d| !d.is_empty())),
        is_deleted: Set(false),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    let invoice = invoice
        .insert(&txn)
        .await
        .map_err(|e| map_number_conflict(e, &number))?;

    txn.commit().await?;
    info!(
        invoice_id = invoice.id,
        client_id = invoice.client_id,
        "Created invoice {}",
        invoice.number
    );
    Ok(invoice)
}

/// Runs [`create_invoice`], re-running it after a numbering conflict up to
/// `settings.max_number_retries` times.
pub async fn create_invoice_with_retry(
    db: &DatabaseConnection,
    settings: &InvoiceSettings,
    draft: &InvoiceDraft,
) -> Result<invoice::Model> {
    let mut attempt = 0;
    loop {
        match create_invoice(db, settings, draft).await {
            Err(err) if err.is_retryable() && attempt < settings.max_number_retries => {
                attempt += 1;
                warn!(attempt, "Retrying invoice creation: {err}");
            }
            result => return result,
        }
    }
}

async fn save_invoice<C>(db: &C, updated: invoice::Model) -> Result<invoice::Model>
where
    C: ConnectionTrait,
{
    let mut active: invoice::ActiveModel = updated.clone().into();
    active.amount = Set(updated.amount);
    active.status = Set(updated.status);
    active.issue_date = Set(updated.issue_date);
    active.due_date = Set(updated.due_date);
    active.description = Set(updated.description);
    active.updated_at = Set(Utc::now());
    active.update(db).await.map_err(Into::into)
}

/// Applies a partial update to a live invoice.
///
/// A status in the patch must be a legal transition from the stored status.
///
/// # Errors
/// Returns an error if:
/// - The invoice does not exist or is deleted
/// - A supplied field fails validation
/// - The status change is not allowed
pub async fn update_invoice(
    db: &DatabaseConnection,
    invoice_id: i64,
    patch: &InvoicePatch,
) -> Result<invoice::Model> {
    let txn = db.begin().await?;
    let existing = find_invoice(&txn, invoice_id).await?;
    let updated = apply_invoice_patch(&existing, patch)?;
    let saved = save_invoice(&txn, updated).await?;
    txn.commit().await?;

    debug!(invoice_id, "Updated invoice {}", saved.number);
    Ok(saved)
}

/// Moves a live invoice to `new_status` if the transition graph allows it.
pub async fn change_invoice_status(
    db: &DatabaseConnection,
    invoice_id: i64,
    new_status: InvoiceStatus,
) -> Result<invoice::Model> {
    let txn = db.begin().await?;
    let existing = find_invoice(&txn, invoice_id).await?;
    let from = existing.status;
    let updated = apply_status_change(&existing, new_status)?;
    let saved = save_invoice(&txn, updated).await?;
    txn.commit().await?;

    info!(invoice_id, %from, to = %new_status, "Changed invoice status");
    Ok(saved)
}

/// Soft-deletes an invoice unless it has been paid.
///
/// # Errors
/// Returns an error if:
/// - The invoice does not exist or is already deleted
/// - The invoice is paid
pub async fn delete_invoice(db: &DatabaseConnection, invoice_id: i64) -> Result<invoice::Model> {
    let txn = db.begin().await?;

    let existing = find_invoice(&txn, invoice_id).await?;
    ensure_invoice_deletable(&existing)?;

    let mut active: invoice::ActiveModel = existing.into();
    active.is_deleted = Set(true);
    active.updated_at = Set(Utc::now());
    let deleted = active.update(&txn).await?;

    txn.commit().await?;
    info!(invoice_id, "Deleted invoice {}", deleted.number);
    Ok(deleted)
}

/// Lists live invoices, newest issue date first.
pub async fn list_invoices(
    db: &DatabaseConnection,
    filter: InvoiceFilter,
    page: Page,
) -> Result<Paginated<invoice::Model>> {
    let mut query = Invoice::find().filter(invoice::Column::IsDeleted.eq(false));
    if let Some(client_id) = filter.client_id {
        query = query.filter(invoice::Column::ClientId.eq(client_id));
    }
    if let Some(status) = filter.status {
        query = query.filter(invoice::Column::Status.eq(status));
    }
    let query = query
        .order_by_desc(invoice::Column::IssueDate)
        .order_by_desc(invoice::Column::Id);
    fetch_page(db, query, page).await
}

/// Returns every live invoice of a client, oldest first.
///
/// The client itself may be soft-deleted; its history stays readable.
pub async fn invoices_for_client(
    db: &DatabaseConnection,
    client_id: i64,
) -> Result<Vec<invoice::Model>> {
    find_client(db, client_id, true).await?;
    Invoice::find()
        .filter(invoice::Column::ClientId.eq(client_id))
        .filter(invoice::Column::IsDeleted.eq(false))
        .order_by_asc(invoice::Column::IssueDate)
        .order_by_asc(invoice::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

async fn late_invoices_on<C>(db: &C, as_of: NaiveDate) -> Result<Vec<invoice::Model>>
where
    C: ConnectionTrait,
{
    let candidates = Invoice::find()
        .filter(invoice::Column::IsDeleted.eq(false))
        .filter(invoice::Column::Status.is_in([InvoiceStatus::Sent, InvoiceStatus::Overdue]))
        .filter(invoice::Column::DueDate.lt(as_of))
        .order_by_asc(invoice::Column::DueDate)
        .all(db)
        .await?;
    Ok(candidates
        .into_iter()
        .filter(|invoice| is_overdue(invoice, as_of))
        .collect())
}

/// Live invoices that are late as of `as_of`, earliest due date first.
pub async fn late_invoices(
    db: &DatabaseConnection,
    as_of: NaiveDate,
) -> Result<Vec<invoice::Model>> {
    late_invoices_on(db, as_of).await
}

/// Moves every late `sent` invoice to `overdue`.
///
/// All changes are made in one transaction: either every late invoice is
/// flagged or none is. Running the sweep twice for the same date flags nothing
/// the second time.
pub async fn flag_overdue_invoices(
    db: &DatabaseConnection,
    as_of: NaiveDate,
) -> Result<OverdueSweepResult> {
    let txn = db.begin().await?;

    let mut flagged = Vec::new();
    let mut already_overdue = 0;
    for invoice in late_invoices_on(&txn, as_of).await? {
        if !needs_overdue_flag(&invoice, as_of) {
            already_overdue += 1;
            continue;
        }
        let updated = apply_status_change(&invoice, InvoiceStatus::Overdue)?;
        let saved = save_invoice(&txn, updated).await?;
        flagged.push(FlaggedInvoice {
            invoice_id: saved.id,
            number: saved.number,
            client_id: saved.client_id,
            due_date: saved.due_date,
            days_late: (as_of - saved.due_date).num_days(),
        });
    }

    txn.commit().await?;

    Ok(OverdueSweepResult {
        as_of,
        flagged,
        already_overdue,
    })
}

/// Formats an overdue sweep result into a human-readable summary string.
#[must_use]
pub fn format_overdue_summary(result: &OverdueSweepResult) -> String {
    use std::fmt::Write;

    let mut summary = format!(
        "Overdue sweep - {} - Flagged {} invoice(s), {} already overdue\n",
        result.as_of.format("%Y-%m-%d"),
        result.flagged.len(),
        result.already_overdue
    );

    for flagged in &result.flagged {
        // Writing to a String cannot fail.
        let _ = writeln!(
            summary,
            "  {} (client {}) | due {} | {} day(s) late",
            flagged.number, flagged.client_id, flagged.due_date, flagged.days_late
        );
    }

    summary
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::{errors::ErrorKind, store::clients::delete_client, test_utils::*};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn draft(client_id: i64, issue_date: NaiveDate) -> InvoiceDraft {
        InvoiceDraft {
            client_id,
            amount: dec!(150),
            status: None,
            issue_date: Some(issue_date),
            due_date: None,
            description: Some("Consulting".to_string()),
        }
    }

    #[tokio::test]
    async fn test_create_invoice_validation_runs_before_database() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();

        let zero = InvoiceDraft {
            amount: Decimal::ZERO,
            ..draft(1, date(2024, 1, 15))
        };
        let err = create_invoice(&db, &test_settings(), &zero)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation { field: "amount", .. }));

        let backwards = InvoiceDraft {
            due_date: Some(date(2024, 1, 1)),
            ..draft(1, date(2024, 1, 15))
        };
        let err = create_invoice(&db, &test_settings(), &backwards)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Validation {
                field: "due_date",
                ..
            }
        ));

        Ok(())
    }

    #[tokio::test]
    async fn test_first_invoice_of_the_day_is_numbered_one() -> Result<()> {
        let (db, client) = setup_with_client().await?;

        let invoice = create_invoice(&db, &test_settings(), &draft(client.id, date(2024, 1, 15)))
            .await?;
        assert_eq!(invoice.number, "INV-20240115-1");
        assert_eq!(invoice.status, InvoiceStatus::Draft);
        assert_eq!(invoice.due_date, date(2024, 2, 14));

        Ok(())
    }

    #[tokio::test]
    async fn test_numbering_counts_per_issue_date() -> Result<()> {
        let (db, client) = setup_with_client().await?;
        let settings = test_settings();

        for expected in ["INV-20240115-1", "INV-20240115-2", "INV-20240115-3"] {
            let invoice = create_invoice(&db, &settings, &draft(client.id, date(2024, 1, 15))).await?;
            assert_eq!(invoice.number, expected);
        }
        let next_day = create_invoice(&db, &settings, &draft(client.id, date(2024, 1, 16))).await?;
        assert_eq!(next_day.number, "INV-20240116-1");

        Ok(())
    }

    #[tokio::test]
    async fn test_deleted_invoices_still_advance_the_sequence() -> Result<()> {
        let (db, client) = setup_with_client().await?;
        let settings = test_settings();

        let first = create_invoice(&db, &settings, &draft(client.id, date(2024, 1, 15))).await?;
        delete_invoice(&db, first.id).await?;

        let second = create_invoice(&db, &settings, &draft(client.id, date(2024, 1, 15))).await?;
        assert_eq!(second.number, "INV-20240115-2");

        Ok(())
    }

    #[tokio::test]
    async fn test_custom_prefix() -> Result<()> {
        let (db, client) = setup_with_client().await?;
        let settings = InvoiceSettings {
            number_prefix: "FAC".to_string(),
            ..test_settings()
        };

        let invoice = create_invoice(&db, &settings, &draft(client.id, date(2024, 3, 1))).await?;
        assert_eq!(invoice.number, "FAC-20240301-1");

        Ok(())
    }

    #[tokio::test]
    async fn test_create_invoice_requires_live_client() -> Result<()> {
        let (db, client) = setup_with_client().await?;

        let err = create_invoice(&db, &test_settings(), &draft(999, date(2024, 1, 15)))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        delete_client(&db, client.id).await?;
        let err = create_invoice(&db, &test_settings(), &draft(client.id, date(2024, 1, 15)))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        Ok(())
    }

    async fn insert_raw_invoice(
        db: &DatabaseConnection,
        client_id: i64,
        number: &str,
        issue_date: NaiveDate,
    ) -> std::result::Result<invoice::Model, DbErr> {
        let now = Utc::now();
        invoice::ActiveModel {
            number: Set(number.to_string()),
            client_id: Set(client_id),
            amount: Set(dec!(10)),
            status: Set(InvoiceStatus::Draft),
            issue_date: Set(issue_date),
            due_date: Set(issue_date),
            description: Set(None),
            is_deleted: Set(false),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(db)
        .await
    }

    #[tokio::test]
    async fn test_number_held_by_another_date_is_skipped() -> Result<()> {
        let (db, client) = setup_with_client().await?;

        // A row dated the 14th already holds the first number of the 15th.
        insert_raw_invoice(&db, client.id, "INV-20240115-1", date(2024, 1, 14)).await?;

        let invoice = create_invoice(&db, &test_settings(), &draft(client.id, date(2024, 1, 15)))
            .await?;
        assert_eq!(invoice.number, "INV-20240115-2");

        Ok(())
    }

    #[tokio::test]
    async fn test_moving_issue_date_keeps_numbering_usable() -> Result<()> {
        init_test_tracing();
        let (db, client) = setup_with_client().await?;
        let settings = test_settings();

        let first = create_invoice(&db, &settings, &draft(client.id, date(2024, 1, 15))).await?;
        let second = create_invoice(&db, &settings, &draft(client.id, date(2024, 1, 15))).await?;
        assert_eq!(second.number, "INV-20240115-2");

        let patch = InvoicePatch {
            issue_date: Some(date(2024, 1, 10)),
            ..InvoicePatch::default()
        };
        let moved = update_invoice(&db, first.id, &patch).await?;
        assert_eq!(moved.number, "INV-20240115-1");
        assert_eq!(moved.issue_date, date(2024, 1, 10));

        let third =
            create_invoice_with_retry(&db, &settings, &draft(client.id, date(2024, 1, 15))).await?;
        assert_eq!(third.number, "INV-20240115-3");

        let earlier =
            create_invoice_with_retry(&db, &settings, &draft(client.id, date(2024, 1, 10))).await?;
        assert_eq!(earlier.number, "INV-20240110-1");

        Ok(())
    }

    #[tokio::test]
    async fn test_count_reads_sequence_from_numbers() -> Result<()> {
        let (db, client) = setup_with_client().await?;
        let issue_date = date(2024, 1, 15);

        assert_eq!(count_invoices_issued_on(&db, "INV", issue_date).await?, 0);

        insert_raw_invoice(&db, client.id, "INV-20240115-4", issue_date).await?;
        insert_raw_invoice(&db, client.id, "INV-20240115-10", issue_date).await?;
        insert_raw_invoice(&db, client.id, "FAC-20240115-7", issue_date).await?;
        insert_raw_invoice(&db, client.id, "INV-20240116-20", issue_date).await?;

        assert_eq!(count_invoices_issued_on(&db, "INV", issue_date).await?, 10);
        assert_eq!(count_invoices_issued_on(&db, "FAC", issue_date).await?, 7);
        assert_eq!(count_invoices_issued_on(&db, "INV", date(2024, 1, 16)).await?, 20);

        Ok(())
    }

    #[tokio::test]
    async fn test_duplicate_number_maps_to_concurrency_conflict() -> Result<()> {
        let (db, client) = setup_with_client().await?;
        insert_raw_invoice(&db, client.id, "INV-20240115-1", date(2024, 1, 15)).await?;

        let db_err = insert_raw_invoice(&db, client.id, "INV-20240115-1", date(2024, 1, 15))
            .await
            .unwrap_err();
        let err = map_number_conflict(db_err, "INV-20240115-1");
        assert_eq!(err.kind(), ErrorKind::ConcurrencyConflict);
        assert!(err.is_retryable());

        let other = map_number_conflict(DbErr::Custom("disk full".to_string()), "INV-20240115-1");
        assert_eq!(other.kind(), ErrorKind::Database);

        Ok(())
    }

    #[tokio::test]
    async fn test_find_invoice_by_number() -> Result<()> {
        let (db, client) = setup_with_client().await?;
        let live = create_test_invoice(&db, client.id, dec!(100), date(2024, 1, 15)).await?;
        let removed = create_test_invoice(&db, client.id, dec!(100), date(2024, 1, 15)).await?;
        delete_invoice(&db, removed.id).await?;

        let found = find_invoice_by_number(&db, "INV-20240115-1").await?.unwrap();
        assert_eq!(found.id, live.id);

        assert!(find_invoice_by_number(&db, &removed.number).await?.is_none());
        assert!(find_invoice_by_number(&db, "INV-20991231-1").await?.is_none());

        Ok(())
    }

    #[tokio::test]
    async fn test_update_invoice_patch() -> Result<()> {
        let (db, client) = setup_with_client().await?;
        let invoice = create_test_invoice(&db, client.id, dec!(100), date(2024, 1, 15)).await?;

        let patch = InvoicePatch {
            amount: Some(dec!(250)),
            status: Some(InvoiceStatus::Sent),
            description: Some("Updated scope".to_string()),
            ..InvoicePatch::default()
        };
        let updated = update_invoice(&db, invoice.id, &patch).await?;
        assert_eq!(updated.amount, dec!(250));
        assert_eq!(updated.status, InvoiceStatus::Sent);
        assert_eq!(updated.number, invoice.number);

        let reloaded = find_invoice(&db, invoice.id).await?;
        assert_eq!(reloaded.description.as_deref(), Some("Updated scope"));
        assert_eq!(reloaded.status, InvoiceStatus::Sent);

        Ok(())
    }

    #[tokio::test]
    async fn test_update_invoice_rejects_bad_dates_and_amount() -> Result<()> {
        let (db, client) = setup_with_client().await?;
        let invoice = create_test_invoice(&db, client.id, dec!(100), date(2024, 1, 15)).await?;

        let patch = InvoicePatch {
            due_date: Some(date(2024, 1, 1)),
            ..InvoicePatch::default()
        };
        let err = update_invoice(&db, invoice.id, &patch).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let patch = InvoicePatch {
            amount: Some(Decimal::ZERO),
            ..InvoicePatch::default()
        };
        let err = update_invoice(&db, invoice.id, &patch).await.unwrap_err();
        assert!(matches!(err, Error::Validation { field: "amount", .. }));

        Ok(())
    }

    #[tokio::test]
    async fn test_status_changes_follow_the_graph() -> Result<()> {
        let (db, client) = setup_with_client().await?;
        let invoice = create_test_invoice(&db, client.id, dec!(100), date(2024, 1, 15)).await?;

        let err = change_invoice_status(&db, invoice.id, InvoiceStatus::Paid)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Transition {
                from: InvoiceStatus::Draft,
                to: InvoiceStatus::Paid
            }
        ));

        change_invoice_status(&db, invoice.id, InvoiceStatus::Sent).await?;
        let paid = change_invoice_status(&db, invoice.id, InvoiceStatus::Paid).await?;
        assert_eq!(paid.status, InvoiceStatus::Paid);

        let err = change_invoice_status(&db, invoice.id, InvoiceStatus::Sent)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Transition);
        assert_eq!(find_invoice(&db, invoice.id).await?.status, InvoiceStatus::Paid);

        Ok(())
    }

    #[tokio::test]
    async fn test_delete_invoice_guards() -> Result<()> {
        let (db, client) = setup_with_client().await?;
        let cancelled = create_custom_invoice(
            &db,
            client.id,
            InvoiceStatus::Cancelled,
            date(2024, 1, 15),
            date(2024, 2, 15),
        )
        .await?;
        let paid = create_custom_invoice(
            &db,
            client.id,
            InvoiceStatus::Paid,
            date(2024, 1, 15),
            date(2024, 2, 15),
        )
        .await?;

        assert!(delete_invoice(&db, cancelled.id).await?.is_deleted);
        assert_eq!(
            find_invoice(&db, cancelled.id).await.unwrap_err().kind(),
            ErrorKind::NotFound
        );

        let err = delete_invoice(&db, paid.id).await.unwrap_err();
        assert!(matches!(err, Error::InvoicePaid { .. }));
        assert_eq!(err.kind(), ErrorKind::ReferentialGuard);
        assert!(!find_invoice(&db, paid.id).await?.is_deleted);

        Ok(())
    }

    #[tokio::test]
    async fn test_list_invoices_filters() -> Result<()> {
        let (db, acme) = setup_with_client().await?;
        let globex = create_test_client(&db, "Globex", "ap@globex.test").await?;

        create_test_invoice(&db, acme.id, dec!(100), date(2024, 1, 15)).await?;
        let sent = create_test_invoice(&db, acme.id, dec!(200), date(2024, 1, 16)).await?;
        change_invoice_status(&db, sent.id, InvoiceStatus::Sent).await?;
        create_test_invoice(&db, globex.id, dec!(300), date(2024, 1, 17)).await?;

        let all = list_invoices(&db, InvoiceFilter::default(), Page::first(10)).await?;
        assert_eq!(all.total, 3);
        assert_eq!(all.items[0].number, "INV-20240117-1");

        let acme_only = InvoiceFilter {
            client_id: Some(acme.id),
            status: None,
        };
        assert_eq!(list_invoices(&db, acme_only, Page::first(10)).await?.total, 2);

        let sent_only = InvoiceFilter {
            client_id: None,
            status: Some(InvoiceStatus::Sent),
        };
        let page = list_invoices(&db, sent_only, Page::first(10)).await?;
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].id, sent.id);

        let history = invoices_for_client(&db, acme.id).await?;
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].issue_date, date(2024, 1, 15));

        Ok(())
    }

    #[tokio::test]
    async fn test_overdue_sweep_flags_late_sent_invoices() -> Result<()> {
        init_test_tracing();
        let (db, client) = setup_with_client().await?;
        let as_of = date(2024, 3, 10);

        let late_sent = create_custom_invoice(
            &db,
            client.id,
            InvoiceStatus::Sent,
            date(2024, 1, 15),
            date(2024, 3, 9),
        )
        .await?;
        let due_today = create_custom_invoice(
            &db,
            client.id,
            InvoiceStatus::Sent,
            date(2024, 1, 15),
            as_of,
        )
        .await?;
        let late_draft = create_custom_invoice(
            &db,
            client.id,
            InvoiceStatus::Draft,
            date(2024, 1, 15),
            date(2024, 2, 1),
        )
        .await?;
        let late_paid = create_custom_invoice(
            &db,
            client.id,
            InvoiceStatus::Paid,
            date(2024, 1, 15),
            date(2024, 2, 1),
        )
        .await?;
        let already = create_custom_invoice(
            &db,
            client.id,
            InvoiceStatus::Overdue,
            date(2024, 1, 15),
            date(2024, 2, 1),
        )
        .await?;

        let late = late_invoices(&db, as_of).await?;
        let late_ids: Vec<i64> = late.iter().map(|i| i.id).collect();
        assert_eq!(late_ids, vec![already.id, late_sent.id]);

        let result = flag_overdue_invoices(&db, as_of).await?;
        assert_eq!(result.flagged.len(), 1);
        assert_eq!(result.flagged[0].invoice_id, late_sent.id);
        assert_eq!(result.flagged[0].days_late, 1);
        assert_eq!(result.already_overdue, 1);

        assert_eq!(find_invoice(&db, late_sent.id).await?.status, InvoiceStatus::Overdue);
        assert_eq!(find_invoice(&db, due_today.id).await?.status, InvoiceStatus::Sent);
        assert_eq!(find_invoice(&db, late_draft.id).await?.status, InvoiceStatus::Draft);
        assert_eq!(find_invoice(&db, late_paid.id).await?.status, InvoiceStatus::Paid);

        let summary = format_overdue_summary(&result);
        assert!(summary.contains("Flagged 1 invoice(s), 1 already overdue"));
        assert!(summary.contains(&late_sent.number));

        let second = flag_overdue_invoices(&db, as_of).await?;
        assert!(second.flagged.is_empty());
        assert_eq!(second.already_overdue, 2);

        Ok(())
    }
}
