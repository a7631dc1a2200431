//! Invoice payload validation and partial updates.
//!
//! Create validation checks, in order and stopping at the first failure:
//! client reference, amount, description length, then date ordering. Update
//! validation applies the same rules only to what a patch supplies.

use crate::{
    core::status::InvoiceStatus,
    entities::invoice,
    errors::{Error, Result},
};
use chrono::{Days, NaiveDate};
use rust_decimal::Decimal;

/// Longest invoice description, in characters
pub const MAX_DESCRIPTION_LEN: usize = 500;
/// Amounts are stored as REAL on `SQLite`; four decimals round-trip exactly.
pub const MAX_AMOUNT_SCALE: u32 = 4;

/// Payload for creating an invoice. Client existence is checked by the store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InvoiceDraft {
    /// Owning client; must exist and not be deleted
    pub client_id: i64,
    /// Amount billed, greater than zero
    pub amount: Decimal,
    /// Defaults to `draft` when not supplied
    pub status: Option<InvoiceStatus>,
    /// Defaults to the current date
    pub issue_date: Option<NaiveDate>,
    /// Defaults to the issue date plus the payment terms
    pub due_date: Option<NaiveDate>,
    /// Optional free text
    pub description: Option<String>,
}

/// Partial update for an invoice. `number` and `client_id` are not patchable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InvoicePatch {
    /// New amount, greater than zero
    pub amount: Option<Decimal>,
    /// Target status; must be a legal transition
    pub status: Option<InvoiceStatus>,
    /// New issue date; the number keeps its original date
    pub issue_date: Option<NaiveDate>,
    /// New due date
    pub due_date: Option<NaiveDate>,
    /// An empty string is treated as not supplied and never clears the description
    pub description: Option<String>,
}

fn check_amount(amount: Decimal) -> Result<()> {
    if amount <= Decimal::ZERO {
        return Err(Error::validation("amount", "must be greater than zero"));
    }
    if amount.normalize().scale() > MAX_AMOUNT_SCALE {
        return Err(Error::validation(
            "amount",
            format!("must have at most {MAX_AMOUNT_SCALE} decimal places"),
        ));
    }
    Ok(())
}

fn check_description(description: &str) -> Result<()> {
    if description.chars().count() > MAX_DESCRIPTION_LEN {
        return Err(Error::validation(
            "description",
            format!("must be at most {MAX_DESCRIPTION_LEN} characters"),
        ));
    }
    Ok(())
}

fn check_dates(issue_date: NaiveDate, due_date: NaiveDate) -> Result<()> {
    if due_date < issue_date {
        return Err(Error::validation(
            "due_date",
            format!("{due_date} is before issue date {issue_date}"),
        ));
    }
    Ok(())
}

/// Validates a create payload.
pub fn validate_for_create(draft: &InvoiceDraft) -> Result<()> {
    if draft.client_id <= 0 {
        return Err(Error::validation("client_id", "a client reference is required"));
    }
    check_amount(draft.amount)?;
    if let Some(description) = &draft.description {
        check_description(description)?;
    }
    if let (Some(issue_date), Some(due_date)) = (draft.issue_date, draft.due_date) {
        check_dates(issue_date, due_date)?;
    }
    Ok(())
}

/// Validates the fields a patch supplies against the existing invoice.
///
/// Dates are checked only when the patch touches one of them; the untouched
/// date is taken from `existing`.
pub fn validate_for_update(existing: &invoice::Model, patch: &InvoicePatch) -> Result<()> {
    if let Some(amount) = patch.amount {
        check_amount(amount)?;
    }
    if let Some(description) = &patch.description {
        check_description(description)?;
    }
    if patch.issue_date.is_some() || patch.due_date.is_some() {
        check_dates(
            patch.issue_date.unwrap_or(existing.issue_date),
            patch.due_date.unwrap_or(existing.due_date),
        )?;
    }
    Ok(())
}

/// Validates and merges a patch, routing a status change through the transition guard.
pub fn apply_invoice_patch(
    existing: &invoice::Model,
    patch: &InvoicePatch,
) -> Result<invoice::Model> {
    validate_for_update(existing, patch)?;

    let mut updated = match patch.status {
        Some(status) => crate::core::lifecycle::apply_status_change(existing, status)?,
        None => existing.clone(),
    };
    if let Some(amount) = patch.amount {
        updated.amount = amount;
    }
    if let Some(issue_date) = patch.issue_date {
        updated.issue_date = issue_date;
    }
    if let Some(due_date) = patch.due_date {
        updated.due_date = due_date;
    }
    if let Some(description) = patch.description.as_deref().filter(|d| !d.is_empty()) {
        updated.description = Some(description.to_string());
    }
    Ok(updated)
}

/// Fills in missing dates: issue defaults to `today`, due defaults to issue plus
/// the payment terms.
#[must_use]
pub fn resolve_dates(
    draft: &InvoiceDraft,
    today: NaiveDate,
    payment_terms_days: u32,
) -> (NaiveDate, NaiveDate) {
    let issue_date = draft.issue_date.unwrap_or(today);
    let due_date = draft.due_date.unwrap_or_else(|| {
        issue_date
            .checked_add_days(Days::new(u64::from(payment_terms_days)))
            .unwrap_or(issue_date)
    });
    (issue_date, due_date)
}
