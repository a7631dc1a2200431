//! Invoice lifecycle rules - status changes, lateness, and deletion guards.
//!
//! These are decisions only. Counts and lookups are supplied by the caller, so
//! every function here is deterministic and safe to call from any thread.

use crate::{
    core::status::InvoiceStatus,
    entities::invoice,
    errors::{Error, Result},
};
use chrono::NaiveDate;

/// Returns the invoice with `status` set to `new_status`, all other fields unchanged.
pub fn apply_status_change(
    invoice: &invoice::Model,
    new_status: InvoiceStatus,
) -> Result<invoice::Model> {
    if !invoice.status.can_transition_to(new_status) {
        return Err(Error::Transition {
            from: invoice.status,
            to: new_status,
        });
    }
    Ok(invoice::Model {
        status: new_status,
        ..invoice.clone()
    })
}

/// Whether the invoice is late as of `as_of`.
///
/// Drafts, paid and cancelled invoices are never late. For `sent` and `overdue`
/// the answer is `as_of > due_date`; the stored status is not consulted beyond that.
#[must_use]
pub fn is_overdue(invoice: &invoice::Model, as_of: NaiveDate) -> bool {
    match invoice.status {
        InvoiceStatus::Draft | InvoiceStatus::Paid | InvoiceStatus::Cancelled => false,
        InvoiceStatus::Sent | InvoiceStatus::Overdue => as_of > invoice.due_date,
    }
}

/// Whether a late invoice should be moved to the `overdue` status.
#[must_use]
pub fn needs_overdue_flag(invoice: &invoice::Model, as_of: NaiveDate) -> bool {
    invoice.status == InvoiceStatus::Sent && is_overdue(invoice, as_of)
}

/// A client may be deleted only when no live invoice references it.
#[must_use]
pub const fn can_delete_client(_client_id: i64, live_invoice_count: u64) -> bool {
    live_invoice_count == 0
}

/// Returns [`Error::ClientHasInvoices`] carrying the count when deletion is blocked.
pub fn ensure_client_deletable(client_id: i64, live_invoice_count: u64) -> Result<()> {
    if can_delete_client(client_id, live_invoice_count) {
        Ok(())
    } else {
        Err(Error::ClientHasInvoices {
            client_id,
            count: live_invoice_count,
        })
    }
}

/// Paid invoices are never deleted; every other status may be.
#[must_use]
pub fn can_delete_invoice(status: InvoiceStatus) -> bool {
    status != InvoiceStatus::Paid
}

/// Returns [`Error::InvoicePaid`] when the invoice may not be deleted.
pub fn ensure_invoice_deletable(invoice: &invoice::Model) -> Result<()> {
    if can_delete_invoice(invoice.status) {
        Ok(())
    } else {
        Err(Error::InvoicePaid {
            invoice_id: invoice.id,
        })
    }
}
