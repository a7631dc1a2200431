//! Unified error types for the billing engine.
//!
//! Every engine contract returns either a value or one of these errors. The engine
//! itself never logs or retries; callers inspect [`Error::kind`] to decide how to
//! present the failure and [`Error::is_retryable`] to decide whether to re-run a
//! read-decide-write sequence.

use crate::core::status::InvoiceStatus;
use sea_orm::DbErr;
use thiserror::Error;

/// Coarse classification of [`Error`] values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Input failed a static rule; the caller must correct it.
    Validation,
    /// Requested status change is not an edge of the transition graph.
    Transition,
    /// Deletion blocked by a dependent entity or by the entity's own state.
    ReferentialGuard,
    /// Referenced entity is missing or soft-deleted.
    NotFound,
    /// A storage-level uniqueness backstop fired; retry with a fresh read.
    ConcurrencyConflict,
    /// Application configuration could not be loaded or is invalid.
    Config,
    /// Any other database failure.
    Database,
}

/// Every failure the engine and its store can report.
#[derive(Debug, Error)]
pub enum Error {
    /// A field broke a static rule
    #[error("Invalid {field}: {message}")]
    Validation {
        /// Name of the offending field, e.g. `amount`
        field: &'static str,
        /// What the rule requires
        message: String,
    },

    /// The status change is not an edge of the transition graph
    #[error("Illegal status transition from {from} to {to}")]
    Transition {
        /// Status the invoice currently has
        from: InvoiceStatus,
        /// Status that was requested
        to: InvoiceStatus,
    },

    /// Client deletion refused while live invoices reference it
    #[error("Cannot delete client {client_id}: {count} live invoice(s) still reference it")]
    ClientHasInvoices {
        /// Client that was to be deleted
        client_id: i64,
        /// Number of live invoices still attached
        count: u64,
    },

    /// Paid invoices are never deleted
    #[error("Cannot delete invoice {invoice_id}: paid invoices are kept")]
    InvoicePaid {
        /// Invoice that was to be deleted
        invoice_id: i64,
    },

    /// Category deletion refused while children or products remain
    #[error(
        "Cannot delete category {category_id}: {children} child categories and {products} products remain"
    )]
    CategoryInUse {
        /// Category that was to be deleted
        category_id: i64,
        /// Live child categories
        children: u64,
        /// Live products listed under it
        products: u64,
    },

    /// The referenced entity is missing or soft-deleted
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Entity name, e.g. `Client`
        entity: &'static str,
        /// Identifier that was looked up
        id: String,
    },

    /// A unique index rejected a write another writer won; safe to retry
    #[error("Concurrent write conflict: {message}")]
    ConcurrencyConflict {
        /// Which value collided
        message: String,
    },

    /// Settings could not be read or are invalid
    #[error("Configuration error: {message}")]
    Config {
        /// What went wrong while loading
        message: String,
    },

    /// Any other database failure
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl Error {
    /// Builds a validation error for a named field.
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }

    /// Builds a not-found error for an entity identified by `id`.
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Classifies the error for callers that only care about its category.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation { .. } => ErrorKind::Validation,
            Self::Transition { .. } => ErrorKind::Transition,
            Self::ClientHasInvoices { .. }
            | Self::InvoicePaid { .. }
            | Self::CategoryInUse { .. } => ErrorKind::ReferentialGuard,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::ConcurrencyConflict { .. } => ErrorKind::ConcurrencyConflict,
            Self::Config { .. } => ErrorKind::Config,
            Self::Database(_) => ErrorKind::Database,
        }
    }

    /// Only a concurrency conflict may be retried, and only by re-running the
    /// whole read-decide-write sequence.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self.kind(), ErrorKind::ConcurrencyConflict)
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
