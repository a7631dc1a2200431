//! Persistence layer - `SeaORM` reads and writes around the core rules.
//!
//! Every function takes its connection explicitly; there is no shared global
//! handle. Sequences that count and then write (numbering, deletion guards) run
//! inside a database transaction, and unique indexes catch whatever slips past.

/// Catalog categories and products
pub mod catalog;
/// Client persistence and the client deletion guard
pub mod clients;
/// Invoice persistence, numbering, and the overdue sweep
pub mod invoices;

use crate::{config::PaginationSettings, errors::Result};
use sea_orm::{DatabaseConnection, DbErr, EntityTrait, PaginatorTrait, Select, SqlErr};

/// One-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    /// One-based page number
    pub page: u64,
    /// Maximum items per page
    pub limit: u64,
}

impl Page {
    /// Builds a page from optional request values, clamping the limit to the
    /// configured maximum and the page number to at least 1.
    #[must_use]
    pub fn resolve(page: Option<u64>, limit: Option<u64>, settings: &PaginationSettings) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            limit: limit
                .unwrap_or(settings.default_limit)
                .clamp(1, settings.max_limit.max(1)),
        }
    }

    /// First page with the given size.
    #[must_use]
    pub const fn first(limit: u64) -> Self {
        Self { page: 1, limit }
    }
}

/// A page of results together with the unpaged total.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paginated<T> {
    /// Items on this page
    pub items: Vec<T>,
    /// One-based page number
    pub page: u64,
    /// Page size that was applied
    pub limit: u64,
    /// Items across all pages
    pub total: u64,
}

pub(crate) async fn fetch_page<E>(
    db: &DatabaseConnection,
    select: Select<E>,
    page: Page,
) -> Result<Paginated<E::Model>>
where
    E: EntityTrait,
    E::Model: Sync + 'static,
{
    let paginator = select.paginate(db, page.limit);
    let total = paginator.num_items().await?;
    let items = paginator.fetch_page(page.page.saturating_sub(1)).await?;
    Ok(Paginated {
        items,
        page: page.page,
        limit: page.limit,
        total,
    })
}

pub(crate) fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}
