//! Invoice entity - A bill issued to a client.
//!
//! The `number` column is unique across every row, soft-deleted ones included,
//! which is what turns a racing number generation into a detectable conflict.
use crate::core::status::InvoiceStatus;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Invoice database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "invoices")]
pub struct Model {
    /// Unique identifier assigned on insert
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Human-readable number such as `INV-20240115-1`; immutable once assigned
    #[sea_orm(unique)]
    pub number: String,
    /// Owning client
    pub client_id: i64,
    /// Invoiced amount, always greater than zero with at most four decimals.
    /// `SQLite` stores it as REAL, so finer scales would not round-trip.
    pub amount: Decimal,
    /// Current lifecycle status
    pub status: InvoiceStatus,
    /// Calendar date the invoice was issued
    pub issue_date: Date,
    /// Calendar date payment is due; never before `issue_date`
    pub due_date: Date,
    /// Optional free text, up to 500 characters
    pub description: Option<String>,
    /// Soft delete flag - if true, invoice is hidden but data is preserved
    pub is_deleted: bool,
    /// When the invoice was created
    pub created_at: DateTimeUtc,
    /// When the invoice was last modified
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between Invoice and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each invoice belongs to one client
    #[sea_orm(
        belongs_to = "super::client::Entity",
        from = "Column::ClientId",
        to = "super::client::Column::Id"
    )]
    Client,
}

impl Related<super::client::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Client.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
