//! Client entity - Represents a billed customer.
//!
//! Clients are soft-deleted and keep their row (and unique email) afterwards.
//! A client owns zero or more invoices through `invoices.client_id`.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Client database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "clients")]
pub struct Model {
    /// Unique identifier assigned on insert
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Display name, 1 to 100 characters
    pub name: String,
    /// Contact email, unique across all clients including deleted ones
    #[sea_orm(unique)]
    pub email: String,
    /// Optional phone number, up to 20 characters
    pub phone: Option<String>,
    /// Optional postal address, up to 255 characters
    pub address: Option<String>,
    /// Soft delete flag - if true, client is hidden but data is preserved
    pub is_deleted: bool,
    /// When the client was created
    pub created_at: DateTimeUtc,
    /// When the client was last modified
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between Client and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One client has many invoices
    #[sea_orm(has_many = "super::invoice::Entity")]
    Invoices,
}

impl Related<super::invoice::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Invoices.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
