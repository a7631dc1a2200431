//! Product entity - A sellable catalog item.
//!
//! Products are identified externally by their SKU, which is unique across all rows.
//! Each product optionally belongs to a category.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Product database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "products")]
pub struct Model {
    /// Unique identifier for the product
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Stock keeping unit, unique
    #[sea_orm(unique)]
    pub sku: String,
    /// Name of the product (e.g., "Laptop Stand")
    pub name: String,
    /// Optional free text, up to 1000 characters
    pub description: Option<String>,
    /// Unit price, never negative, at most four decimals (stored as REAL on `SQLite`)
    pub price: Decimal,
    /// Three letter currency code
    pub currency: String,
    /// Category this product is listed under, if any
    pub category_id: Option<i64>,
    /// Whether the product is currently offered
    pub is_active: bool,
    /// Soft delete flag - if true, product is hidden but data is preserved
    pub is_deleted: bool,
    /// When the product was created
    pub created_at: DateTimeUtc,
    /// When the product was last modified
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between Product and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each product may belong to one category
    #[sea_orm(
        belongs_to = "super::category::Entity",
        from = "Column::CategoryId",
        to = "super::category::Column::Id"
    )]
    Category,
}

impl Related<super::category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
