//! Category entity - A node in the catalog's category tree.
//!
//! `parent_id` points at another category (or nothing for a root). A category
//! may never be its own parent or sit below one of its own descendants.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Category database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "categories")]
pub struct Model {
    /// Unique identifier assigned on insert
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Display name, 1 to 100 characters
    pub name: String,
    /// Optional free text, up to 500 characters
    pub description: Option<String>,
    /// Parent category, `None` for a root
    pub parent_id: Option<i64>,
    /// Inactive categories stay in the tree but are hidden from listings
    pub is_active: bool,
    /// Ordering among siblings
    pub sort_order: i32,
    /// Soft delete flag - if true, category is hidden but data is preserved
    pub is_deleted: bool,
    /// When the category was created
    pub created_at: DateTimeUtc,
    /// When the category was last modified
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between Category and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Self reference to the parent category
    #[sea_orm(belongs_to = "Entity", from = "Column::ParentId", to = "Column::Id")]
    Parent,
    /// One category has many products
    #[sea_orm(has_many = "super::product::Entity")]
    Products,
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Products.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
