//! Catalog persistence - Category tree and product operations.
//!
//! Categories are soft-deleted and may only be removed once they have no live
//! children and no live products. Moves walk the ancestor chain of the new parent
//! so a category can never end up below itself.

use crate::{
    core::catalog::{
        CategoryDraft, CategoryPatch, DEFAULT_CURRENCY, ProductDraft, ProductPatch,
        apply_category_patch, apply_product_patch, check_move, ensure_category_deletable,
        full_path, validate_category, validate_category_patch, validate_product,
        validate_product_patch,
    },
    entities::{Category, Product, category, product},
    errors::{Error, Result},
    store::{Page, Paginated, fetch_page, is_unique_violation},
};
use chrono::Utc;
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use std::collections::HashSet;
use tracing::{info, warn};

/// Optional filters for [`list_products`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProductFilter {
    /// Only products listed under this category
    pub category_id: Option<i64>,
    /// Hide products with `is_active = false`
    pub active_only: bool,
}

/// Loads a category by id. Soft-deleted categories count as missing unless
/// `include_deleted` is set.
pub async fn find_category<C>(
    db: &C,
    category_id: i64,
    include_deleted: bool,
) -> Result<category::Model>
where
    C: ConnectionTrait,
{
    Category::find_by_id(category_id)
        .one(db)
        .await?
        .filter(|c| include_deleted || !c.is_deleted)
        .ok_or_else(|| Error::not_found("Category", category_id))
}

/// Returns the ancestors of a category, nearest parent first.
///
/// Stops early if the stored chain loops back on itself.
pub async fn ancestors<C>(db: &C, category_id: i64) -> Result<Vec<category::Model>>
where
    C: ConnectionTrait,
{
    let mut chain = Vec::new();
    let mut seen = HashSet::from([category_id]);
    let mut next = find_category(db, category_id, true).await?.parent_id;

    while let Some(parent_id) = next {
        if !seen.insert(parent_id) {
            warn!(category_id, parent_id, "Category parent chain contains a cycle");
            break;
        }
        let parent = find_category(db, parent_id, true).await?;
        next = parent.parent_id;
        chain.push(parent);
    }
    Ok(chain)
}

/// Full path from the root, e.g. `Electronics > Computers > Laptops`.
pub async fn category_path(db: &DatabaseConnection, category_id: i64) -> Result<String> {
    let category = find_category(db, category_id, false).await?;
    let mut names: Vec<String> = ancestors(db, category_id)
        .await?
        .into_iter()
        .rev()
        .map(|c| c.name)
        .collect();
    names.push(category.name);
    Ok(full_path(&names))
}

/// Number of ancestors above the category; roots have depth 0.
pub async fn category_depth(db: &DatabaseConnection, category_id: i64) -> Result<usize> {
    Ok(ancestors(db, category_id).await?.len())
}

/// Live direct children of `parent_id` (or the roots when `None`), ordered by
/// sort order then name.
pub async fn child_categories(
    db: &DatabaseConnection,
    parent_id: Option<i64>,
) -> Result<Vec<category::Model>> {
    let query = Category::find().filter(category::Column::IsDeleted.eq(false));
    let query = match parent_id {
        Some(id) => query.filter(category::Column::ParentId.eq(id)),
        None => query.filter(category::Column::ParentId.is_null()),
    };
    query
        .order_by_asc(category::Column::SortOrder)
        .order_by_asc(category::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Creates a category, optionally below an existing live parent.
///
/// # Errors
/// Returns an error if:
/// - The name or description fails validation
/// - The parent does not exist or is deleted
pub async fn create_category(
    db: &DatabaseConnection,
    draft: &CategoryDraft,
) -> Result<category::Model> {
    validate_category(draft)?;
    if let Some(parent_id) = draft.parent_id {
        find_category(db, parent_id, false).await?;
    }

    let now = Utc::now();
    let category = category::ActiveModel {
        name: Set(draft.name.trim().to_string()),
        description: Set(draft.description.clone().filter(|d| !d.is_empty())),
        parent_id: Set(draft.parent_id),
        is_active: Set(draft.is_active.unwrap_or(true)),
        sort_order: Set(draft.sort_order.unwrap_or(0)),
        is_deleted: Set(false),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    let category = category.insert(db).await?;
    info!(category_id = category.id, "Created category {}", category.name);
    Ok(category)
}

/// Applies a partial update to a live category.
pub async fn update_category(
    db: &DatabaseConnection,
    category_id: i64,
    patch: &CategoryPatch,
) -> Result<category::Model> {
    validate_category_patch(patch)?;

    let existing = find_category(db, category_id, false).await?;
    let updated = apply_category_patch(&existing, patch);

    let mut active: category::ActiveModel = existing.into();
    active.name = Set(updated.name);
    active.description = Set(updated.description);
    active.is_active = Set(updated.is_active);
    active.sort_order = Set(updated.sort_order);
    active.updated_at = Set(Utc::now());
    active.update(db).await.map_err(Into::into)
}

/// Re-parents a category, or makes it a root when `new_parent_id` is `None`.
///
/// # Errors
/// Returns an error if:
/// - The category or the new parent does not exist or is deleted
/// - The new parent is the category itself or one of its descendants
pub async fn move_category(
    db: &DatabaseConnection,
    category_id: i64,
    new_parent_id: Option<i64>,
) -> Result<category::Model> {
    let txn = db.begin().await?;

    let existing = find_category(&txn, category_id, false).await?;
    let parent_ancestors = match new_parent_id {
        Some(parent_id) if parent_id != category_id => {
            find_category(&txn, parent_id, false).await?;
            ancestors(&txn, parent_id)
                .await?
                .into_iter()
                .map(|c| c.id)
                .collect()
        }
        _ => Vec::new(),
    };
    check_move(category_id, new_parent_id, &parent_ancestors)?;

    let mut active: category::ActiveModel = existing.into();
    active.parent_id = Set(new_parent_id);
    active.updated_at = Set(Utc::now());
    let moved = active.update(&txn).await?;

    txn.commit().await?;
    info!(category_id, ?new_parent_id, "Moved category");
    Ok(moved)
}

/// Soft-deletes a category that has no live children and no live products.
pub async fn delete_category(db: &DatabaseConnection, category_id: i64) -> Result<category::Model> {
    let txn = db.begin().await?;

    let existing = find_category(&txn, category_id, false).await?;
    let children = Category::find()
        .filter(category::Column::ParentId.eq(category_id))
        .filter(category::Column::IsDeleted.eq(false))
        .count(&txn)
        .await?;
    let products = Product::find()
        .filter(product::Column::CategoryId.eq(category_id))
        .filter(product::Column::IsDeleted.eq(false))
        .count(&txn)
        .await?;
    ensure_category_deletable(category_id, children, products)?;

    let mut active: category::ActiveModel = existing.into();
    active.is_deleted = Set(true);
    active.updated_at = Set(Utc::now());
    let deleted = active.update(&txn).await?;

    txn.commit().await?;
    info!(category_id, "Deleted category");
    Ok(deleted)
}

fn map_sku_conflict(err: DbErr) -> Error {
    if is_unique_violation(&err) {
        Error::validation("sku", "is already used by another product")
    } else {
        err.into()
    }
}

/// Retrieves a live product by id.
pub async fn find_product(db: &DatabaseConnection, product_id: i64) -> Result<product::Model> {
    Product::find_by_id(product_id)
        .one(db)
        .await?
        .filter(|p| !p.is_deleted)
        .ok_or_else(|| Error::not_found("Product", product_id))
}

/// Finds a live product by its SKU, returning None if not found or deleted.
pub async fn get_product_by_sku(
    db: &DatabaseConnection,
    sku: &str,
) -> Result<Option<product::Model>> {
    Product::find()
        .filter(product::Column::Sku.eq(sku.trim()))
        .filter(product::Column::IsDeleted.eq(false))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Lists live products ordered by name.
pub async fn list_products(
    db: &DatabaseConnection,
    filter: ProductFilter,
    page: Page,
) -> Result<Paginated<product::Model>> {
    let mut query = Product::find().filter(product::Column::IsDeleted.eq(false));
    if let Some(category_id) = filter.category_id {
        query = query.filter(product::Column::CategoryId.eq(category_id));
    }
    if filter.active_only {
        query = query.filter(product::Column::IsActive.eq(true));
    }
    let query = query
        .order_by_asc(product::Column::Name)
        .order_by_asc(product::Column::Id);
    fetch_page(db, query, page).await
}

/// Creates a new product, performing input validation.
///
/// # Errors
/// Returns an error if:
/// - A field fails validation
/// - The category does not exist or is deleted
/// - The SKU is already taken
pub async fn create_product(db: &DatabaseConnection, draft: &ProductDraft) -> Result<product::Model> {
    validate_product(draft)?;
    if let Some(category_id) = draft.category_id {
        find_category(db, category_id, false).await?;
    }

    let currency = draft
        .currency
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .unwrap_or(DEFAULT_CURRENCY)
        .to_ascii_uppercase();
    let now = Utc::now();
    let product = product::ActiveModel {
        sku: Set(draft.sku.trim().to_string()),
        name: Set(draft.name.trim().to_string()),
        description: Set(draft.description.clone().filter(|d| !d.is_empty())),
        price: Set(draft.price),
        currency: Set(currency),
        category_id: Set(draft.category_id),
        is_active: Set(draft.is_active.unwrap_or(true)),
        is_deleted: Set(false),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    let product = product.insert(db).await.map_err(map_sku_conflict)?;
    info!(product_id = product.id, "Created product {}", product.sku);
    Ok(product)
}

/// Applies a partial update to a live product.
pub async fn update_product(
    db: &DatabaseConnection,
    product_id: i64,
    patch: &ProductPatch,
) -> Result<product::Model> {
    validate_product_patch(patch)?;
    if let Some(category_id) = patch.category_id {
        find_category(db, category_id, false).await?;
    }

    let existing = find_product(db, product_id).await?;
    let updated = apply_product_patch(&existing, patch);

    let mut active: product::ActiveModel = existing.into();
    active.name = Set(updated.name);
    active.description = Set(updated.description);
    active.price = Set(updated.price);
    active.currency = Set(updated.currency);
    active.category_id = Set(updated.category_id);
    active.is_active = Set(updated.is_active);
    active.updated_at = Set(Utc::now());
    active.update(db).await.map_err(Into::into)
}

/// Soft deletes a product by marking it as deleted.
pub async fn delete_product(db: &DatabaseConnection, product_id: i64) -> Result<product::Model> {
    let mut active: product::ActiveModel = find_product(db, product_id).await?.into();
    active.is_deleted = Set(true);
    active.updated_at = Set(Utc::now());
    active.update(db).await.map_err(Into::into)
}
