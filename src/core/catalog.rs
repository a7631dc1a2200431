//! Catalog rules - categories form a tree, products hang off categories.
//!
//! Like the billing rules, these functions are pure. Ancestor chains and
//! dependent counts are loaded by the store and passed in.

use crate::{
    entities::{category, product},
    errors::{Error, Result},
};
use rust_decimal::Decimal;

/// Longest category name, in characters
pub const MAX_CATEGORY_NAME_LEN: usize = 100;
/// Longest category description
pub const MAX_CATEGORY_DESCRIPTION_LEN: usize = 500;
/// Longest product name
pub const MAX_PRODUCT_NAME_LEN: usize = 200;
/// Longest SKU
pub const MAX_SKU_LEN: usize = 50;
/// Longest product description
pub const MAX_PRODUCT_DESCRIPTION_LEN: usize = 1000;
/// Currency used when a product names none
pub const DEFAULT_CURRENCY: &str = "USD";
/// Prices are stored as REAL on `SQLite`; four decimals round-trip exactly.
pub const MAX_PRICE_SCALE: u32 = 4;
/// Separator between names in [`full_path`]
pub const PATH_SEPARATOR: &str = " > ";

/// Payload for creating a category.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryDraft {
    /// Display name, required
    pub name: String,
    /// Optional free text
    pub description: Option<String>,
    /// Parent category; `None` creates a root
    pub parent_id: Option<i64>,
    /// Defaults to `true`
    pub is_active: Option<bool>,
    /// Position among siblings, defaults to 0
    pub sort_order: Option<i32>,
}

/// Partial update for a category. Re-parenting goes through [`check_move`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryPatch {
    /// New name; blank keeps the current one
    pub name: Option<String>,
    /// New description; blank keeps the current one
    pub description: Option<String>,
    /// Toggles visibility
    pub is_active: Option<bool>,
    /// New position among siblings
    pub sort_order: Option<i32>,
}

/// Payload for creating a product.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductDraft {
    /// Stock keeping unit, unique across all products
    pub sku: String,
    /// Display name, required
    pub name: String,
    /// Optional free text
    pub description: Option<String>,
    /// Unit price, zero or more
    pub price: Decimal,
    /// Defaults to [`DEFAULT_CURRENCY`]
    pub currency: Option<String>,
    /// Category to list the product under
    pub category_id: Option<i64>,
    /// Defaults to `true`
    pub is_active: Option<bool>,
}

/// Partial update for a product. The SKU is fixed once created.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductPatch {
    /// New name; blank keeps the current one
    pub name: Option<String>,
    /// New description; blank keeps the current one
    pub description: Option<String>,
    /// New unit price
    pub price: Option<Decimal>,
    /// New currency code, stored uppercase
    pub currency: Option<String>,
    /// Category to move the product to
    pub category_id: Option<i64>,
    /// Toggles availability
    pub is_active: Option<bool>,
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn check_required(field: &'static str, value: &str, max: usize) -> Result<()> {
    let value = value.trim();
    if value.is_empty() {
        return Err(Error::validation(field, "cannot be empty"));
    }
    check_max_len(field, value, max)
}

fn check_max_len(field: &'static str, value: &str, max: usize) -> Result<()> {
    if value.chars().count() > max {
        return Err(Error::validation(
            field,
            format!("must be at most {max} characters"),
        ));
    }
    Ok(())
}

fn check_price(price: Decimal) -> Result<()> {
    if price < Decimal::ZERO {
        return Err(Error::validation("price", "cannot be negative"));
    }
    if price.normalize().scale() > MAX_PRICE_SCALE {
        return Err(Error::validation(
            "price",
            format!("must have at most {MAX_PRICE_SCALE} decimal places"),
        ));
    }
    Ok(())
}

fn check_currency(currency: &str) -> Result<()> {
    if currency.len() != 3 || !currency.bytes().all(|b| b.is_ascii_alphabetic()) {
        return Err(Error::validation("currency", "must be a 3-letter code"));
    }
    Ok(())
}

/// Validates a category create payload.
pub fn validate_category(draft: &CategoryDraft) -> Result<()> {
    check_required("name", &draft.name, MAX_CATEGORY_NAME_LEN)?;
    if let Some(description) = &draft.description {
        check_max_len("description", description, MAX_CATEGORY_DESCRIPTION_LEN)?;
    }
    Ok(())
}

/// Validates the fields a category patch supplies.
pub fn validate_category_patch(patch: &CategoryPatch) -> Result<()> {
    if let Some(name) = non_empty(patch.name.as_deref()) {
        check_max_len("name", name, MAX_CATEGORY_NAME_LEN)?;
    }
    if let Some(description) = &patch.description {
        check_max_len("description", description, MAX_CATEGORY_DESCRIPTION_LEN)?;
    }
    Ok(())
}

/// Merges a category patch; blank strings keep the current values.
#[must_use]
pub fn apply_category_patch(existing: &category::Model, patch: &CategoryPatch) -> category::Model {
    let mut updated = existing.clone();
    if let Some(name) = non_empty(patch.name.as_deref()) {
        updated.name = name.to_string();
    }
    if let Some(description) = non_empty(patch.description.as_deref()) {
        updated.description = Some(description.to_string());
    }
    if let Some(is_active) = patch.is_active {
        updated.is_active = is_active;
    }
    if let Some(sort_order) = patch.sort_order {
        updated.sort_order = sort_order;
    }
    updated
}

/// Checks that `category_id` may be placed under `new_parent_id`.
///
/// `new_parent_ancestors` lists the ids above the new parent, nearest first.
pub fn check_move(
    category_id: i64,
    new_parent_id: Option<i64>,
    new_parent_ancestors: &[i64],
) -> Result<()> {
    let Some(parent_id) = new_parent_id else {
        return Ok(());
    };
    if parent_id == category_id {
        return Err(Error::validation("parent_id", "a category cannot be its own parent"));
    }
    if new_parent_ancestors.contains(&category_id) {
        return Err(Error::validation(
            "parent_id",
            "a category cannot be moved below one of its descendants",
        ));
    }
    Ok(())
}

/// Joins names from the root down, e.g. `Electronics > Computers > Laptops`.
#[must_use]
pub fn full_path<S: AsRef<str>>(names_from_root: &[S]) -> String {
    names_from_root
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(PATH_SEPARATOR)
}

/// A category may be deleted only when nothing live hangs off it.
#[must_use]
pub const fn can_delete_category(live_children: u64, live_products: u64) -> bool {
    live_children == 0 && live_products == 0
}

/// Returns [`Error::CategoryInUse`] with both counts when deletion is blocked.
pub fn ensure_category_deletable(
    category_id: i64,
    live_children: u64,
    live_products: u64,
) -> Result<()> {
    if can_delete_category(live_children, live_products) {
        return Ok(());
    }
    Err(Error::CategoryInUse {
        category_id,
        children: live_children,
        products: live_products,
    })
}

/// Validates a product create payload.
pub fn validate_product(draft: &ProductDraft) -> Result<()> {
    check_required("name", &draft.name, MAX_PRODUCT_NAME_LEN)?;
    check_required("sku", &draft.sku, MAX_SKU_LEN)?;
    check_price(draft.price)?;
    if let Some(description) = &draft.description {
        check_max_len("description", description, MAX_PRODUCT_DESCRIPTION_LEN)?;
    }
    if let Some(currency) = non_empty(draft.currency.as_deref()) {
        check_currency(currency)?;
    }
    Ok(())
}

/// Validates the fields a product patch supplies.
pub fn validate_product_patch(patch: &ProductPatch) -> Result<()> {
    if let Some(name) = non_empty(patch.name.as_deref()) {
        check_max_len("name", name, MAX_PRODUCT_NAME_LEN)?;
    }
    if let Some(description) = &patch.description {
        check_max_len("description", description, MAX_PRODUCT_DESCRIPTION_LEN)?;
    }
    if let Some(price) = patch.price {
        check_price(price)?;
    }
    if let Some(currency) = non_empty(patch.currency.as_deref()) {
        check_currency(currency)?;
    }
    Ok(())
}

/// Merges a product patch; blank strings keep the current values.
#[must_use]
pub fn apply_product_patch(existing: &product::Model, patch: &ProductPatch) -> product::Model {
    let mut updated = existing.clone();
    if let Some(name) = non_empty(patch.name.as_deref()) {
        updated.name = name.to_string();
    }
    if let Some(description) = non_empty(patch.description.as_deref()) {
        updated.description = Some(description.to_string());
    }
    if let Some(price) = patch.price {
        updated.price = price;
    }
    if let Some(currency) = non_empty(patch.currency.as_deref()) {
        updated.currency = currency.to_ascii_uppercase();
    }
    if let Some(category_id) = patch.category_id {
        updated.category_id = Some(category_id);
    }
    if let Some(is_active) = patch.is_active {
        updated.is_active = is_active;
    }
    updated
}

/// Formats a price with two decimals and its currency, e.g. `12.50 USD`.
#[must_use]
pub fn format_price(price: Decimal, currency: &str) -> String {
    if currency.is_empty() {
        format!("{price:.2}")
    } else {
        format!("{price:.2} {currency}")
    }
}
