//! Shared test utilities for the billing engine.
//!
//! This module provides common helper functions for setting up test databases
//! and creating test entities with sensible defaults.
#![allow(clippy::unwrap_used)]

use crate::{
    config::InvoiceSettings,
    core::{client::ClientDraft, invoice::InvoiceDraft, status::InvoiceStatus},
    entities::{client, invoice},
    errors::Result,
    store::{clients, invoices},
};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::DatabaseConnection;

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Routes `tracing` output through the test harness. Safe to call repeatedly.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("billing_engine=debug")
        .with_test_writer()
        .try_init();
}

/// Shorthand for a calendar date that is known to be valid.
pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

fn fixed_timestamp() -> DateTime<Utc> {
    DateTime::from_timestamp(1_705_309_200, 0).unwrap()
}

/// Builds an unsaved invoice model for pure-logic tests.
///
/// # Defaults
/// * number: `INV-20240115-1`
/// * `client_id`: 1
/// * amount: 150.00
/// * `issue_date`: 2024-01-15
/// * description: "Consulting"
pub fn invoice_model(status: InvoiceStatus, due_date: NaiveDate) -> invoice::Model {
    invoice::Model {
        id: 1,
        number: "INV-20240115-1".to_string(),
        client_id: 1,
        amount: dec!(150.00),
        status,
        issue_date: date(2024, 1, 15),
        due_date,
        description: Some("Consulting".to_string()),
        is_deleted: false,
        created_at: fixed_timestamp(),
        updated_at: fixed_timestamp(),
    }
}

/// Builds an unsaved client model with no phone or address.
pub fn client_model(id: i64, name: &str, email: &str) -> client::Model {
    client::Model {
        id,
        name: name.to_string(),
        email: email.to_string(),
        phone: None,
        address: None,
        is_deleted: false,
        created_at: fixed_timestamp(),
        updated_at: fixed_timestamp(),
    }
}

/// Invoice settings used by store tests: default prefix, 30 day terms, 3 retries.
pub fn test_settings() -> InvoiceSettings {
    InvoiceSettings::default()
}

/// Creates a test client with sensible defaults.
///
/// # Arguments
/// * `db` - Database connection
/// * `name` - Client name
/// * `email` - Client email, must be unique
pub async fn create_test_client(
    db: &DatabaseConnection,
    name: &str,
    email: &str,
) -> Result<client::Model> {
    clients::create_client(
        db,
        &ClientDraft {
            name: name.to_string(),
            email: email.to_string(),
            phone: None,
            address: None,
        },
    )
    .await
}

/// Creates a draft invoice for `client_id` issued on `issue_date`, due 30 days later.
pub async fn create_test_invoice(
    db: &DatabaseConnection,
    client_id: i64,
    amount: Decimal,
    issue_date: NaiveDate,
) -> Result<invoice::Model> {
    invoices::create_invoice(
        db,
        &test_settings(),
        &InvoiceDraft {
            client_id,
            amount,
            status: None,
            issue_date: Some(issue_date),
            due_date: None,
            description: None,
        },
    )
    .await
}

/// Creates an invoice with an explicit status and due date.
pub async fn create_custom_invoice(
    db: &DatabaseConnection,
    client_id: i64,
    status: InvoiceStatus,
    issue_date: NaiveDate,
    due_date: NaiveDate,
) -> Result<invoice::Model> {
    invoices::create_invoice(
        db,
        &test_settings(),
        &InvoiceDraft {
            client_id,
            amount: dec!(100),
            status: Some(status),
            issue_date: Some(issue_date),
            due_date: Some(due_date),
            description: None,
        },
    )
    .await
}

/// Sets up a complete test environment with one client.
/// Returns (db, client) for common test scenarios.
pub async fn setup_with_client() -> Result<(DatabaseConnection, client::Model)> {
    let db = setup_test_db().await?;
    let client = create_test_client(&db, "Acme Corp", "billing@acme.test").await?;
    Ok((db, client))
}
