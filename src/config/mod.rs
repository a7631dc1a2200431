/// Database configuration and connection management
pub mod database;

/// Billing settings loading from config.toml
pub mod settings;

pub use settings::{BillingConfig, InvoiceSettings, LoggingSettings, PaginationSettings};
