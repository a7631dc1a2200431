//! Billing settings loading from config.toml
//!
//! Every section and key is optional; anything left out takes the default shown
//! on the corresponding `Default` impl. A missing file is not an error for
//! [`load_config_or_default`], so the engine runs without any configuration.
//!
//! ```toml
//! [invoice]
//! number_prefix = "INV"
//! payment_terms_days = 30
//! max_number_retries = 3
//!
//! [pagination]
//! default_limit = 10
//! max_limit = 100
//!
//! [logging]
//! level = "info"
//! ```

use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, warn};

/// Environment variable naming an alternative config file.
pub const CONFIG_PATH_ENV: &str = "BILLING_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct BillingConfig {
    /// Invoice numbering and defaulting
    pub invoice: InvoiceSettings,
    /// List page sizes
    pub pagination: PaginationSettings,
    /// Log filter defaults
    pub logging: LoggingSettings,
}

/// Invoice numbering and defaulting
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct InvoiceSettings {
    /// Text before the date in generated numbers
    pub number_prefix: String,
    /// Days added to the issue date when no due date is supplied
    pub payment_terms_days: u32,
    /// How many times invoice creation re-runs after a numbering conflict
    pub max_number_retries: u32,
}

impl Default for InvoiceSettings {
    fn default() -> Self {
        Self {
            number_prefix: crate::core::numbering::DEFAULT_PREFIX.to_string(),
            payment_terms_days: 30,
            max_number_retries: 3,
        }
    }
}

/// Page sizes for list operations
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PaginationSettings {
    /// Page size used when a request names none
    pub default_limit: u64,
    /// Largest page size a request may ask for
    pub max_limit: u64,
}

impl Default for PaginationSettings {
    fn default() -> Self {
        Self {
            default_limit: 10,
            max_limit: 100,
        }
    }
}

/// Logging defaults
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LoggingSettings {
    /// Default `tracing` filter when `RUST_LOG` is not set
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl BillingConfig {
    /// Checks cross-field constraints that serde cannot express.
    pub fn validate(&self) -> Result<()> {
        if self.invoice.number_prefix.trim().is_empty() {
            return Err(Error::Config {
                message: "invoice.number_prefix cannot be empty".to_string(),
            });
        }
        if self.pagination.default_limit == 0 {
            return Err(Error::Config {
                message: "pagination.default_limit must be positive".to_string(),
            });
        }
        if self.pagination.max_limit == 0 {
            return Err(Error::Config {
                message: "pagination.max_limit must be positive".to_string(),
            });
        }
        if self.pagination.default_limit > self.pagination.max_limit {
            return Err(Error::Config {
                message: format!(
                    "pagination.default_limit ({}) cannot exceed max_limit ({})",
                    self.pagination.default_limit, self.pagination.max_limit
                ),
            });
        }
        Ok(())
    }
}

/// Parses and validates configuration from TOML text.
pub fn parse_config(contents: &str) -> Result<BillingConfig> {
    let config: BillingConfig = toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })?;
    config.validate()?;
    Ok(config)
}

/// Loads billing configuration from a TOML file
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The TOML syntax is invalid
/// - A value fails [`BillingConfig::validate`]
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<BillingConfig> {
    let path = path.as_ref();
    debug!("Loading configuration from {:?}", path);
    let contents = std::fs::read_to_string(path).map_err(|e| Error::Config {
        message: format!("Failed to read config file {}: {e}", path.display()),
    })?;
    parse_config(&contents)
}

/// Loads configuration from `BILLING_CONFIG` (or ./config.toml), falling back to
/// defaults when that file does not exist.
pub fn load_config_or_default() -> Result<BillingConfig> {
    let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    if Path::new(&path).exists() {
        load_config(&path)
    } else {
        warn!("Config file {} not found, using defaults", path);
        Ok(BillingConfig::default())
    }
}
