//! Core business rules - framework-agnostic, side-effect free.
//!
//! Nothing in this module touches the database or the clock. Callers load
//! entities and counts, ask these functions for a decision, then persist.

/// Catalog category tree and product rules
pub mod catalog;
/// Client field validation and partial updates
pub mod client;
/// Invoice payload validation and partial updates
pub mod invoice;
/// Status changes, lateness, and deletion guards
pub mod lifecycle;
/// Invoice number generation
pub mod numbering;
/// Invoice status values and the transition graph
pub mod status;

pub use status::InvoiceStatus;
