//! Invoice status values and the transition graph between them.
//!
//! The graph is fixed:
//!
//! ```text
//! draft      -> sent, cancelled
//! sent       -> paid, overdue, cancelled
//! overdue    -> paid, cancelled
//! paid       -> (terminal)
//! cancelled  -> (terminal)
//! ```
//!
//! There are no self-edges, so `draft -> draft` is rejected like any other
//! unlisted transition.

use crate::errors::{Error, Result};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Business status of an invoice, stored as lowercase text.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    /// Being prepared, not yet sent to the client
    #[default]
    #[sea_orm(string_value = "draft")]
    Draft,
    /// Delivered to the client and awaiting payment
    #[sea_orm(string_value = "sent")]
    Sent,
    /// Settled; terminal
    #[sea_orm(string_value = "paid")]
    Paid,
    /// Explicitly flagged as late
    #[sea_orm(string_value = "overdue")]
    Overdue,
    /// Voided; terminal
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

impl InvoiceStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [Self; 5] = [
        Self::Draft,
        Self::Sent,
        Self::Paid,
        Self::Overdue,
        Self::Cancelled,
    ];

    /// Lowercase name as stored and serialized.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Sent => "sent",
            Self::Paid => "paid",
            Self::Overdue => "overdue",
            Self::Cancelled => "cancelled",
        }
    }

    /// Outgoing edges of the transition graph.
    #[must_use]
    pub const fn allowed_transitions(self) -> &'static [Self] {
        match self {
            Self::Draft => &[Self::Sent, Self::Cancelled],
            Self::Sent => &[Self::Paid, Self::Overdue, Self::Cancelled],
            Self::Overdue => &[Self::Paid, Self::Cancelled],
            Self::Paid | Self::Cancelled => &[],
        }
    }

    /// True when `self -> to` is an edge of the graph.
    #[must_use]
    pub fn can_transition_to(self, to: Self) -> bool {
        self.allowed_transitions().contains(&to)
    }

    /// `paid` and `cancelled` have no outgoing edges.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Paid | Self::Cancelled)
    }
}

impl fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InvoiceStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| Error::validation("status", format!("unknown invoice status '{s}'")))
    }
}

/// Returns true iff `from -> to` is an edge of the transition graph.
#[must_use]
pub fn can_transition(from: InvoiceStatus, to: InvoiceStatus) -> bool {
    from.can_transition_to(to)
}
