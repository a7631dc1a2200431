//! Invoice number generation.
//!
//! Numbers have the form `INV-YYYYMMDD-<N>`, where `<N>` is one more than the
//! count of invoices already issued on the same calendar date. Generation is a
//! pure function of its inputs: uniqueness depends on the caller passing an
//! accurate count, and the store backs this with a unique index on the number.

use chrono::NaiveDate;

/// Prefix used when no other prefix is configured.
pub const DEFAULT_PREFIX: &str = "INV";

const DATE_FORMAT: &str = "%Y%m%d";

/// Components recovered from a formatted invoice number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedNumber {
    /// Text before the date
    pub prefix: String,
    /// Date encoded in the number
    pub issue_date: NaiveDate,
    /// One-based position within the day
    pub sequence: u64,
}

/// Generates the next invoice number for `issue_date` with the default prefix.
#[must_use]
pub fn generate_number(issue_date: NaiveDate, same_day_count: u64) -> String {
    generate_number_with_prefix(DEFAULT_PREFIX, issue_date, same_day_count)
}

/// Generates the next invoice number for `issue_date` with a custom prefix.
#[must_use]
pub fn generate_number_with_prefix(
    prefix: &str,
    issue_date: NaiveDate,
    same_day_count: u64,
) -> String {
    format_number(prefix, issue_date, same_day_count.saturating_add(1))
}

/// Formats a number from an explicit sequence value.
#[must_use]
pub fn format_number(prefix: &str, issue_date: NaiveDate, sequence: u64) -> String {
    format!("{}{sequence}", number_stem(prefix, issue_date))
}

/// Text shared by every number issued on `issue_date`, e.g. `INV-20240115-`.
#[must_use]
pub fn number_stem(prefix: &str, issue_date: NaiveDate) -> String {
    format!("{prefix}-{}-", issue_date.format(DATE_FORMAT))
}

/// Parses a number produced by [`format_number`].
///
/// Returns `None` when the text does not have a prefix, an eight digit date and
/// a positive decimal sequence separated by `-`.
#[must_use]
pub fn parse_number(number: &str) -> Option<ParsedNumber> {
    let mut parts = number.rsplitn(3, '-');
    let sequence_part = parts.next()?;
    let date_part = parts.next()?;
    let prefix = parts.next()?;

    if prefix.is_empty() || date_part.len() != 8 || !date_part.bytes().all(|b| b.is_ascii_digit())
    {
        return None;
    }
    if sequence_part.is_empty() || !sequence_part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let issue_date = NaiveDate::parse_from_str(date_part, DATE_FORMAT).ok()?;
    let sequence = sequence_part.parse::<u64>().ok().filter(|s| *s > 0)?;

    Some(ParsedNumber {
        prefix: prefix.to_string(),
        issue_date,
        sequence,
    })
}
