//! Client rules - field validation and partial updates.
//!
//! Everything here is pure: functions take already-loaded models and payloads
//! and return new values or validation errors.

use crate::{
    entities::client,
    errors::{Error, Result},
};

/// Longest client name, in characters
pub const MAX_NAME_LEN: usize = 100;
/// Longest email address
pub const MAX_EMAIL_LEN: usize = 255;
/// Longest phone number
pub const MAX_PHONE_LEN: usize = 20;
/// Longest postal address
pub const MAX_ADDRESS_LEN: usize = 255;

/// Payload for creating a client.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientDraft {
    /// Display name, required
    pub name: String,
    /// Contact email, required and unique
    pub email: String,
    /// Optional phone number
    pub phone: Option<String>,
    /// Optional postal address
    pub address: Option<String>,
}

/// Partial update for a client.
///
/// `None` means "not supplied". A supplied empty or blank string is treated the
/// same way: it never clears the stored value. Supplied values are trimmed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientPatch {
    /// New name
    pub name: Option<String>,
    /// New email
    pub email: Option<String>,
    /// New phone number
    pub phone: Option<String>,
    /// New postal address
    pub address: Option<String>,
}

impl ClientDraft {
    /// Copy with surrounding whitespace removed; blank optional fields become `None`.
    #[must_use]
    pub fn trimmed(&self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            phone: supplied(self.phone.as_deref()).map(str::to_string),
            address: supplied(self.address.as_deref()).map(str::to_string),
        }
    }
}

impl ClientPatch {
    /// True when no field would change anything.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        [&self.name, &self.email, &self.phone, &self.address]
            .into_iter()
            .all(|field| supplied(field.as_deref()).is_none())
    }
}

/// Returns the trimmed value only when it is present and not blank.
fn supplied(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
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

fn check_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(Error::validation("name", "cannot be empty"));
    }
    check_max_len("name", name, MAX_NAME_LEN)
}

/// Minimal email check: non-empty, bounded, contains `@` and `.`.
fn check_email(email: &str) -> Result<()> {
    if email.trim().is_empty() {
        return Err(Error::validation("email", "cannot be empty"));
    }
    check_max_len("email", email, MAX_EMAIL_LEN)?;
    if !email.contains('@') || !email.contains('.') {
        return Err(Error::validation("email", "must contain '@' and '.'"));
    }
    Ok(())
}

/// Validates a create payload. Lengths are measured after trimming.
pub fn validate_client(draft: &ClientDraft) -> Result<()> {
    let draft = draft.trimmed();
    check_name(&draft.name)?;
    check_email(&draft.email)?;
    if let Some(phone) = &draft.phone {
        check_max_len("phone", phone, MAX_PHONE_LEN)?;
    }
    if let Some(address) = &draft.address {
        check_max_len("address", address, MAX_ADDRESS_LEN)?;
    }
    Ok(())
}

/// Validates only the fields a patch actually supplies.
pub fn validate_client_patch(patch: &ClientPatch) -> Result<()> {
    if let Some(name) = supplied(patch.name.as_deref()) {
        check_name(name)?;
    }
    if let Some(email) = supplied(patch.email.as_deref()) {
        check_email(email)?;
    }
    if let Some(phone) = supplied(patch.phone.as_deref()) {
        check_max_len("phone", phone, MAX_PHONE_LEN)?;
    }
    if let Some(address) = supplied(patch.address.as_deref()) {
        check_max_len("address", address, MAX_ADDRESS_LEN)?;
    }
    Ok(())
}

/// Applies a patch: each non-blank supplied field overwrites (trimmed), everything else is kept.
#[must_use]
pub fn apply_client_patch(existing: &client::Model, patch: &ClientPatch) -> client::Model {
    let mut updated = existing.clone();
    if let Some(name) = supplied(patch.name.as_deref()) {
        updated.name = name.to_string();
    }
    if let Some(email) = supplied(patch.email.as_deref()) {
        updated.email = email.to_string();
    }
    if let Some(phone) = supplied(patch.phone.as_deref()) {
        updated.phone = Some(phone.to_string());
    }
    if let Some(address) = supplied(patch.address.as_deref()) {
        updated.address = Some(address.to_string());
    }
    updated
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::client_model;

    fn draft() -> ClientDraft {
        ClientDraft {
            name: "John Doe".to_string(),
            email: "john@example.com".to_string(),
            phone: Some("+1234567890".to_string()),
            address: Some("1 Main St".to_string()),
        }
    }

    #[test]
    fn test_valid_client_passes() {
        assert!(validate_client(&draft()).is_ok());

        let minimal = ClientDraft {
            phone: None,
            address: None,
            ..draft()
        };
        assert!(validate_client(&minimal).is_ok());
    }

    #[test]
    fn test_name_rules() {
        let empty = ClientDraft {
            name: "   ".to_string(),
            ..draft()
        };
        assert!(matches!(
            validate_client(&empty).unwrap_err(),
            Error::Validation { field: "name", .. }
        ));

        let at_limit = ClientDraft {
            name: "a".repeat(MAX_NAME_LEN),
            ..draft()
        };
        assert!(validate_client(&at_limit).is_ok());

        let too_long = ClientDraft {
            name: "a".repeat(MAX_NAME_LEN + 1),
            ..draft()
        };
        assert!(matches!(
            validate_client(&too_long).unwrap_err(),
            Error::Validation { field: "name", .. }
        ));
    }

    #[test]
    fn test_email_rules() {
        for bad in ["", "john.example.com", "john@example", "@"] {
            let client = ClientDraft {
                email: bad.to_string(),
                ..draft()
            };
            assert!(
                matches!(
                    validate_client(&client).unwrap_err(),
                    Error::Validation { field: "email", .. }
                ),
                "{bad:?} should be rejected"
            );
        }

        let long = ClientDraft {
            email: format!("{}@example.com", "a".repeat(MAX_EMAIL_LEN)),
            ..draft()
        };
        assert!(validate_client(&long).is_err());
    }

    #[test]
    fn test_optional_field_lengths() {
        let phone = ClientDraft {
            phone: Some("1".repeat(MAX_PHONE_LEN + 1)),
            ..draft()
        };
        assert!(matches!(
            validate_client(&phone).unwrap_err(),
            Error::Validation { field: "phone", .. }
        ));

        let address = ClientDraft {
            address: Some("x".repeat(MAX_ADDRESS_LEN + 1)),
            ..draft()
        };
        assert!(matches!(
            validate_client(&address).unwrap_err(),
            Error::Validation { field: "address", .. }
        ));
    }

    #[test]
    fn test_lengths_count_characters_not_bytes() {
        let accented = ClientDraft {
            name: "é".repeat(MAX_NAME_LEN),
            ..draft()
        };
        assert!(validate_client(&accented).is_ok());
    }

    #[test]
    fn test_empty_patch_is_identity() {
        let existing = client_model(1, "John Doe", "john@example.com");
        let patch = ClientPatch::default();
        assert!(patch.is_empty());
        assert_eq!(apply_client_patch(&existing, &patch), existing);
    }

    #[test]
    fn test_empty_strings_do_not_clear_fields() {
        let mut existing = client_model(1, "John Doe", "john@example.com");
        existing.phone = Some("555-0100".to_string());

        let patch = ClientPatch {
            name: Some(String::new()),
            email: Some(String::new()),
            phone: Some(String::new()),
            address: None,
        };
        assert!(patch.is_empty());
        assert!(validate_client_patch(&patch).is_ok());
        assert_eq!(apply_client_patch(&existing, &patch), existing);
    }

    #[test]
    fn test_supplied_fields_overwrite() {
        let existing = client_model(1, "John Doe", "john@example.com");
        let patch = ClientPatch {
            name: Some("Jane Doe".to_string()),
            address: Some("2 Side St".to_string()),
            ..ClientPatch::default()
        };

        let updated = apply_client_patch(&existing, &patch);
        assert_eq!(updated.name, "Jane Doe");
        assert_eq!(updated.address.as_deref(), Some("2 Side St"));
        assert_eq!(updated.email, existing.email);
        assert_eq!(updated.id, existing.id);
    }

    #[test]
    fn test_surrounding_whitespace_is_trimmed() {
        let padded = ClientDraft {
            name: format!("  {}  ", "a".repeat(MAX_NAME_LEN)),
            email: " john@example.com ".to_string(),
            phone: Some("   ".to_string()),
            address: None,
        };
        assert!(validate_client(&padded).is_ok());

        let trimmed = padded.trimmed();
        assert_eq!(trimmed.name.len(), MAX_NAME_LEN);
        assert_eq!(trimmed.email, "john@example.com");
        assert_eq!(trimmed.phone, None);

        let existing = client_model(1, "John Doe", "john@example.com");
        let patch = ClientPatch {
            name: Some("  Jane Doe ".to_string()),
            email: Some("   ".to_string()),
            ..ClientPatch::default()
        };
        assert!(validate_client_patch(&patch).is_ok());
        let updated = apply_client_patch(&existing, &patch);
        assert_eq!(updated.name, "Jane Doe");
        assert_eq!(updated.email, "john@example.com");
    }

    #[test]
    fn test_patch_validation_checks_only_supplied_fields() {
        let patch = ClientPatch {
            email: Some("not-an-email".to_string()),
            ..ClientPatch::default()
        };
        assert!(matches!(
            validate_client_patch(&patch).unwrap_err(),
            Error::Validation { field: "email", .. }
        ));

        let patch = ClientPatch {
            phone: Some("555-0199".to_string()),
            ..ClientPatch::default()
        };
        assert!(validate_client_patch(&patch).is_ok());
    }
}
