#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![forbid(unsafe_code)]

//! Field-level checks applied to request bodies after serde has accepted
//! their shape and before anything reaches a store.

use crate::error::{CrmError, Result};
use crate::types::{
    FeatureInput, NewPartner, NewPerson, NewReminder, NoteInput, PartnerPatch, PersonPatch,
};

pub trait Validate: Sized {
    /// Checks the value and returns it normalised.
    ///
    /// # Errors
    /// Returns `CrmError::Validation` naming the first offending field.
    fn validated(self) -> Result<Self>;
}

pub(crate) fn require_non_empty(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        Err(CrmError::Validation(format!("{field} is required")))
    } else {
        Ok(())
    }
}

pub(crate) fn require_min_chars(field: &str, value: &str, min: usize) -> Result<()> {
    if value.trim().chars().count() < min {
        Err(CrmError::Validation(format!(
            "{field} must be at least {min} characters"
        )))
    } else {
        Ok(())
    }
}

fn require_null_free(field: &str, value: &str) -> Result<()> {
    if value.contains('\0') {
        Err(CrmError::Validation(format!(
            "Null byte is not allowed in field {field}"
        )))
    } else {
        Ok(())
    }
}

#[must_use]
pub fn looks_like_email(value: &str) -> bool {
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !value.chars().any(char::is_whitespace)
}

pub(crate) fn require_email(field: &str, value: &str) -> Result<()> {
    if looks_like_email(value) {
        Ok(())
    } else {
        Err(CrmError::Validation(format!("Invalid {field} address")))
    }
}

/// Empty string means "no email" for contacts.
fn normalise_optional_email(email: Option<String>) -> Result<Option<String>> {
    match email.map(|value| value.trim().to_string()) {
        None => Ok(None),
        Some(value) if value.is_empty() => Ok(None),
        Some(value) => {
            require_email("email", &value)?;
            Ok(Some(value))
        }
    }
}

impl Validate for NewPartner {
    fn validated(self) -> Result<Self> {
        require_non_empty("Partner name", &self.name)?;
        require_non_empty("Partner code", &self.code)?;
        for (field, value) in [
            ("name", Some(self.name.as_str())),
            ("code", Some(self.code.as_str())),
            ("integrator", self.integrator.as_deref()),
            ("notes", self.notes.as_deref()),
        ] {
            value.map_or(Ok(()), |text| require_null_free(field, text))?;
        }
        Ok(self)
    }
}

impl Validate for PartnerPatch {
    fn validated(self) -> Result<Self> {
        if let Some(name) = &self.name {
            require_non_empty("Partner name", name)?;
        }
        if let Some(code) = &self.code {
            require_non_empty("Partner code", code)?;
        }
        for (field, value) in [
            ("name", self.name.as_deref()),
            ("code", self.code.as_deref()),
            ("integrator", self.integrator.as_deref()),
            ("notes", self.notes.as_deref()),
        ] {
            value.map_or(Ok(()), |text| require_null_free(field, text))?;
        }
        Ok(self)
    }
}

impl Validate for NewPerson {
    fn validated(mut self) -> Result<Self> {
        require_non_empty("Name", &self.name)?;
        require_non_empty("Role", &self.role)?;
        self.email = normalise_optional_email(self.email)?;
        Ok(self)
    }
}

impl Validate for PersonPatch {
    fn validated(mut self) -> Result<Self> {
        if let Some(name) = &self.name {
            require_non_empty("Name", name)?;
        }
        if let Some(role) = &self.role {
            require_non_empty("Role", role)?;
        }
        // An explicit "" clears nothing; it is treated as not supplied.
        self.email = normalise_optional_email(self.email)?;
        Ok(self)
    }
}

impl Validate for NoteInput {
    fn validated(self) -> Result<Self> {
        require_non_empty("Title", &self.title)?;
        require_non_empty("Content", &self.content)?;
        Ok(self)
    }
}

impl Validate for NewReminder {
    fn validated(self) -> Result<Self> {
        require_non_empty("Title", &self.title)?;
        Ok(self)
    }
}

impl Validate for FeatureInput {
    fn validated(self) -> Result<Self> {
        require_non_empty("Name", &self.name)?;
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FeatureCategory, PartnerStatus};

    fn new_partner(name: &str, code: &str) -> NewPartner {
        NewPartner {
            name: name.to_string(),
            code: code.to_string(),
            status: PartnerStatus::Draft,
            kanban_stage: None,
            doc_status: None,
            integrator: None,
            notes: None,
        }
    }

    #[test]
    fn given_blank_partner_name_when_validating_then_name_is_reported() {
        let err = new_partner("  ", "ACM").validated().err();
        assert_eq!(
            err.map(|e| e.to_string()),
            Some("Partner name is required".to_string())
        );
        assert!(new_partner("Acme", "ACM").validated().is_ok());
    }

    #[test]
    fn given_patch_with_empty_code_when_validating_then_it_is_rejected() {
        let patch = PartnerPatch {
            code: Some(String::new()),
            ..PartnerPatch::default()
        };
        assert!(patch.validated().is_err());
        assert!(PartnerPatch::default().validated().is_ok());
    }

    #[test]
    fn given_null_byte_in_notes_when_validating_then_field_is_named() {
        let patch = PartnerPatch {
            notes: Some("bad\0note".to_string()),
            ..PartnerPatch::default()
        };
        let message = patch.validated().err().map(|e| e.to_string());
        assert_eq!(
            message,
            Some("Null byte is not allowed in field notes".to_string())
        );
    }

    #[test]
    fn given_candidate_addresses_when_checking_email_then_only_plausible_ones_pass() {
        assert!(looks_like_email("ops@acme.io"));
        assert!(!looks_like_email("ops@acme"));
        assert!(!looks_like_email("@acme.io"));
        assert!(!looks_like_email("ops acme@acme.io"));
        assert!(!looks_like_email("a@b@c.io"));
    }

    #[test]
    fn given_person_with_empty_email_when_validating_then_email_is_dropped() {
        let person = NewPerson {
            name: "Dana".to_string(),
            email: Some(String::new()),
            phone: None,
            role: "Integration lead".to_string(),
            notes: None,
            partner_ids: Vec::new(),
            feature_ids: Vec::new(),
        };
        let validated = person.validated().ok();
        assert_eq!(validated.and_then(|p| p.email), None);
    }

    #[test]
    fn given_feature_without_name_when_validating_then_it_is_rejected() {
        let input = FeatureInput {
            name: String::new(),
            category: FeatureCategory::Snap,
            apigee_products: Vec::new(),
            apigee_trace_proxies: Vec::new(),
            notes: None,
        };
        assert!(input.validated().is_err());
    }
}
