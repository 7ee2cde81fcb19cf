//! Company input validation.
//!
//! Turns a loosely typed [`FieldMap`] into a typed [`CompanyDraft`], reporting
//! every failing field instead of stopping at the first.

use super::errors::ValidationErrors;
use super::limits::FieldLimits;
use crate::models::{CompanyDraft, CompanyField, CompanyId, FieldMap};
use serde_json::Value;

/// Message for a required field that was not supplied.
pub const MISSING_REQUIRED: &str = "Missing data for required field.";
/// Message for `null` where a value is required.
pub const NOT_NULLABLE: &str = "Field may not be null.";
/// Message for a key that is not a company field.
pub const UNKNOWN_FIELD: &str = "Unknown field.";
/// Message for a store-maintained field supplied by the client.
pub const READ_ONLY: &str = "Read-only field.";
/// Message for a non-string text value.
pub const NOT_A_STRING: &str = "Not a valid string.";
/// Message for an unparseable boolean.
pub const NOT_A_BOOLEAN: &str = "Not a valid boolean.";
/// Message for an empty name.
pub const EMPTY_NAME: &str = "Name cannot be empty.";
/// Message for a malformed email address.
pub const INVALID_EMAIL: &str = "Email must be a valid email address.";
/// Message for a name already used by another company.
pub const NAME_NOT_UNIQUE: &str = "Name must be unique.";
/// Message for a negative, fractional or oversized employee count.
pub const INVALID_EMPLOYEES_COUNT: &str = "Employees count must be a non-negative integer.";

/// Which operation the input is validated for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValidationMode {
    /// New company; `name` required.
    Create,
    /// Full replace of an existing company; `name` required.
    Replace,
    /// Partial update; only supplied fields are checked.
    Patch,
    /// Import row; `name` required, `id` accepted as the upsert key.
    ImportRow,
}

impl ValidationMode {
    /// Returns whether `name` must be present.
    #[must_use]
    pub const fn requires_name(self) -> bool {
        !matches!(self, Self::Patch)
    }

    /// Returns whether `id` (and the exported timestamps) may appear.
    #[must_use]
    pub const fn accepts_id(self) -> bool {
        matches!(self, Self::ImportRow)
    }
}

/// Validates company input against type, format and length rules.
///
/// Referential rules (parent existence, cycles, name uniqueness) need the
/// store and live in [`crate::services::CompanyService`].
#[derive(Debug, Clone, Default)]
pub struct CompanyValidator {
    limits: FieldLimits,
}

impl CompanyValidator {
    /// Creates a validator with the given length bounds.
    #[must_use]
    pub const fn new(limits: FieldLimits) -> Self {
        Self { limits }
    }

    /// Validates input for the given mode.
    ///
    /// # Errors
    ///
    /// Returns every failing field with all of its messages.
    pub fn validate(
        &self,
        input: &FieldMap,
        mode: ValidationMode,
    ) -> Result<CompanyDraft, ValidationErrors> {
        let (draft, errors) = self.check(input, mode);
        errors.into_result(draft)
    }

    /// Validates input and returns the draft alongside any errors.
    ///
    /// The draft holds every field that passed, so callers can run further
    /// checks and report all problems together.
    #[must_use]
    pub fn check(&self, input: &FieldMap, mode: ValidationMode) -> (CompanyDraft, ValidationErrors) {
        let mut draft = CompanyDraft::default();
        let mut errors = ValidationErrors::new();

        for (key, value) in input {
            let Some(field) = CompanyField::parse(key) else {
                errors.add(key.as_str(), UNKNOWN_FIELD);
                continue;
            };
            self.check_field(field, value, mode, &mut draft, &mut errors);
        }

        if mode.requires_name() && draft.name.is_none() && !errors.contains("name") {
            errors.add("name", MISSING_REQUIRED);
        }

        (draft, errors)
    }

    fn check_field(
        &self,
        field: CompanyField,
        value: &Value,
        mode: ValidationMode,
        draft: &mut CompanyDraft,
        errors: &mut ValidationErrors,
    ) {
        match field {
            CompanyField::Id => {
                if mode.accepts_id() {
                    draft.id = self
                        .optional_text(field, value, errors)
                        .flatten()
                        .map(CompanyId::from);
                } else {
                    errors.add(field.as_str(), READ_ONLY);
                }
            },
            CompanyField::CreatedAt | CompanyField::UpdatedAt => {
                // Exported timestamps are tolerated on import and ignored.
                if !mode.accepts_id() {
                    errors.add(field.as_str(), READ_ONLY);
                }
            },
            CompanyField::Name => draft.name = self.name(value, errors),
            // Blank import cells keep the default.
            CompanyField::IsActive if mode == ValidationMode::ImportRow && is_blank(value) => {},
            CompanyField::IsActive => draft.is_active = parse_bool(value, errors),
            CompanyField::EmployeesCount => {
                draft.employees_count = parse_employees_count(value, errors);
            },
            CompanyField::ParentId => {
                draft.parent_id = self
                    .optional_text(field, value, errors)
                    .map(|v| v.map(CompanyId::from));
            },
            CompanyField::Email => {
                let email = self.optional_text(field, value, errors);
                draft.email = check_format(email, errors, field, |s| s.contains('@'));
            },
            CompanyField::LogoUrl => {
                let url = self.optional_text(field, value, errors);
                draft.logo_url = check_format(url, errors, field, is_http_url);
            },
            CompanyField::Website => {
                let url = self.optional_text(field, value, errors);
                draft.website = check_format(url, errors, field, is_http_url);
            },
            CompanyField::Description => {
                draft.description = self.optional_text(field, value, errors);
            },
            CompanyField::OrganizationId => {
                draft.organization_id = self.optional_text(field, value, errors);
            },
            CompanyField::Address => draft.address = self.optional_text(field, value, errors),
            CompanyField::PhoneNumber => {
                draft.phone_number = self.optional_text(field, value, errors);
            },
            CompanyField::RegistrationNumber => {
                draft.registration_number = self.optional_text(field, value, errors);
            },
            CompanyField::TaxId => draft.tax_id = self.optional_text(field, value, errors),
            CompanyField::Country => draft.country = self.optional_text(field, value, errors),
            CompanyField::City => draft.city = self.optional_text(field, value, errors),
            CompanyField::PostalCode => {
                draft.postal_code = self.optional_text(field, value, errors);
            },
        }
    }

    fn name(&self, value: &Value, errors: &mut ValidationErrors) -> Option<String> {
        let field = CompanyField::Name;
        match value {
            Value::Null => {
                errors.add(field.as_str(), NOT_NULLABLE);
                None
            },
            Value::String(s) if s.trim().is_empty() => {
                errors.add(field.as_str(), EMPTY_NAME);
                None
            },
            Value::String(s) => self.within_limit(field, s, errors).then(|| s.clone()),
            _ => {
                errors.add(field.as_str(), NOT_A_STRING);
                None
            },
        }
    }

    /// Parses a nullable text field.
    ///
    /// Returns `None` when the value failed (error recorded), `Some(None)`
    /// for `null` or an empty string.
    fn optional_text(
        &self,
        field: CompanyField,
        value: &Value,
        errors: &mut ValidationErrors,
    ) -> Option<Option<String>> {
        match value {
            Value::Null => Some(None),
            Value::String(s) if s.is_empty() => Some(None),
            Value::String(s) => self.within_limit(field, s, errors).then(|| Some(s.clone())),
            _ => {
                errors.add(field.as_str(), NOT_A_STRING);
                None
            },
        }
    }

    fn within_limit(&self, field: CompanyField, value: &str, errors: &mut ValidationErrors) -> bool {
        let Some(max) = self.limits.max_len(field) else {
            return true;
        };
        if value.chars().count() > max {
            errors.add(
                field.as_str(),
                format!("{} cannot exceed {max} characters.", label(field)),
            );
            return false;
        }
        true
    }
}

fn check_format(
    value: Option<Option<String>>,
    errors: &mut ValidationErrors,
    field: CompanyField,
    is_valid: impl Fn(&str) -> bool,
) -> Option<Option<String>> {
    match value {
        Some(Some(s)) if !is_valid(&s) => {
            let message = if field == CompanyField::Email {
                INVALID_EMAIL.to_string()
            } else {
                format!("{} must be a valid URL.", label(field))
            };
            errors.add(field.as_str(), message);
            None
        },
        other => other,
    }
}

fn is_http_url(value: &str) -> bool {
    let lower = value.to_ascii_lowercase();
    ["http://", "https://"]
        .iter()
        .any(|scheme| lower.len() > scheme.len() && lower.starts_with(scheme))
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

fn parse_bool(value: &Value, errors: &mut ValidationErrors) -> Option<bool> {
    let parsed = match value {
        Value::Null => {
            errors.add(CompanyField::IsActive.as_str(), NOT_NULLABLE);
            return None;
        },
        Value::Bool(b) => Some(*b),
        Value::Number(n) => match n.as_u64() {
            Some(0) => Some(false),
            Some(1) => Some(true),
            _ => None,
        },
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "y" | "on" => Some(true),
            "false" | "0" | "no" | "n" | "off" => Some(false),
            _ => None,
        },
        _ => None,
    };
    if parsed.is_none() {
        errors.add(CompanyField::IsActive.as_str(), NOT_A_BOOLEAN);
    }
    parsed
}

fn parse_employees_count(value: &Value, errors: &mut ValidationErrors) -> Option<Option<u32>> {
    let parsed = match value {
        Value::Null => return Some(None),
        Value::String(s) if s.trim().is_empty() => return Some(None),
        Value::Number(n) => n.as_u64().and_then(|v| u32::try_from(v).ok()),
        Value::String(s) => s.trim().parse::<u32>().ok(),
        _ => None,
    };
    if parsed.is_none() {
        errors.add(
            CompanyField::EmployeesCount.as_str(),
            INVALID_EMPLOYEES_COUNT,
        );
        return None;
    }
    Some(parsed)
}

const fn label(field: CompanyField) -> &'static str {
    match field {
        CompanyField::Id => "ID",
        CompanyField::Name => "Name",
        CompanyField::Description => "Description",
        CompanyField::LogoUrl => "Logo URL",
        CompanyField::ParentId => "Parent ID",
        CompanyField::OrganizationId => "Organization ID",
        CompanyField::Address => "Address",
        CompanyField::Email => "Email",
        CompanyField::PhoneNumber => "Phone number",
        CompanyField::Website => "Website",
        CompanyField::RegistrationNumber => "Registration number",
        CompanyField::TaxId => "Tax ID",
        CompanyField::Country => "Country",
        CompanyField::City => "City",
        CompanyField::PostalCode => "Postal code",
        CompanyField::CreatedAt
        | CompanyField::UpdatedAt
        | CompanyField::IsActive
        | CompanyField::EmployeesCount => field.as_str(),
    }
}
