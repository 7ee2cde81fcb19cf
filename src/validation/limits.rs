//! Length bounds for company text fields.

use crate::models::CompanyField;
use serde::{Deserialize, Serialize};

/// Maximum lengths (in characters) for text fields.
///
/// Loaded from the `[limits]` section of the config file; any key left out
/// keeps its default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldLimits {
    /// Explicit ids on import rows.
    pub id: usize,
    /// Company name.
    pub name: usize,
    /// Description.
    pub description: usize,
    /// Logo URL.
    pub logo_url: usize,
    /// Parent reference.
    pub parent_id: usize,
    /// Organization reference.
    pub organization_id: usize,
    /// Postal address.
    pub address: usize,
    /// Contact email.
    pub email: usize,
    /// Phone number.
    pub phone_number: usize,
    /// Website.
    pub website: usize,
    /// Registration number.
    pub registration_number: usize,
    /// Tax identifier.
    pub tax_id: usize,
    /// Country.
    pub country: usize,
    /// City.
    pub city: usize,
    /// Postal code.
    pub postal_code: usize,
}

impl Default for FieldLimits {
    fn default() -> Self {
        Self {
            id: 40,
            name: 100,
            description: 500,
            logo_url: 255,
            parent_id: 40,
            organization_id: 100,
            address: 255,
            email: 100,
            phone_number: 20,
            website: 100,
            registration_number: 100,
            tax_id: 50,
            country: 100,
            city: 100,
            postal_code: 20,
        }
    }
}

impl FieldLimits {
    /// Returns the bound for a text field, or `None` for non-text fields.
    #[must_use]
    pub const fn max_len(&self, field: CompanyField) -> Option<usize> {
        match field {
            CompanyField::Id => Some(self.id),
            CompanyField::Name => Some(self.name),
            CompanyField::Description => Some(self.description),
            CompanyField::LogoUrl => Some(self.logo_url),
            CompanyField::ParentId => Some(self.parent_id),
            CompanyField::OrganizationId => Some(self.organization_id),
            CompanyField::Address => Some(self.address),
            CompanyField::Email => Some(self.email),
            CompanyField::PhoneNumber => Some(self.phone_number),
            CompanyField::Website => Some(self.website),
            CompanyField::RegistrationNumber => Some(self.registration_number),
            CompanyField::TaxId => Some(self.tax_id),
            CompanyField::Country => Some(self.country),
            CompanyField::City => Some(self.city),
            CompanyField::PostalCode => Some(self.postal_code),
            CompanyField::CreatedAt
            | CompanyField::UpdatedAt
            | CompanyField::IsActive
            | CompanyField::EmployeesCount => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let limits = FieldLimits::default();
        assert_eq!(limits.max_len(CompanyField::Name), Some(100));
        assert_eq!(limits.max_len(CompanyField::PhoneNumber), Some(20));
        assert_eq!(limits.max_len(CompanyField::IsActive), None);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let limits: FieldLimits = toml::from_str("name = 10\n").unwrap();
        assert_eq!(limits.name, 10);
        assert_eq!(limits.description, 500);
    }
}
