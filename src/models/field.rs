//! Company field names.

use serde::{Deserialize, Serialize};

/// A named company field, in wire/column order.
///
/// The string forms are the JSON keys and CSV headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompanyField {
    /// Identifier.
    Id,
    /// Display name.
    Name,
    /// Description.
    Description,
    /// Logo URL.
    LogoUrl,
    /// Parent company.
    ParentId,
    /// External organization reference.
    OrganizationId,
    /// Postal address.
    Address,
    /// Contact email.
    Email,
    /// Contact phone number.
    PhoneNumber,
    /// Website.
    Website,
    /// Creation timestamp.
    CreatedAt,
    /// Update timestamp.
    UpdatedAt,
    /// Active flag.
    IsActive,
    /// Registration number.
    RegistrationNumber,
    /// Tax identifier.
    TaxId,
    /// Country.
    Country,
    /// City.
    City,
    /// Postal code.
    PostalCode,
    /// Employee count.
    EmployeesCount,
}

impl CompanyField {
    /// Returns all fields in column order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Id,
            Self::Name,
            Self::Description,
            Self::LogoUrl,
            Self::ParentId,
            Self::OrganizationId,
            Self::Address,
            Self::Email,
            Self::PhoneNumber,
            Self::Website,
            Self::CreatedAt,
            Self::UpdatedAt,
            Self::IsActive,
            Self::RegistrationNumber,
            Self::TaxId,
            Self::Country,
            Self::City,
            Self::PostalCode,
            Self::EmployeesCount,
        ]
    }

    /// Returns the string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Name => "name",
            Self::Description => "description",
            Self::LogoUrl => "logo_url",
            Self::ParentId => "parent_id",
            Self::OrganizationId => "organization_id",
            Self::Address => "address",
            Self::Email => "email",
            Self::PhoneNumber => "phone_number",
            Self::Website => "website",
            Self::CreatedAt => "created_at",
            Self::UpdatedAt => "updated_at",
            Self::IsActive => "is_active",
            Self::RegistrationNumber => "registration_number",
            Self::TaxId => "tax_id",
            Self::Country => "country",
            Self::City => "city",
            Self::PostalCode => "postal_code",
            Self::EmployeesCount => "employees_count",
        }
    }

    /// Parses a field name.
    ///
    /// Returns `None` if the field name is not recognized. Matching is exact
    /// so that unknown keys are reported rather than silently mapped.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        Self::all().iter().copied().find(|field| field.as_str() == s)
    }

    /// Returns whether the field is maintained by the store.
    #[must_use]
    pub const fn is_read_only(&self) -> bool {
        matches!(self, Self::Id | Self::CreatedAt | Self::UpdatedAt)
    }
}

impl std::fmt::Display for CompanyField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
