//! Company records and identifiers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a company.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompanyId(String);

impl CompanyId {
    /// Creates a company ID from an existing value.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generates a fresh random (UUID v4) identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Returns the ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CompanyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for CompanyId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for CompanyId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A stored company.
///
/// Field order matches the JSON body and the CSV export column order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Company {
    /// Unique identifier, immutable after creation.
    pub id: CompanyId,
    /// Display name, non-empty and unique.
    pub name: String,
    /// Free-form description.
    pub description: Option<String>,
    /// Logo location (`http://` or `https://`).
    pub logo_url: Option<String>,
    /// Parent company in the hierarchy.
    pub parent_id: Option<CompanyId>,
    /// External organization reference (not checked).
    pub organization_id: Option<String>,
    /// Postal address.
    pub address: Option<String>,
    /// Contact email.
    pub email: Option<String>,
    /// Contact phone number.
    pub phone_number: Option<String>,
    /// Website (`http://` or `https://`).
    pub website: Option<String>,
    /// Creation time, set by the store.
    pub created_at: DateTime<Utc>,
    /// Last mutation time, set by the store.
    pub updated_at: DateTime<Utc>,
    /// Whether the company is active.
    pub is_active: bool,
    /// Company registration number.
    pub registration_number: Option<String>,
    /// Tax identifier.
    pub tax_id: Option<String>,
    /// Country.
    pub country: Option<String>,
    /// City.
    pub city: Option<String>,
    /// Postal code.
    pub postal_code: Option<String>,
    /// Number of employees.
    pub employees_count: Option<u32>,
}

impl Company {
    /// Returns the mutable fields of this company.
    #[must_use]
    pub fn fields(&self) -> CompanyFields {
        CompanyFields {
            name: self.name.clone(),
            description: self.description.clone(),
            logo_url: self.logo_url.clone(),
            parent_id: self.parent_id.clone(),
            organization_id: self.organization_id.clone(),
            address: self.address.clone(),
            email: self.email.clone(),
            phone_number: self.phone_number.clone(),
            website: self.website.clone(),
            is_active: self.is_active,
            registration_number: self.registration_number.clone(),
            tax_id: self.tax_id.clone(),
            country: self.country.clone(),
            city: self.city.clone(),
            postal_code: self.postal_code.clone(),
            employees_count: self.employees_count,
        }
    }
}

/// Every client-writable field of a company.
///
/// Used for create and full replace; the store owns `id` and the timestamps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompanyFields {
    /// Display name.
    pub name: String,
    /// Free-form description.
    pub description: Option<String>,
    /// Logo location.
    pub logo_url: Option<String>,
    /// Parent company.
    pub parent_id: Option<CompanyId>,
    /// External organization reference.
    pub organization_id: Option<String>,
    /// Postal address.
    pub address: Option<String>,
    /// Contact email.
    pub email: Option<String>,
    /// Contact phone number.
    pub phone_number: Option<String>,
    /// Website.
    pub website: Option<String>,
    /// Whether the company is active.
    pub is_active: bool,
    /// Company registration number.
    pub registration_number: Option<String>,
    /// Tax identifier.
    pub tax_id: Option<String>,
    /// Country.
    pub country: Option<String>,
    /// City.
    pub city: Option<String>,
    /// Postal code.
    pub postal_code: Option<String>,
    /// Number of employees.
    pub employees_count: Option<u32>,
}

impl CompanyFields {
    /// Creates fields with just a name; everything else takes its default.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            logo_url: None,
            parent_id: None,
            organization_id: None,
            address: None,
            email: None,
            phone_number: None,
            website: None,
            is_active: true,
            registration_number: None,
            tax_id: None,
            country: None,
            city: None,
            postal_code: None,
            employees_count: None,
        }
    }

    /// Sets the parent company.
    #[must_use]
    pub fn with_parent(mut self, parent_id: CompanyId) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    /// Sets the contact email.
    #[must_use]
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Sets the employee count.
    #[must_use]
    pub const fn with_employees_count(mut self, count: u32) -> Self {
        self.employees_count = Some(count);
        self
    }

    /// Sets the active flag.
    #[must_use]
    pub const fn with_active(mut self, is_active: bool) -> Self {
        self.is_active = is_active;
        self
    }
}

/// A validated, possibly partial set of company fields.
///
/// Produced by the validator for every mode. The outer `Option` says whether
/// the field was supplied at all; for nullable fields the inner `Option`
/// distinguishes an explicit `null` (clear) from a value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompanyDraft {
    /// Explicit identifier (import rows only).
    pub id: Option<CompanyId>,
    /// Display name.
    pub name: Option<String>,
    /// Free-form description.
    pub description: Option<Option<String>>,
    /// Logo location.
    pub logo_url: Option<Option<String>>,
    /// Parent company.
    pub parent_id: Option<Option<CompanyId>>,
    /// External organization reference.
    pub organization_id: Option<Option<String>>,
    /// Postal address.
    pub address: Option<Option<String>>,
    /// Contact email.
    pub email: Option<Option<String>>,
    /// Contact phone number.
    pub phone_number: Option<Option<String>>,
    /// Website.
    pub website: Option<Option<String>>,
    /// Whether the company is active.
    pub is_active: Option<bool>,
    /// Company registration number.
    pub registration_number: Option<Option<String>>,
    /// Tax identifier.
    pub tax_id: Option<Option<String>>,
    /// Country.
    pub country: Option<Option<String>>,
    /// City.
    pub city: Option<Option<String>>,
    /// Postal code.
    pub postal_code: Option<Option<String>>,
    /// Number of employees.
    pub employees_count: Option<Option<u32>>,
}

impl CompanyDraft {
    /// Applies every supplied field onto `fields`, leaving the rest untouched.
    pub fn apply_to(self, fields: &mut CompanyFields) {
        if let Some(name) = self.name {
            fields.name = name;
        }
        if let Some(v) = self.description {
            fields.description = v;
        }
        if let Some(v) = self.logo_url {
            fields.logo_url = v;
        }
        if let Some(v) = self.parent_id {
            fields.parent_id = v;
        }
        if let Some(v) = self.organization_id {
            fields.organization_id = v;
        }
        if let Some(v) = self.address {
            fields.address = v;
        }
        if let Some(v) = self.email {
            fields.email = v;
        }
        if let Some(v) = self.phone_number {
            fields.phone_number = v;
        }
        if let Some(v) = self.website {
            fields.website = v;
        }
        if let Some(v) = self.is_active {
            fields.is_active = v;
        }
        if let Some(v) = self.registration_number {
            fields.registration_number = v;
        }
        if let Some(v) = self.tax_id {
            fields.tax_id = v;
        }
        if let Some(v) = self.country {
            fields.country = v;
        }
        if let Some(v) = self.city {
            fields.city = v;
        }
        if let Some(v) = self.postal_code {
            fields.postal_code = v;
        }
        if let Some(v) = self.employees_count {
            fields.employees_count = v;
        }
    }

    /// Builds a complete field set, resetting anything not supplied to its default.
    ///
    /// Returns `None` when no name was supplied.
    #[must_use]
    pub fn into_fields(self) -> Option<CompanyFields> {
        let name = self.name.clone()?;
        let mut fields = CompanyFields::new(name);
        self.apply_to(&mut fields);
        Some(fields)
    }

    /// Returns the parent the draft assigns, if it assigns one.
    #[must_use]
    pub fn assigned_parent(&self) -> Option<&CompanyId> {
        self.parent_id.as_ref().and_then(Option::as_ref)
    }
}
