//! Input validation for company writes.
//!
//! # Rules
//!
//! | Rule | Modes |
//! |------|-------|
//! | `name` present and non-empty | create, replace, import row |
//! | Text fields are strings within [`FieldLimits`] | all |
//! | `email` contains `@` | all |
//! | `logo_url` / `website` use `http://` or `https://` | all |
//! | `employees_count` is a non-negative integer | all |
//! | `is_active` is a boolean (CSV spellings accepted) | all |
//! | `id`, `created_at`, `updated_at` are read-only | create, replace, patch |
//! | Unknown keys are rejected | all |
//! | `name` is unique ([`NAME_NOT_UNIQUE`]) | checked by the service, enforced by the store |
//!
//! Referential rules are applied by [`crate::services::CompanyService`] and
//! merged into the same [`ValidationErrors`].

mod company;
mod errors;
mod limits;

pub use company::{
    CompanyValidator, EMPTY_NAME, INVALID_EMAIL, INVALID_EMPLOYEES_COUNT, MISSING_REQUIRED,
    NAME_NOT_UNIQUE, NOT_A_BOOLEAN, NOT_A_STRING, NOT_NULLABLE, READ_ONLY, UNKNOWN_FIELD,
    ValidationMode,
};
pub use errors::ValidationErrors;
pub use limits::FieldLimits;
