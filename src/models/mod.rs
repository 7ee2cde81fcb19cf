//! Data models for the company registry.
//!
//! This module contains the company record, its identifiers and the field
//! catalogue shared by validation, storage and the import/export formats.

mod company;
mod field;

pub use company::{Company, CompanyDraft, CompanyFields, CompanyId};
pub use field::CompanyField;

/// Loosely typed input: a JSON object or a CSV row keyed by column name.
///
/// Kept untyped until validation so type problems surface as field errors.
pub type FieldMap = serde_json::Map<String, serde_json::Value>;
