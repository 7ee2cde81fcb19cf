//! Company store trait.

use crate::Result;
use crate::models::{Company, CompanyDraft, CompanyFields, CompanyId};

/// Trait for company store backends.
///
/// The store is the authoritative source of truth for companies. It assigns
/// ids for new records, owns `created_at` / `updated_at`, and makes every
/// operation atomic. Absence is reported as `None`; mapping that to a
/// not-found error is the caller's job.
pub trait CompanyStore: Send + Sync {
    /// Retrieves a company by ID.
    fn get(&self, id: &CompanyId) -> Result<Option<Company>>;

    /// Lists all companies ordered by creation time.
    fn list(&self) -> Result<Vec<Company>>;

    /// Lists all companies with every parent ahead of its children.
    ///
    /// Companies are ordered by hierarchy depth, then by creation time, so a
    /// sequential import of the result always finds each `parent_id` stored.
    fn list_parents_first(&self) -> Result<Vec<Company>>;

    /// Creates a company with a fresh UUID v4 id.
    fn create(&self, fields: CompanyFields) -> Result<Company> {
        self.create_with_id(CompanyId::generate(), fields)
    }

    /// Creates a company with a caller-chosen id.
    fn create_with_id(&self, id: CompanyId, fields: CompanyFields) -> Result<Company>;

    /// Overwrites every mutable field of an existing company.
    fn replace(&self, id: &CompanyId, fields: CompanyFields) -> Result<Option<Company>>;

    /// Applies the supplied draft fields to an existing company.
    fn patch(&self, id: &CompanyId, draft: CompanyDraft) -> Result<Option<Company>>;

    /// Deletes a company, orphaning its direct children.
    ///
    /// Returns the number of orphaned children, or `None` if the company
    /// does not exist.
    fn delete(&self, id: &CompanyId) -> Result<Option<usize>>;

    /// Finds a company by exact name.
    fn find_by_name(&self, name: &str) -> Result<Option<Company>>;

    /// Lists the direct children of a company.
    fn children(&self, id: &CompanyId) -> Result<Vec<Company>>;

    /// Checks if a company exists.
    fn exists(&self, id: &CompanyId) -> Result<bool> {
        Ok(self.get(id)?.is_some())
    }

    /// Returns the total count of companies.
    fn count(&self) -> Result<usize> {
        Ok(self.list()?.len())
    }
}
