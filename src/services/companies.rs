//! Company CRUD service.
//!
//! Validates input, applies the referential rules that need the store
//! (parent existence, cycles, name uniqueness) and writes through a
//! [`CompanyStore`].

use crate::models::{Company, CompanyDraft, CompanyId, FieldMap};
use crate::storage::CompanyStore;
use crate::validation::{
    CompanyValidator, MISSING_REQUIRED, NAME_NOT_UNIQUE, ValidationErrors, ValidationMode,
};
use crate::{Error, Result};
use std::sync::Arc;
use tracing::instrument;

/// Message for a `parent_id` that names no company.
pub const PARENT_NOT_FOUND: &str = "Parent company does not exist.";
/// Message for a company assigned as its own parent.
pub const SELF_PARENT: &str = "A company cannot be its own parent.";
/// Message for a parent whose ancestor chain contains the company.
pub const PARENT_CYCLE: &str = "Parent assignment would create a cycle.";
/// Message for a parent chain longer than [`MAX_HIERARCHY_DEPTH`].
pub const HIERARCHY_TOO_DEEP: &str = "Company hierarchy is too deep.";

/// Upper bound on ancestor walks.
pub const MAX_HIERARCHY_DEPTH: usize = 64;

/// Result of an import upsert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// A new company was stored.
    Created(Company),
    /// An existing company was replaced.
    Updated(Company),
}

impl UpsertOutcome {
    /// Returns the stored company.
    #[must_use]
    pub const fn company(&self) -> &Company {
        match self {
            Self::Created(company) | Self::Updated(company) => company,
        }
    }

    /// Returns `true` if the upsert created a company.
    #[must_use]
    pub const fn is_created(&self) -> bool {
        matches!(self, Self::Created(_))
    }
}

/// Service for company CRUD and hierarchy queries.
#[derive(Clone)]
pub struct CompanyService {
    store: Arc<dyn CompanyStore>,
    validator: CompanyValidator,
}

impl CompanyService {
    /// Creates a service over a store.
    #[must_use]
    pub fn new(store: Arc<dyn CompanyStore>, validator: CompanyValidator) -> Self {
        Self { store, validator }
    }

    /// Fetches a company.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for an unknown id.
    #[instrument(skip(self), fields(operation = "get", company.id = %id))]
    pub fn get(&self, id: &CompanyId) -> Result<Company> {
        let result = self.require(id);
        record("get", &result);
        result
    }

    /// Lists every company in creation order.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    #[instrument(skip(self), fields(operation = "list"))]
    pub fn list(&self) -> Result<Vec<Company>> {
        let result = self.store.list();
        record("list", &result);
        result
    }

    /// Creates a company from request input.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] listing every failing field.
    #[instrument(skip(self, input), fields(operation = "create"))]
    pub fn create(&self, input: &FieldMap) -> Result<Company> {
        let result = self
            .validated(input, ValidationMode::Create, None)
            .and_then(|draft| self.store.create(into_fields(draft)?));
        log_write("create", &result);
        record("create", &result);
        result
    }

    /// Replaces every mutable field of a company.
    ///
    /// Fields left out of `input` are reset to their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for an unknown id, checked before validation.
    #[instrument(skip(self, input), fields(operation = "replace", company.id = %id))]
    pub fn replace(&self, id: &CompanyId, input: &FieldMap) -> Result<Company> {
        let result = self.require(id).and_then(|_| {
            let draft = self.validated(input, ValidationMode::Replace, Some(id))?;
            self.store
                .replace(id, into_fields(draft)?)?
                .ok_or_else(|| Error::company_not_found(id))
        });
        log_write("replace", &result);
        record("replace", &result);
        result
    }

    /// Updates the supplied fields of a company.
    ///
    /// An explicit `null` clears an optional field.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for an unknown id, checked before validation.
    #[instrument(skip(self, input), fields(operation = "patch", company.id = %id))]
    pub fn patch(&self, id: &CompanyId, input: &FieldMap) -> Result<Company> {
        let result = self.require(id).and_then(|_| {
            let draft = self.validated(input, ValidationMode::Patch, Some(id))?;
            self.store
                .patch(id, draft)?
                .ok_or_else(|| Error::company_not_found(id))
        });
        log_write("patch", &result);
        record("patch", &result);
        result
    }

    /// Deletes a company and returns how many children were orphaned.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for an unknown id.
    #[instrument(skip(self), fields(operation = "delete", company.id = %id))]
    pub fn delete(&self, id: &CompanyId) -> Result<usize> {
        let result = self
            .store
            .delete(id)
            .and_then(|orphaned| orphaned.ok_or_else(|| Error::company_not_found(id)));
        match &result {
            Ok(orphaned) => tracing::info!(orphaned, "Deleted company"),
            Err(e) => tracing::warn!(error = %e, "Delete failed"),
        }
        record("delete", &result);
        result
    }

    /// Lists the direct children of a company.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for an unknown id.
    #[instrument(skip(self), fields(operation = "children", company.id = %id))]
    pub fn children(&self, id: &CompanyId) -> Result<Vec<Company>> {
        let result = self.require(id).and_then(|_| self.store.children(id));
        record("children", &result);
        result
    }

    /// Returns the parent chain of a company, nearest first.
    ///
    /// The walk stops after [`MAX_HIERARCHY_DEPTH`] steps or on a repeated
    /// id, so corrupt data cannot loop.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for an unknown id.
    #[instrument(skip(self), fields(operation = "ancestors", company.id = %id))]
    pub fn ancestors(&self, id: &CompanyId) -> Result<Vec<Company>> {
        let result = self.require(id).and_then(|company| {
            let mut chain: Vec<Company> = Vec::new();
            let mut next = company.parent_id;
            while let Some(parent_id) = next {
                if chain.len() >= MAX_HIERARCHY_DEPTH
                    || parent_id == *id
                    || chain.iter().any(|c| c.id == parent_id)
                {
                    tracing::warn!(parent.id = %parent_id, depth = chain.len(), "Stopping ancestor walk");
                    break;
                }
                let Some(parent) = self.store.get(&parent_id)? else {
                    break;
                };
                next = parent.parent_id.clone();
                chain.push(parent);
            }
            Ok(chain)
        });
        record("ancestors", &result);
        result
    }

    /// Validates an import row and upserts it keyed on `id`.
    ///
    /// - `id` names an existing company: every mutable field is replaced
    /// - `id` is unknown: a company is created with that id
    /// - no `id`: a company is created with a fresh id
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] listing every failing field, or a store error.
    #[instrument(skip(self, input), fields(operation = "upsert"))]
    pub fn import_row(&self, input: &FieldMap) -> Result<UpsertOutcome> {
        let (draft, mut errors) = self.validator.check(input, ValidationMode::ImportRow);
        let result = self
            .reference_errors(&draft, draft.id.as_ref())
            .and_then(|reference| {
                errors.merge(reference);
                errors.into_result(draft).map_err(Error::Validation)
            })
            .and_then(|draft| self.write_upsert(draft));
        record("upsert", &result);
        result
    }

    fn write_upsert(&self, mut draft: CompanyDraft) -> Result<UpsertOutcome> {
        let Some(id) = draft.id.take() else {
            return Ok(UpsertOutcome::Created(self.store.create(into_fields(draft)?)?));
        };
        let fields = into_fields(draft)?;
        if self.store.exists(&id)? {
            let company = self
                .store
                .replace(&id, fields)?
                .ok_or_else(|| Error::company_not_found(&id))?;
            tracing::debug!(company.id = %id, "Import row updated company");
            Ok(UpsertOutcome::Updated(company))
        } else {
            let company = self.store.create_with_id(id, fields)?;
            tracing::debug!(company.id = %company.id, "Import row created company");
            Ok(UpsertOutcome::Created(company))
        }
    }

    fn require(&self, id: &CompanyId) -> Result<Company> {
        self.store
            .get(id)?
            .ok_or_else(|| Error::company_not_found(id))
    }

    /// Runs field validation and the referential rules, merging both error sets.
    fn validated(
        &self,
        input: &FieldMap,
        mode: ValidationMode,
        target: Option<&CompanyId>,
    ) -> Result<CompanyDraft> {
        let (draft, mut errors) = self.validator.check(input, mode);
        errors.merge(self.reference_errors(&draft, target)?);
        errors.into_result(draft).map_err(Error::Validation)
    }

    /// Checks the rules that need the store.
    ///
    /// `target` is the company being written, if it already has an id.
    fn reference_errors(
        &self,
        draft: &CompanyDraft,
        target: Option<&CompanyId>,
    ) -> Result<ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if let Some(name) = &draft.name {
            if let Some(other) = self.store.find_by_name(name)? {
                if Some(&other.id) != target {
                    errors.add("name", NAME_NOT_UNIQUE);
                }
            }
        }

        if let Some(parent_id) = draft.assigned_parent() {
            if Some(parent_id) == target {
                errors.add("parent_id", SELF_PARENT);
            } else if !self.store.exists(parent_id)? {
                errors.add("parent_id", PARENT_NOT_FOUND);
            } else if let Some(target) = target {
                if let Some(message) = self.cycle_error(target, parent_id)? {
                    errors.add("parent_id", message);
                }
            }
        }

        Ok(errors)
    }

    /// Walks up from `parent` looking for `target`.
    fn cycle_error(&self, target: &CompanyId, parent: &CompanyId) -> Result<Option<&'static str>> {
        let mut current = Some(parent.clone());
        for _ in 0..MAX_HIERARCHY_DEPTH {
            let Some(id) = current else {
                return Ok(None);
            };
            if id == *target {
                return Ok(Some(PARENT_CYCLE));
            }
            current = self.store.get(&id)?.and_then(|c| c.parent_id);
        }
        Ok(current.map(|_| HIERARCHY_TOO_DEEP))
    }
}

fn into_fields(draft: CompanyDraft) -> Result<crate::models::CompanyFields> {
    draft
        .into_fields()
        .ok_or_else(|| Error::Validation(ValidationErrors::single("name", MISSING_REQUIRED)))
}

fn log_write(operation: &'static str, result: &Result<Company>) {
    match result {
        Ok(company) => tracing::info!(operation, company.id = %company.id, "Company written"),
        Err(Error::Validation(errors)) => {
            tracing::warn!(operation, fields = errors.len(), errors = %errors, "Validation error");
        },
        Err(e) => tracing::warn!(operation, error = %e, "Company write failed"),
    }
}

fn record<T>(operation: &'static str, result: &Result<T>) {
    let status = match result {
        Ok(_) => "success",
        Err(Error::NotFound { .. }) => "not_found",
        Err(Error::Validation(_)) => "invalid",
        Err(_) => "error",
    };
    metrics::counter!(
        "company_operations_total",
        "operation" => operation,
        "status" => status
    )
    .increment(1);
}
