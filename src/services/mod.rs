//! Business logic services.
//!
//! Services orchestrate storage backends and provide high-level operations.

mod companies;

pub use companies::{
    CompanyService, HIERARCHY_TOO_DEEP, MAX_HIERARCHY_DEPTH, PARENT_CYCLE, PARENT_NOT_FOUND,
    SELF_PARENT, UpsertOutcome,
};
