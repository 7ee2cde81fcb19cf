//! Storage backend traits.

mod company;

pub use company::CompanyStore;
