//! Query construction for the employee collection
//!
//! A [`QuerySpec`] is the canonical descriptor of one page request: filter,
//! sort, page size and cursor. Specs are produced by [`QuerySpecBuilder`],
//! which normalizes raw user input so that logically identical inputs yield
//! equal specs. Spec equality is the collection cache's partition key.

mod builder;
mod spec;

pub use builder::QuerySpecBuilder;
pub use spec::{
    DEFAULT_PAGE_SIZE, EmployeeFilter, MAX_PAGE_SIZE, QuerySpec, SortField, SortOrder, SortSpec,
};

use thiserror::Error;

/// Rejected query input
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("unknown query parameter: {0}")]
    UnknownKey(String),

    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("query parameter given more than once with different values: {0}")]
    DuplicateKey(String),
}
