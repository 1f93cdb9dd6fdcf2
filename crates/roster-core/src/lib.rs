//! Roster Core Library
//!
//! This crate provides the client-side core of the Roster employee console:
//! the session state machine, the authorization gate, query construction, the
//! collection cache and the mutation coordinator, all talking to the remote
//! directory service through the [`remote::EmployeeService`] boundary.

// Allow common clippy lints that are stylistic preferences
#![allow(clippy::collapsible_if)]
#![allow(clippy::type_complexity)]
#![allow(clippy::new_without_default)]

pub mod auth;
pub mod cache;
pub mod concurrency;
pub mod config;
pub mod detail;
pub mod error;
pub mod model;
pub mod mutation;
pub mod query;
pub mod remote;
pub mod session;
pub mod validation;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

// Re-export commonly used types
pub use auth::{Access, AdminGrant, Affordances, Capability, Route};
pub use cache::{CacheStats, CollectionCache, CollectionPage, FetchError, Freshness, QueryView};
pub use concurrency::{ReadyGate, ReadySignal, SharedToken};
pub use config::{RosterConfig, load_config};
pub use detail::DetailView;
pub use error::{RosterError, RosterResult};
pub use model::{
    EmployeeChanges, EmployeeId, EmployeeRecord, EmploymentStatus, NewEmployee, PageInfo, Role,
    StatusChange, UserIdentity,
};
pub use mutation::{Deleted, MutationCoordinator, MutationError};
pub use query::{QueryError, QuerySpec, QuerySpecBuilder, SortField, SortOrder};
pub use remote::{EmployeeService, GraphqlClient, RemoteError};
pub use session::{AuthError, Session, SessionStatus, SessionStore};
pub use validation::{Validated, ValidationError, ValidationErrors};
