//! Boundary to the remote directory service
//!
//! [`EmployeeService`] is the seam every other layer talks through.
//! [`GraphqlClient`] is the production implementation; tests substitute
//! a mock or the in-memory directory from `testing`.

mod documents;
mod graphql;
mod wire;

pub use documents::Operation;
pub use graphql::GraphqlClient;
pub use wire::decode_response;

use crate::model::{
    EmployeeChanges, EmployeeConnection, EmployeeId, EmployeeRecord, EmploymentStatus,
    LoginGrant, NewEmployee, StatusChange, UserIdentity,
};
use crate::query::QuerySpec;
use async_trait::async_trait;
use thiserror::Error;

/// Result type for remote calls
pub type RemoteResult<T> = Result<T, RemoteError>;

/// How a remote call failed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteError {
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Not authenticated")]
    Unauthorized,

    #[error("Network error: {0}")]
    Network(String),

    #[error("{0}")]
    Rejected(String),

    #[error("Unexpected response: {0}")]
    Decode(String),

    #[error("Employee {0} not found")]
    NotFound(EmployeeId),
}

/// Operations offered by the directory service
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EmployeeService: Send + Sync {
    /// Exchange credentials for a token and identity
    async fn login(&self, email: &str, password: &str) -> RemoteResult<LoginGrant>;

    /// Identity bound to the current bearer token
    async fn identity_probe(&self) -> RemoteResult<UserIdentity>;

    async fn list_employees(&self, spec: &QuerySpec) -> RemoteResult<EmployeeConnection>;

    async fn get_employee(&self, id: &EmployeeId) -> RemoteResult<EmployeeRecord>;

    async fn create_employee(&self, input: &NewEmployee) -> RemoteResult<EmployeeRecord>;

    async fn update_employee(
        &self,
        id: &EmployeeId,
        changes: &EmployeeChanges,
    ) -> RemoteResult<EmployeeRecord>;

    async fn update_employee_status(
        &self,
        id: &EmployeeId,
        status: EmploymentStatus,
    ) -> RemoteResult<StatusChange>;

    /// `true` when the record existed and was removed
    async fn delete_employee(&self, id: &EmployeeId) -> RemoteResult<bool>;
}
