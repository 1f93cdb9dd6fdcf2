//! Mutation coordinator
//!
//! Sends create/update/status/delete operations to the directory service and
//! re-synchronizes the collection cache after each one succeeds. Nothing is
//! applied locally ahead of the server's confirmation.

mod coordinator;
mod inflight;

pub use coordinator::MutationCoordinator;
pub use inflight::MutationKey;

use crate::model::EmployeeId;
use crate::remote::RemoteError;
use thiserror::Error;

/// Why a mutation did not take effect
///
/// On any of these the caches are left exactly as they were.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MutationError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("{0}")]
    Rejected(String),

    #[error("Not authenticated")]
    Unauthorized,

    #[error("Employee {0} not found")]
    NotFound(EmployeeId),
}

impl From<RemoteError> for MutationError {
    fn from(err: RemoteError) -> Self {
        match err {
            RemoteError::Network(message) => Self::Network(message),
            RemoteError::Decode(message) => Self::Network(format!("unexpected response: {}", message)),
            RemoteError::Rejected(message) => Self::Rejected(message),
            RemoteError::Unauthorized | RemoteError::InvalidCredentials => Self::Unauthorized,
            RemoteError::NotFound(id) => Self::NotFound(id),
        }
    }
}

/// Acknowledgement of a deletion
///
/// Callers use the id to close any detail view still showing the record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deleted {
    pub id: EmployeeId,
}
