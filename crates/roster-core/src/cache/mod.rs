//! Collection cache
//!
//! Holds one page per distinct [`QuerySpec`](crate::query::QuerySpec) and
//! keeps it in step with the directory service:
//! - stale-while-revalidate reads with at most one fetch in flight per spec
//! - change notification to every [`QueryView`] watching a spec
//! - whole-cache invalidation after mutations, with an epoch guard so data
//!   fetched before a mutation is never reported fresh after it

mod collection;
mod page;
mod registry;
mod view;


pub use collection::{CacheStats, CollectionCache};
pub use page::{CollectionPage, Freshness};
pub use registry::{DependencyRegistry, Invalidation, MutationKind};
pub use view::QueryView;

use crate::remote::RemoteError;
use thiserror::Error;

/// Why a page could not be fetched
///
/// Cloneable so that every waiter on a shared fetch receives the same error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Not authenticated")]
    Unauthorized,

    #[error("Unexpected response: {0}")]
    Decode(String),

    #[error("Query rejected: {0}")]
    Rejected(String),
}

impl From<RemoteError> for FetchError {
    fn from(err: RemoteError) -> Self {
        match err {
            RemoteError::Network(message) => Self::Network(message),
            RemoteError::Unauthorized | RemoteError::InvalidCredentials => Self::Unauthorized,
            RemoteError::Decode(message) => Self::Decode(message),
            RemoteError::Rejected(message) => Self::Rejected(message),
            RemoteError::NotFound(id) => Self::Rejected(format!("employee {} not found", id)),
        }
    }
}
