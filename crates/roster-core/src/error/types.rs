//! Umbrella error type

use crate::cache::FetchError;
use crate::mutation::MutationError;
use crate::query::QueryError;
use crate::remote::RemoteError;
use crate::session::{AuthError, TokenStorageError};
use crate::validation::ValidationErrors;
use thiserror::Error;

/// Result type alias for roster operations
pub type RosterResult<T> = Result<T, RosterError>;

/// Any failure the core can report
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RosterError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Mutation(#[from] MutationError),

    #[error("Invalid query: {0}")]
    Query(#[from] QueryError),

    #[error("Session storage: {0}")]
    Storage(#[from] TokenStorageError),

    #[error(transparent)]
    Remote(#[from] RemoteError),

    #[error("Configuration error: {message}")]
    Config {
        message: String,
        context: Option<String>,
    },

    #[error("Access denied: {0}")]
    Access(String),
}

impl RosterError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            context: None,
        }
    }

    pub fn config_with_context(message: impl Into<String>, context: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            context: Some(context.into()),
        }
    }

    pub fn access(message: impl Into<String>) -> Self {
        Self::Access(message.into())
    }

    /// Stable code for programmatic handling
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Auth(_) => "ROSTER_AUTH",
            Self::Validation(_) => "ROSTER_VALIDATION",
            Self::Fetch(_) => "ROSTER_FETCH",
            Self::Mutation(_) => "ROSTER_MUTATION",
            Self::Query(_) => "ROSTER_QUERY",
            Self::Storage(_) => "ROSTER_STORAGE",
            Self::Remote(_) => "ROSTER_REMOTE",
            Self::Config { .. } => "ROSTER_CONFIG",
            Self::Access(_) => "ROSTER_ACCESS",
        }
    }

    pub fn context(&self) -> Option<&str> {
        match self {
            Self::Config { context, .. } => context.as_deref(),
            _ => None,
        }
    }

    /// Whether the server rejected the session credentials
    pub fn is_unauthorized(&self) -> bool {
        matches!(
            self,
            Self::Auth(AuthError::Unauthorized | AuthError::Expired)
                | Self::Fetch(FetchError::Unauthorized)
                | Self::Mutation(MutationError::Unauthorized)
                | Self::Remote(RemoteError::Unauthorized)
        )
    }

    /// Whether retrying the same operation later may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Auth(AuthError::Network(_))
                | Self::Fetch(FetchError::Network(_))
                | Self::Mutation(MutationError::Network(_))
                | Self::Remote(RemoteError::Network(_))
        )
    }
}
