//! Session management
//!
//! This module provides the client's authentication state:
//! - [`Session`]: a single owned, versioned state value with an explicit
//!   transition function
//! - [`SessionStore`]: login, restore and logout against the directory
//!   service, broadcasting every transition
//! - [`TokenStorage`]: durable persistence of the one active session token

mod state;
mod store;
mod token;

pub use state::{Session, SessionEvent, SessionStatus, TransitionError};
pub use store::SessionStore;
pub use token::{
    FileTokenStorage, MemoryTokenStorage, PersistedSession, SessionToken, TokenStorage,
    TokenStorageError,
};

#[cfg(any(test, feature = "test-support"))]
pub use token::jwt_with_expiry;

use crate::remote::RemoteError;
use thiserror::Error;

/// Authentication failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Session expired, please sign in again")]
    Expired,

    #[error("Not authenticated")]
    Unauthorized,

    #[error("A sign-in is already in progress")]
    LoginInProgress,

    #[error("Sign-in was interrupted by a sign-out")]
    Interrupted,

    #[error("Unable to reach the directory service: {0}")]
    Network(String),

    #[error("Unable to persist session: {0}")]
    Storage(String),
}

impl From<RemoteError> for AuthError {
    fn from(err: RemoteError) -> Self {
        match err {
            RemoteError::InvalidCredentials => Self::InvalidCredentials,
            RemoteError::Unauthorized => Self::Unauthorized,
            RemoteError::Network(message) => Self::Network(message),
            RemoteError::Decode(message) | RemoteError::Rejected(message) => {
                Self::Network(message)
            }
            RemoteError::NotFound(id) => Self::Network(format!("identity {} not found", id)),
        }
    }
}

impl From<TokenStorageError> for AuthError {
    fn from(err: TokenStorageError) -> Self {
        Self::Storage(err.to_string())
    }
}

/// Receiver of "the server rejected our credentials" notifications
///
/// The collection cache and mutation coordinator report `Unauthorized`
/// responses here; the session store clears the session in response.
pub trait UnauthorizedHandler: Send + Sync {
    fn handle_unauthorized(&self);
}
