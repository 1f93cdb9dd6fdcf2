//! Session state value and its transition function

use crate::model::UserIdentity;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Authentication status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Unauthenticated,
    Authenticating,
    Authenticated,
    Error,
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Unauthenticated => "unauthenticated",
            Self::Authenticating => "authenticating",
            Self::Authenticated => "authenticated",
            Self::Error => "error",
        };
        f.write_str(name)
    }
}

/// Inputs to [`Session::apply`]
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// Credentials sent to the service
    LoginStarted,
    /// Service accepted the credentials
    LoginSucceeded(UserIdentity),
    /// Service rejected the credentials, or the session could not be stored
    LoginFailed(String),
    /// A persisted session was found at startup; trusted until probed
    Restored(UserIdentity),
    /// The identity probe succeeded
    ProbeConfirmed(UserIdentity),
    /// The service no longer accepts the token
    ProbeRejected,
    /// The token expired client-side
    Expired,
    /// The user signed out
    LoggedOut,
}

impl SessionEvent {
    fn name(&self) -> &'static str {
        match self {
            Self::LoginStarted => "login_started",
            Self::LoginSucceeded(_) => "login_succeeded",
            Self::LoginFailed(_) => "login_failed",
            Self::Restored(_) => "restored",
            Self::ProbeConfirmed(_) => "probe_confirmed",
            Self::ProbeRejected => "probe_rejected",
            Self::Expired => "expired",
            Self::LoggedOut => "logged_out",
        }
    }
}

/// Rejected transition; the session is left unchanged
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot apply {event} while {status}{}", if *.loading { " (loading)" } else { "" })]
pub struct TransitionError {
    pub event: &'static str,
    pub status: SessionStatus,
    pub loading: bool,
}

/// The client's authentication state
///
/// `status == Authenticated` exactly when `identity` is present. `loading` is
/// set while a restored session awaits its identity probe. `version` grows by
/// one for every state the session passes through.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub identity: Option<UserIdentity>,
    pub status: SessionStatus,
    pub loading: bool,
    pub error_message: Option<String>,
    pub version: u64,
}

impl Default for Session {
    fn default() -> Self {
        Self::unauthenticated()
    }
}

impl Session {
    pub fn unauthenticated() -> Self {
        Self {
            identity: None,
            status: SessionStatus::Unauthenticated,
            loading: false,
            error_message: None,
            version: 0,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.status == SessionStatus::Authenticated && self.identity.is_some()
    }

    pub fn is_admin(&self) -> bool {
        self.is_authenticated() && self.identity.as_ref().is_some_and(UserIdentity::is_admin)
    }

    pub fn identity(&self) -> Option<&UserIdentity> {
        self.identity.as_ref()
    }

    fn next(&self, status: SessionStatus, identity: Option<UserIdentity>) -> Self {
        Self {
            identity,
            status,
            loading: false,
            error_message: None,
            version: self.version + 1,
        }
    }

    fn reject(&self, event: &SessionEvent) -> TransitionError {
        TransitionError {
            event: event.name(),
            status: self.status,
            loading: self.loading,
        }
    }

    /// Compute the successor state for `event`
    ///
    /// Every path into `Authenticated` passes through `Authenticating`.
    pub fn apply(&self, event: &SessionEvent) -> Result<Session, TransitionError> {
        use SessionStatus::*;

        match (event, self.status) {
            (SessionEvent::LoginStarted, Authenticating) => Err(self.reject(event)),
            (SessionEvent::LoginStarted, _) => Ok(self.next(Authenticating, None)),

            (SessionEvent::LoginSucceeded(identity), Authenticating) => {
                Ok(self.next(Authenticated, Some(identity.clone())))
            }

            (SessionEvent::LoginFailed(message), Authenticating) => {
                let mut next = self.next(Error, None);
                next.error_message = Some(message.clone());
                Ok(next)
            }

            (SessionEvent::Restored(identity), Unauthenticated) => {
                let authenticating = self.next(Authenticating, None);
                let mut next = authenticating.next(Authenticated, Some(identity.clone()));
                next.loading = true;
                Ok(next)
            }

            (SessionEvent::ProbeConfirmed(identity), Authenticated) => {
                Ok(self.next(Authenticated, Some(identity.clone())))
            }

            (SessionEvent::ProbeRejected | SessionEvent::Expired, Authenticated) => {
                Ok(self.next(Unauthenticated, None))
            }

            (SessionEvent::LoggedOut, Unauthenticated) if self.error_message.is_none() => {
                Ok(self.clone())
            }
            (SessionEvent::LoggedOut, _) => Ok(self.next(Unauthenticated, None)),

            _ => Err(self.reject(event)),
        }
    }
}
