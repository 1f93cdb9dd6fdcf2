//! Session store: login, restore, logout
//!
//! The store owns the one [`Session`] value. Every change goes through
//! [`Session::apply`] and is broadcast to subscribers over a watch channel.

use super::state::{Session, SessionEvent};
use super::token::{PersistedSession, SessionToken, TokenStorage};
use super::{AuthError, UnauthorizedHandler};
use crate::concurrency::{ReadyGate, ReadySignal, SharedToken, ready_channel};
use crate::model::UserIdentity;
use crate::remote::{EmployeeService, RemoteError};
use std::sync::Arc;
use tokio::sync::{Mutex, watch};
use tracing::{debug, info, instrument, warn};

struct StoreInner {
    service: Arc<dyn EmployeeService>,
    storage: Arc<dyn TokenStorage>,
    token: SharedToken,
    state: watch::Sender<Session>,
    ready: ReadySignal,
    probe_lock: Mutex<()>,
}

/// Owner of the client's authentication state
///
/// Cloning is cheap; clones share the same session.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<StoreInner>,
}

impl SessionStore {
    pub fn new(
        service: Arc<dyn EmployeeService>,
        storage: Arc<dyn TokenStorage>,
        token: SharedToken,
    ) -> Self {
        let (state, _) = watch::channel(Session::unauthenticated());
        let (ready, _gate) = ready_channel(false);
        Self {
            inner: Arc::new(StoreInner {
                service,
                storage,
                token,
                state,
                ready,
                probe_lock: Mutex::new(()),
            }),
        }
    }

    /// Current session without an expiry check
    pub fn snapshot(&self) -> Session {
        self.inner.state.borrow().clone()
    }

    /// Current session
    ///
    /// A session whose token has expired client-side is ended here, so the
    /// caller never sees an authenticated session with a dead token.
    pub fn current(&self) -> Session {
        let session = self.snapshot();
        if session.is_authenticated()
            && self.inner.token.get().is_some_and(|t| t.is_expired())
        {
            info!("Session token expired");
            self.end_session(SessionEvent::Expired);
            return self.snapshot();
        }
        session
    }

    /// Receive every session transition
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.inner.state.subscribe()
    }

    /// Opens once restore has settled, or on the first login/logout
    pub fn readiness(&self) -> ReadyGate {
        self.inner.ready.gate()
    }

    pub fn shared_token(&self) -> SharedToken {
        self.inner.token.clone()
    }

    fn transition(&self, event: SessionEvent) -> Result<Session, super::TransitionError> {
        let mut rejected = None;
        self.inner.state.send_if_modified(|current| match current.apply(&event) {
            Ok(next) => {
                let changed = next != *current;
                *current = next;
                changed
            }
            Err(err) => {
                rejected = Some(err);
                false
            }
        });
        match rejected {
            Some(err) => {
                debug!("Ignored session event: {}", err);
                Err(err)
            }
            None => Ok(self.snapshot()),
        }
    }

    /// Sign in with email and password
    ///
    /// The session is persisted before it is published as authenticated. On
    /// failure nothing is persisted and any earlier persisted session stays
    /// in storage, but the in-memory bearer is dropped with the session.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<UserIdentity, AuthError> {
        let started = self
            .transition(SessionEvent::LoginStarted)
            .map_err(|_| AuthError::LoginInProgress)?;
        let mut guard = AttemptGuard {
            store: self,
            version: started.version,
            settled: false,
        };

        let result = self.inner.service.login(email.trim(), password).await;
        guard.settled = true;

        if self.snapshot().version != started.version {
            debug!("Sign-in superseded while waiting for the service");
            return Err(AuthError::Interrupted);
        }

        let grant = match result {
            Ok(grant) => grant,
            Err(err) => {
                let err = AuthError::from(err);
                self.fail_attempt(err.to_string());
                warn!("Sign-in failed: {}", err);
                return Err(err);
            }
        };

        let token = SessionToken::parse(grant.token);
        let persisted = PersistedSession::new(token.clone(), grant.identity.clone());
        if let Err(err) = self.inner.storage.store(&persisted) {
            let err = AuthError::from(err);
            self.fail_attempt(err.to_string());
            warn!("Sign-in could not be persisted: {}", err);
            return Err(err);
        }

        self.inner.token.set(token);
        if self
            .transition(SessionEvent::LoginSucceeded(grant.identity.clone()))
            .is_err()
        {
            self.clear_credentials();
            return Err(AuthError::Interrupted);
        }
        self.inner.ready.open();

        info!(user = %grant.identity.email, role = %grant.identity.role, "Signed in");
        Ok(grant.identity)
    }

    /// Restore the persisted session, if any
    ///
    /// A stored, unexpired session is published immediately with `loading`
    /// set, and an identity probe is started in the background. Expired or
    /// unreadable sessions are discarded without contacting the service.
    pub async fn restore(&self) -> Session {
        let persisted = match self.inner.storage.load() {
            Ok(persisted) => persisted,
            Err(err) => {
                warn!("Discarding unreadable session: {}", err);
                if let Err(err) = self.inner.storage.clear() {
                    warn!("Failed to clear session storage: {}", err);
                }
                None
            }
        };

        let Some(persisted) = persisted else {
            debug!("No persisted session");
            self.inner.ready.open();
            return self.snapshot();
        };

        if persisted.token.is_expired() {
            info!("Persisted session expired; signing out");
            if let Err(err) = self.inner.storage.clear() {
                warn!("Failed to clear session storage: {}", err);
            }
            self.inner.ready.open();
            return self.snapshot();
        }

        self.inner.token.set(persisted.token.clone());
        match self.transition(SessionEvent::Restored(persisted.identity.clone())) {
            Ok(session) => {
                debug!(user = %persisted.identity.email, "Restored session, confirming");
                let store = self.clone();
                tokio::spawn(async move {
                    store.confirm().await;
                });
                session
            }
            Err(_) => {
                // Someone signed in or out first; their outcome wins.
                self.snapshot()
            }
        }
    }

    /// Confirm a restored session with the identity probe
    ///
    /// Safe to call repeatedly; only one probe runs at a time and a session
    /// that is no longer awaiting confirmation is left alone.
    pub async fn confirm(&self) -> Session {
        let _probe = self.inner.probe_lock.lock().await;

        let session = self.snapshot();
        if !(session.is_authenticated() && session.loading) {
            self.inner.ready.open();
            return session;
        }

        let outcome = self.inner.service.identity_probe().await;
        if self.snapshot().version != session.version {
            debug!("Session changed during identity probe; discarding result");
            self.inner.ready.open();
            return self.snapshot();
        }

        match outcome {
            Ok(identity) => {
                if session.identity.as_ref() != Some(&identity) {
                    if let Some(token) = self.inner.token.get() {
                        let refreshed = PersistedSession::new(token, identity.clone());
                        if let Err(err) = self.inner.storage.store(&refreshed) {
                            warn!("Failed to refresh persisted identity: {}", err);
                        }
                    }
                }
                let _ = self.transition(SessionEvent::ProbeConfirmed(identity));
                info!("Restored session confirmed");
            }
            Err(RemoteError::Unauthorized) => {
                info!("Restored session rejected by the service");
                self.end_session(SessionEvent::ProbeRejected);
            }
            Err(err) => {
                // The stored token is kept for the next start; this process
                // continues signed out.
                warn!("Could not confirm restored session: {}", err);
                self.inner.token.clear();
                let _ = self.transition(SessionEvent::ProbeRejected);
            }
        }

        self.inner.ready.open();
        self.snapshot()
    }

    /// Sign out; signing out twice is harmless
    pub fn logout(&self) {
        self.clear_credentials();
        let _ = self.transition(SessionEvent::LoggedOut);
        self.inner.ready.open();
        info!("Signed out");
    }

    fn clear_credentials(&self) {
        if let Err(err) = self.inner.storage.clear() {
            warn!("Failed to clear session storage: {}", err);
        }
        self.inner.token.clear();
    }

    /// Settle a sign-in attempt as failed; the client no longer carries a bearer
    fn fail_attempt(&self, message: String) {
        self.inner.token.clear();
        let _ = self.transition(SessionEvent::LoginFailed(message));
    }

    fn end_session(&self, event: SessionEvent) {
        self.clear_credentials();
        let _ = self.transition(event);
    }
}

impl UnauthorizedHandler for SessionStore {
    fn handle_unauthorized(&self) {
        if self.snapshot().is_authenticated() {
            warn!("Service rejected the session token; signing out");
            self.end_session(SessionEvent::Expired);
        }
        self.inner.ready.open();
    }
}

/// Fails a sign-in attempt whose future was dropped mid-flight
struct AttemptGuard<'a> {
    store: &'a SessionStore,
    version: u64,
    settled: bool,
}

impl Drop for AttemptGuard<'_> {
    fn drop(&mut self) {
        if !self.settled && self.store.snapshot().version == self.version {
            self.store.fail_attempt("Sign-in was cancelled".into());
        }
    }
}
