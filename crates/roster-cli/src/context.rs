//! Wiring of the core components for one CLI invocation

use crate::console::RosterConsole;
use anyhow::{Context, Result, anyhow, bail};
use roster_core::auth::{self, Access, Route};
use roster_core::remote::EmployeeService;
use roster_core::session::{FileTokenStorage, UnauthorizedHandler};
use roster_core::{
    CollectionCache, GraphqlClient, MutationCoordinator, RosterConfig, Session, SessionStore,
    SharedToken,
};
use std::sync::Arc;
use tracing::debug;

/// Everything a command needs, built once from the configuration
pub struct AppContext {
    pub config: RosterConfig,
    pub console: RosterConsole,
    pub json: bool,
    pub service: Arc<dyn EmployeeService>,
    pub session: SessionStore,
    pub cache: CollectionCache,
    pub mutations: MutationCoordinator,
}

impl AppContext {
    pub fn new(config: RosterConfig, json: bool, verbose: bool) -> Result<Self> {
        let token = SharedToken::new();
        let client = GraphqlClient::from_config(&config, token.clone())?;
        let service: Arc<dyn EmployeeService> = Arc::new(client);

        let session_dir = config
            .resolved_session_dir()
            .ok_or_else(|| anyhow!("Could not determine a session directory; set session_dir"))?;
        let storage = Arc::new(FileTokenStorage::new(session_dir));

        let session = SessionStore::new(service.clone(), storage, token);
        let on_unauthorized: Arc<dyn UnauthorizedHandler> = Arc::new(session.clone());
        let cache = CollectionCache::with_unauthorized_handler(
            service.clone(),
            session.readiness(),
            on_unauthorized.clone(),
        );
        let mutations = MutationCoordinator::new(service.clone(), cache.clone())
            .with_unauthorized_handler(on_unauthorized);

        Ok(Self {
            config,
            console: RosterConsole::new(verbose),
            json,
            service,
            session,
            cache,
            mutations,
        })
    }

    /// Restore the stored session and wait until the gate can decide
    pub async fn settled_session(&self) -> Session {
        let session = self.session.restore().await;
        if !session.loading {
            return session;
        }
        let spinner = self.console.spinner("Confirming session...");
        let session = self.session.confirm().await;
        spinner.finish_and_clear();
        session
    }

    /// Pass `route` through the gate, or explain where the user was sent
    pub async fn enter(&self, route: Route) -> Result<Session> {
        self.settled_session().await;
        let session = self.session.current();
        debug!(route = %route, status = ?session.status, "Resolving route");
        match auth::guard(&session, route) {
            Access::Allow => Ok(session),
            Access::RedirectTo(target) => Err(redirect_error(target)),
            Access::Pending => bail!("Session is still being confirmed; try again"),
        }
    }

    /// The signed-in session, with its identity
    pub async fn signed_in(&self, route: Route) -> Result<(Session, roster_core::UserIdentity)> {
        let session = self.enter(route).await?;
        let identity = session
            .identity()
            .cloned()
            .context("Signed-in session has no identity")?;
        Ok((session, identity))
    }
}

fn redirect_error(target: Route) -> anyhow::Error {
    match target {
        Route::Login => anyhow!("Not signed in. Run `roster login --email <email>` first."),
        Route::Profile => anyhow!(
            "This command needs an administrator account. Use `roster profile` to see your own record."
        ),
        Route::Dashboard => anyhow!("Administrators manage employees with `roster list`."),
    }
}
