//! Shared wiring for scenario tests

#![allow(dead_code)]

use roster::session::{MemoryTokenStorage, PersistedSession, SessionToken, UnauthorizedHandler};
use roster::{CollectionCache, MutationCoordinator, SessionStore, SharedToken, UserIdentity};
use roster_core::testing::FakeDirectory;
use std::sync::Arc;
use std::time::Duration;

/// A console wired the way the CLI wires it, over an in-memory service
pub struct Console {
    pub directory: Arc<FakeDirectory>,
    pub storage: Arc<MemoryTokenStorage>,
    pub session: SessionStore,
    pub cache: CollectionCache,
    pub mutations: MutationCoordinator,
}

impl Console {
    pub fn new() -> Self {
        Self::with_storage(MemoryTokenStorage::new())
    }

    /// Console whose storage already holds a session for `identity` under `token`
    pub fn with_persisted(token: &str, identity: UserIdentity) -> Self {
        let persisted = PersistedSession::new(SessionToken::parse(token), identity);
        Self::with_storage(MemoryTokenStorage::with_session(persisted))
    }

    fn with_storage(storage: MemoryTokenStorage) -> Self {
        let directory = Arc::new(FakeDirectory::seeded());
        let storage = Arc::new(storage);
        let session = SessionStore::new(directory.clone(), storage.clone(), SharedToken::new());
        directory.attach_token(session.shared_token());

        let handler: Arc<dyn UnauthorizedHandler> = Arc::new(session.clone());
        let cache = CollectionCache::with_unauthorized_handler(
            directory.clone(),
            session.readiness(),
            handler.clone(),
        );
        let mutations = MutationCoordinator::new(directory.clone(), cache.clone())
            .with_unauthorized_handler(handler);

        Self {
            directory,
            storage,
            session,
            cache,
            mutations,
        }
    }

    pub async fn signed_in_admin() -> Self {
        let console = Self::new();
        console
            .session
            .login("admin@example.com", "admin123")
            .await
            .expect("admin login");
        console
    }
}

pub async fn wait_until(mut condition: impl FnMut() -> bool) {
    tokio::time::timeout(Duration::from_secs(2), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}
