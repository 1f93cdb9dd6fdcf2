//! Mutation execution and cache re-synchronization

use super::inflight::{InflightSet, MutationKey};
use super::{Deleted, MutationError};
use crate::auth::AdminGrant;
use crate::cache::{CollectionCache, DependencyRegistry, MutationKind};
use crate::model::{EmployeeChanges, EmployeeId, EmployeeRecord, EmploymentStatus, NewEmployee, StatusChange};
use crate::remote::{EmployeeService, RemoteError, RemoteResult};
use crate::session::UnauthorizedHandler;
use crate::validation::Validated;
use futures::future::{BoxFuture, FutureExt};
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Runs mutations against the directory service
///
/// A mutation's future resolves only after the server confirmed it and every
/// cached page its kind depends on has been refetched. Identical concurrent
/// requests share one server call; different requests run independently.
#[derive(Clone)]
pub struct MutationCoordinator {
    service: Arc<dyn EmployeeService>,
    cache: CollectionCache,
    registry: DependencyRegistry,
    on_unauthorized: Option<Arc<dyn UnauthorizedHandler>>,
    records: InflightSet<EmployeeRecord>,
    statuses: InflightSet<StatusChange>,
    deletions: InflightSet<Deleted>,
}

impl MutationCoordinator {
    pub fn new(service: Arc<dyn EmployeeService>, cache: CollectionCache) -> Self {
        Self {
            service,
            cache,
            registry: DependencyRegistry::new(),
            on_unauthorized: None,
            records: InflightSet::default(),
            statuses: InflightSet::default(),
            deletions: InflightSet::default(),
        }
    }

    pub fn with_registry(mut self, registry: DependencyRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Report `Unauthorized` mutation failures to `handler`
    pub fn with_unauthorized_handler(mut self, handler: Arc<dyn UnauthorizedHandler>) -> Self {
        self.on_unauthorized = Some(handler);
        self
    }

    pub fn cache(&self) -> &CollectionCache {
        &self.cache
    }

    /// Number of mutations still awaiting the server
    pub fn pending(&self) -> usize {
        self.records.len() + self.statuses.len() + self.deletions.len()
    }

    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn create(
        &self,
        input: Validated<NewEmployee>,
    ) -> Result<EmployeeRecord, MutationError> {
        let input = input.into_inner();
        let key = MutationKey::new(MutationKind::Create, None, &input);
        self.execute(&self.records, key, move |service| {
            async move { service.create_employee(&input).await }.boxed()
        })
        .await
    }

    #[instrument(skip(self, changes))]
    pub async fn update(
        &self,
        id: &EmployeeId,
        changes: Validated<EmployeeChanges>,
    ) -> Result<EmployeeRecord, MutationError> {
        let changes = changes.into_inner();
        let key = MutationKey::new(MutationKind::Update, Some(id), &changes);
        let id = id.clone();
        self.execute(&self.records, key, move |service| {
            async move { service.update_employee(&id, &changes).await }.boxed()
        })
        .await
    }

    /// Change an employee's status; only an admin session can produce the grant
    #[instrument(skip(self, _grant))]
    pub async fn set_status(
        &self,
        _grant: &AdminGrant,
        id: &EmployeeId,
        status: EmploymentStatus,
    ) -> Result<StatusChange, MutationError> {
        let key = MutationKey::new(MutationKind::SetStatus, Some(id), &status);
        let id = id.clone();
        self.execute(&self.statuses, key, move |service| {
            async move { service.update_employee_status(&id, status).await }.boxed()
        })
        .await
    }

    /// Delete an employee; deleting an unknown id is `NotFound`
    #[instrument(skip(self))]
    pub async fn delete(&self, id: &EmployeeId) -> Result<Deleted, MutationError> {
        let key = MutationKey::new(MutationKind::Delete, Some(id), &Value::Null);
        let id = id.clone();
        self.execute(&self.deletions, key, move |service| {
            async move {
                if service.delete_employee(&id).await? {
                    Ok(Deleted { id })
                } else {
                    Err(RemoteError::NotFound(id))
                }
            }
            .boxed()
        })
        .await
    }

    async fn execute<T, F>(
        &self,
        set: &InflightSet<T>,
        key: MutationKey,
        call: F,
    ) -> Result<T, MutationError>
    where
        T: Clone + Send + Sync + 'static,
        F: FnOnce(Arc<dyn EmployeeService>) -> BoxFuture<'static, RemoteResult<T>> + Send + 'static,
    {
        let kind = key.kind;
        let service = Arc::clone(&self.service);
        let cache = self.cache.clone();
        let scope = self.registry.scope_for(kind);
        let on_unauthorized = self.on_unauthorized.clone();

        let shared = set.run(key, move || {
            async move {
                match call(service).await {
                    Ok(value) => {
                        info!(kind = kind.as_str(), "Mutation confirmed, re-synchronizing pages");
                        cache.invalidate(scope).await;
                        Ok(value)
                    }
                    Err(err) => {
                        let err = MutationError::from(err);
                        warn!(kind = kind.as_str(), "Mutation failed: {}", err);
                        if err == MutationError::Unauthorized {
                            if let Some(handler) = &on_unauthorized {
                                handler.handle_unauthorized();
                            }
                        }
                        Err(err)
                    }
                }
            }
            .boxed()
        });
        shared.await
    }
}

impl std::fmt::Debug for MutationCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MutationCoordinator")
            .field("pending", &self.pending())
            .field("cache", &self.cache.stats())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::require_admin;
    use crate::cache::Freshness;
    use crate::concurrency::ReadyGate;
    use crate::model::{Role, UserIdentity};
    use crate::query::{QuerySpec, QuerySpecBuilder};
    use crate::remote::Operation;
    use crate::session::{Session, SessionEvent};
    use crate::testing::FakeDirectory;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn setup() -> (Arc<FakeDirectory>, MutationCoordinator) {
        let directory = Arc::new(FakeDirectory::seeded());
        let cache = CollectionCache::new(directory.clone(), ReadyGate::open());
        let coordinator = MutationCoordinator::new(directory.clone(), cache);
        (directory, coordinator)
    }

    fn new_hire(email: &str) -> Validated<NewEmployee> {
        NewEmployee::new("New Hire", email, "secret1")
            .with_phone("555-0100")
            .with_age(29)
            .with_class("B")
            .with_subjects(["Math"])
            .with_attendance(90.0)
            .validate()
            .unwrap()
    }

    fn admin_session() -> Session {
        Session::unauthenticated()
            .apply(&SessionEvent::LoginStarted)
            .unwrap()
            .apply(&SessionEvent::LoginSucceeded(UserIdentity::new(
                "u1",
                "admin@example.com",
                Role::Admin,
            )))
            .unwrap()
    }

    #[tokio::test]
    async fn test_create_refetches_pages_before_returning() {
        let (directory, coordinator) = setup();
        let all = QuerySpec::default();
        let class_b = QuerySpecBuilder::new().class("B").build();
        coordinator.cache().refresh(&all).await.unwrap();
        coordinator.cache().refresh(&class_b).await.unwrap();
        let listed = directory.list_calls();

        let record = coordinator.create(new_hire("hire@example.com")).await.unwrap();

        assert_eq!(record.email, "hire@example.com");
        assert_eq!(directory.list_calls(), listed + 2);
        let page = coordinator.cache().peek(&all).unwrap();
        assert!(page.is_fresh());
        assert_eq!(page.total_count, 5);
        assert!(page.find(&record.id).is_some());
        assert_eq!(coordinator.cache().peek(&class_b).unwrap().total_count, 2);
    }

    #[tokio::test]
    async fn test_identical_concurrent_requests_share_one_call() {
        let (directory, coordinator) = setup();
        directory.set_mutation_delay(Some(Duration::from_millis(30)));

        let (a, b) = tokio::join!(
            coordinator.create(new_hire("twin@example.com")),
            coordinator.create(new_hire("twin@example.com")),
        );

        assert_eq!(a.unwrap(), b.unwrap());
        assert_eq!(directory.mutation_calls(), 1);
        assert_eq!(directory.len(), 5);
        assert_eq!(coordinator.pending(), 0);
    }

    #[tokio::test]
    async fn test_different_requests_are_not_merged() {
        let (directory, coordinator) = setup();
        directory.set_mutation_delay(Some(Duration::from_millis(10)));

        let (a, b) = tokio::join!(
            coordinator.create(new_hire("first@example.com")),
            coordinator.create(new_hire("second@example.com")),
        );

        assert_ne!(a.unwrap().id, b.unwrap().id);
        assert_eq!(directory.mutation_calls(), 2);
    }

    #[tokio::test]
    async fn test_rejected_mutation_leaves_cache_untouched() {
        let (directory, coordinator) = setup();
        let all = QuerySpec::default();
        coordinator.cache().refresh(&all).await.unwrap();
        let before = coordinator.cache().peek(&all).unwrap();
        let listed = directory.list_calls();

        let err = coordinator
            .create(new_hire("ada@example.com"))
            .await
            .unwrap_err();

        assert_eq!(err, MutationError::Rejected("Email already exists".into()));
        assert_eq!(coordinator.cache().peek(&all).unwrap(), before);
        assert_eq!(coordinator.cache().stats().invalidations, 0);
        assert_eq!(directory.list_calls(), listed);
    }

    #[tokio::test]
    async fn test_update_is_visible_in_cached_pages() {
        let (_directory, coordinator) = setup();
        let all = QuerySpec::default();
        coordinator.cache().refresh(&all).await.unwrap();
        let id = EmployeeId::from("2");

        let changes = EmployeeChanges::new().class("A").validate().unwrap();
        let record = coordinator.update(&id, changes).await.unwrap();

        assert_eq!(record.class, "A");
        let page = coordinator.cache().peek(&all).unwrap();
        assert_eq!(page.find(&id).unwrap().class, "A");
        assert_eq!(page.freshness, Freshness::Fresh);
    }

    #[tokio::test]
    async fn test_set_status_with_admin_grant() {
        let (directory, coordinator) = setup();
        let grant = require_admin(&admin_session()).unwrap();
        let id = EmployeeId::from("1");

        let change = coordinator
            .set_status(&grant, &id, EmploymentStatus::Flagged)
            .await
            .unwrap();

        assert_eq!(change.status, EmploymentStatus::Flagged);
        assert_eq!(directory.record(&id).unwrap().status, EmploymentStatus::Flagged);
    }

    #[tokio::test]
    async fn test_delete_unknown_is_not_found() {
        let (directory, coordinator) = setup();
        let ghost = EmployeeId::from("404");

        let err = coordinator.delete(&ghost).await.unwrap_err();
        assert_eq!(err, MutationError::NotFound(ghost));

        let id = EmployeeId::from("3");
        let deleted = coordinator.delete(&id).await.unwrap();
        assert_eq!(deleted.id, id);
        assert!(directory.record(&id).is_none());
    }

    #[derive(Default)]
    struct CountingHandler(AtomicUsize);

    impl UnauthorizedHandler for CountingHandler {
        fn handle_unauthorized(&self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn test_unauthorized_mutation_is_reported() {
        let (directory, coordinator) = setup();
        let handler = Arc::new(CountingHandler::default());
        let coordinator = coordinator.with_unauthorized_handler(handler.clone());
        directory.fail(Operation::DeleteEmployee, RemoteError::Unauthorized);

        let err = coordinator.delete(&EmployeeId::from("1")).await.unwrap_err();

        assert_eq!(err, MutationError::Unauthorized);
        assert_eq!(handler.0.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_error_mapping() {
        assert_eq!(
            MutationError::from(RemoteError::Network("timeout".into())),
            MutationError::Network("timeout".into())
        );
        assert_eq!(
            MutationError::from(RemoteError::InvalidCredentials),
            MutationError::Unauthorized
        );
        assert!(matches!(
            MutationError::from(RemoteError::Decode("bad".into())),
            MutationError::Network(_)
        ));
    }
}
