//! Collection cache: per-spec pages, fetch coalescing and invalidation

use super::page::{CollectionPage, Freshness};
use super::registry::Invalidation;
use super::view::QueryView;
use super::FetchError;
use crate::concurrency::ReadyGate;
use crate::model::EmployeeRecord;
use crate::query::QuerySpec;
use crate::remote::EmployeeService;
use crate::session::UnauthorizedHandler;
use chrono::Utc;
use futures::future::{BoxFuture, FutureExt, Shared, join_all};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, warn};

/// Upper bound on fetches awaited by one settle; each extra round only
/// happens when an invalidation landed during the previous fetch.
const MAX_SETTLE_ROUNDS: usize = 8;

/// A view's claim on one cache entry
pub(super) struct Attachment {
    pub(super) generation: u64,
    pub(super) rx: watch::Receiver<CollectionPage>,
}

type SharedFetch = Shared<BoxFuture<'static, Result<CollectionPage, FetchError>>>;

/// Cache statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Pages currently held
    pub pages: usize,
    /// Fetches sent to the service
    pub fetches_started: u64,
    /// Requests that attached to a fetch already in flight
    pub fetches_deduplicated: u64,
    /// Whole-cache invalidations
    pub invalidations: u64,
}

struct Entry {
    page: CollectionPage,
    /// Distinguishes this entry from earlier ones under the same spec
    generation: u64,
    consumers: usize,
    inflight: Option<(u64, SharedFetch)>,
    notify: watch::Sender<CollectionPage>,
}

impl Entry {
    fn new(spec: QuerySpec, generation: u64) -> Self {
        let page = CollectionPage::empty(spec);
        let (notify, _) = watch::channel(page.clone());
        Self {
            page,
            generation,
            consumers: 0,
            inflight: None,
            notify,
        }
    }

    fn publish(&mut self) {
        self.notify.send_replace(self.page.clone());
    }
}

#[derive(Default)]
struct CacheState {
    entries: HashMap<QuerySpec, Entry>,
    epoch: u64,
    next_fetch_id: u64,
    next_generation: u64,
    stats: CacheStats,
}

impl CacheState {
    /// Entry for `spec`, created if absent
    fn entry(&mut self, spec: &QuerySpec) -> &mut Entry {
        let generation = self.next_generation;
        let entry = self
            .entries
            .entry(spec.clone())
            .or_insert_with(|| Entry::new(spec.clone(), generation));
        if entry.generation == generation {
            self.next_generation += 1;
        }
        entry
    }
}

struct CacheInner {
    service: Arc<dyn EmployeeService>,
    ready: ReadyGate,
    on_unauthorized: Option<Arc<dyn UnauthorizedHandler>>,
    state: Mutex<CacheState>,
}

/// Read-through cache of employee pages keyed by [`QuerySpec`]
///
/// Cloning is cheap; clones share the same pages. Methods that may start a
/// fetch must be called from within a Tokio runtime.
#[derive(Clone)]
pub struct CollectionCache {
    inner: Arc<CacheInner>,
}

impl CollectionCache {
    pub fn new(service: Arc<dyn EmployeeService>, ready: ReadyGate) -> Self {
        Self::build(service, ready, None)
    }

    /// Cache that reports `Unauthorized` fetch failures to `handler`
    pub fn with_unauthorized_handler(
        service: Arc<dyn EmployeeService>,
        ready: ReadyGate,
        handler: Arc<dyn UnauthorizedHandler>,
    ) -> Self {
        Self::build(service, ready, Some(handler))
    }

    fn build(
        service: Arc<dyn EmployeeService>,
        ready: ReadyGate,
        on_unauthorized: Option<Arc<dyn UnauthorizedHandler>>,
    ) -> Self {
        Self {
            inner: Arc::new(CacheInner {
                service,
                ready,
                on_unauthorized,
                state: Mutex::new(CacheState::default()),
            }),
        }
    }

    /// Best available page for `spec`
    ///
    /// A fresh page is returned as is. Anything else is returned immediately
    /// marked `Stale` (an empty page if nothing was ever fetched) while a
    /// fetch runs in the background.
    pub fn resolve(&self, spec: &QuerySpec) -> CollectionPage {
        let mut state = self.inner.state.lock();
        let entry = state.entry(spec);
        if entry.page.freshness == Freshness::Fresh {
            return entry.page.clone();
        }

        CacheInner::start_fetch(&self.inner, &mut state, spec);

        let mut snapshot = state
            .entries
            .get(spec)
            .map(|entry| entry.page.clone())
            .unwrap_or_else(|| CollectionPage::empty(spec.clone()));
        snapshot.freshness = Freshness::Stale;
        snapshot
    }

    /// Fetch `spec` now, even if its page is fresh, and wait for the result
    pub async fn refresh(&self, spec: &QuerySpec) -> Result<CollectionPage, FetchError> {
        {
            let mut state = self.inner.state.lock();
            state.entry(spec);
            CacheInner::start_fetch(&self.inner, &mut state, spec);
        }
        self.settle(spec).await
    }

    /// Subscribe to `spec`; the page lives as long as some view watches it
    pub fn watch(&self, spec: &QuerySpec) -> QueryView {
        let attachment = self.attach(spec);
        QueryView::new(self.clone(), spec.clone(), attachment)
    }

    pub(super) fn attach(&self, spec: &QuerySpec) -> Attachment {
        let mut state = self.inner.state.lock();
        let entry = state.entry(spec);
        entry.consumers += 1;
        let attachment = Attachment {
            generation: entry.generation,
            rx: entry.notify.subscribe(),
        };
        let needs_fetch = entry.page.freshness != Freshness::Fresh && entry.inflight.is_none();
        if needs_fetch {
            CacheInner::start_fetch(&self.inner, &mut state, spec);
        }
        attachment
    }

    /// Drop one consumer of the entry `generation` names
    ///
    /// A no-op once that entry has been evicted, even if a newer entry now
    /// holds the same spec.
    pub(super) fn release(&self, spec: &QuerySpec, generation: u64) {
        let mut state = self.inner.state.lock();
        let Some(entry) = state.entries.get_mut(spec) else {
            return;
        };
        if entry.generation != generation {
            debug!(spec = %spec, generation, "Release of an evicted page ignored");
            return;
        }
        entry.consumers = entry.consumers.saturating_sub(1);
        if entry.consumers == 0 {
            state.entries.remove(spec);
            debug!(spec = %spec, "Dropped page with no remaining views");
        }
    }

    /// Apply the invalidation declared for a mutation
    pub async fn invalidate(&self, scope: Invalidation) {
        match scope {
            Invalidation::All => self.invalidate_all().await,
        }
    }

    /// Mark every held page stale and refetch each once
    ///
    /// Returns once every refetch has settled. Refetch failures are logged
    /// and left on the affected pages; they do not fail the caller.
    pub async fn invalidate_all(&self) {
        let specs: Vec<QuerySpec> = {
            let mut state = self.inner.state.lock();
            state.epoch += 1;
            state.stats.invalidations += 1;

            let specs: Vec<QuerySpec> = state.entries.keys().cloned().collect();
            for spec in &specs {
                let Some(entry) = state.entries.get_mut(spec) else {
                    continue;
                };
                if entry.page.freshness == Freshness::Fresh {
                    entry.page.freshness = Freshness::Stale;
                    entry.publish();
                }
                // In-flight fetches belong to the old epoch and refetch on completion.
                if entry.inflight.is_none() {
                    CacheInner::start_fetch(&self.inner, &mut state, spec);
                }
            }
            specs
        };

        debug!(pages = specs.len(), "Invalidated all pages");
        let results = join_all(specs.iter().map(|spec| self.settle(spec))).await;
        for (spec, result) in specs.iter().zip(results) {
            if let Err(err) = result {
                warn!(spec = %spec, "Refetch after invalidation failed: {}", err);
            }
        }
    }

    /// Stored page for `spec`, without starting a fetch
    pub fn peek(&self, spec: &QuerySpec) -> Option<CollectionPage> {
        self.inner
            .state
            .lock()
            .entries
            .get(spec)
            .map(|entry| entry.page.clone())
    }

    /// Drop the page for `spec`; views still watching it stop receiving updates
    pub fn evict(&self, spec: &QuerySpec) -> bool {
        self.inner.state.lock().entries.remove(spec).is_some()
    }

    /// Drop every page, e.g. on sign-out
    pub fn clear(&self) {
        let mut state = self.inner.state.lock();
        let pages = state.entries.len();
        state.entries.clear();
        debug!(pages, "Cleared collection cache");
    }

    pub fn stats(&self) -> CacheStats {
        let state = self.inner.state.lock();
        CacheStats {
            pages: state.entries.len(),
            ..state.stats
        }
    }

    /// Await in-flight fetches for `spec` until none remain
    async fn settle(&self, spec: &QuerySpec) -> Result<CollectionPage, FetchError> {
        let mut outcome = None;
        for _ in 0..MAX_SETTLE_ROUNDS {
            let pending = {
                let state = self.inner.state.lock();
                state
                    .entries
                    .get(spec)
                    .and_then(|entry| entry.inflight.as_ref().map(|(_, fetch)| fetch.clone()))
            };
            match pending {
                Some(fetch) => outcome = Some(fetch.await),
                None => break,
            }
        }

        match outcome {
            Some(Err(err)) => Err(err),
            other => match self.peek(spec) {
                Some(page) => Ok(page),
                None => other.unwrap_or_else(|| Ok(CollectionPage::empty(spec.clone()))),
            },
        }
    }
}

impl CacheInner {
    /// Start a fetch for `spec` unless one is already in flight
    fn start_fetch(this: &Arc<Self>, state: &mut CacheState, spec: &QuerySpec) {
        let epoch = state.epoch;
        let fetch_id = state.next_fetch_id;
        let Some(entry) = state.entries.get_mut(spec) else {
            return;
        };

        if entry.inflight.is_some() {
            state.stats.fetches_deduplicated += 1;
            return;
        }

        let inner = Arc::clone(this);
        let fetch_spec = spec.clone();
        let fetch: SharedFetch = async move { inner.run_fetch(fetch_spec, epoch, fetch_id).await }
            .boxed()
            .shared();

        entry.inflight = Some((fetch_id, fetch.clone()));
        entry.page.freshness = Freshness::Fetching;
        entry.publish();

        state.next_fetch_id += 1;
        state.stats.fetches_started += 1;
        debug!(spec = %spec, fetch_id, epoch, "Starting fetch");

        tokio::spawn(async move {
            let _ = fetch.await;
        });
    }

    async fn run_fetch(
        self: Arc<Self>,
        spec: QuerySpec,
        epoch: u64,
        fetch_id: u64,
    ) -> Result<CollectionPage, FetchError> {
        self.ready.wait().await;
        let result = self.service.list_employees(&spec).await;

        let outcome = {
            let mut state = self.state.lock();
            let current_epoch = state.epoch;
            let owned = state
                .entries
                .get(&spec)
                .and_then(|entry| entry.inflight.as_ref())
                .is_some_and(|(id, _)| *id == fetch_id);

            match result {
                Ok(connection) => {
                    let superseded = epoch < current_epoch;
                    let page = CollectionPage {
                        spec: spec.clone(),
                        records: connection.records,
                        page_info: connection.page_info,
                        total_count: connection.total_count,
                        fetched_at: Some(Utc::now()),
                        freshness: if superseded {
                            Freshness::Stale
                        } else {
                            Freshness::Fresh
                        },
                        last_error: None,
                    };

                    if !owned {
                        debug!(spec = %spec, fetch_id, "Discarding fetch for a dropped page");
                        return Ok(page);
                    }

                    if let Some(entry) = state.entries.get_mut(&spec) {
                        entry.inflight = None;
                        entry.page = page.clone();
                        entry.publish();
                    }

                    if superseded {
                        debug!(spec = %spec, fetch_id, "Fetch predates an invalidation; refetching");
                        Self::start_fetch(&self, &mut state, &spec);
                    } else {
                        reconcile(&mut state, &spec, &page.records);
                    }
                    Ok(page)
                }
                Err(err) => {
                    let err = FetchError::from(err);
                    if owned {
                        if let Some(entry) = state.entries.get_mut(&spec) {
                            entry.inflight = None;
                            entry.page.freshness = Freshness::Failed;
                            entry.page.last_error = Some(err.clone());
                            entry.publish();
                        }
                    }
                    Err(err)
                }
            }
        };

        if let Err(err) = &outcome {
            warn!(spec = %spec, "Fetch failed: {}", err);
            if *err == FetchError::Unauthorized {
                if let Some(handler) = &self.on_unauthorized {
                    handler.handle_unauthorized();
                }
            }
        }
        outcome
    }
}

/// Overwrite older copies of `records` held by other pages
///
/// Pages that change are marked stale, since their ordering or filtering may
/// no longer hold for the updated record.
fn reconcile(state: &mut CacheState, source: &QuerySpec, records: &[EmployeeRecord]) {
    if records.is_empty() {
        return;
    }
    let latest: HashMap<_, _> = records.iter().map(|r| (&r.id, r)).collect();

    for (spec, entry) in state.entries.iter_mut() {
        if spec == source {
            continue;
        }
        let mut changed = false;
        for held in entry.page.records.iter_mut() {
            if let Some(newer) = latest.get(&held.id) {
                if *held != **newer {
                    *held = (*newer).clone();
                    changed = true;
                }
            }
        }
        if changed {
            if entry.page.freshness == Freshness::Fresh {
                entry.page.freshness = Freshness::Stale;
            }
            entry.publish();
            debug!(spec = %spec, "Reconciled records from a newer page");
        }
    }
}
