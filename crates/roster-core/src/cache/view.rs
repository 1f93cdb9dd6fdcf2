//! Consumer handle on one cached spec

use super::collection::{Attachment, CollectionCache};
use super::page::CollectionPage;
use super::FetchError;
use crate::query::QuerySpec;
use tokio::sync::watch;

/// A live view of one spec's page
///
/// Holding a view keeps the page in the cache; dropping the last view for a
/// spec destroys the page. Dropping never cancels a fetch another view of
/// the same spec still waits on.
pub struct QueryView {
    cache: CollectionCache,
    spec: QuerySpec,
    generation: u64,
    rx: watch::Receiver<CollectionPage>,
}

impl QueryView {
    pub(super) fn new(cache: CollectionCache, spec: QuerySpec, attachment: Attachment) -> Self {
        Self {
            cache,
            spec,
            generation: attachment.generation,
            rx: attachment.rx,
        }
    }

    pub fn spec(&self) -> &QuerySpec {
        &self.spec
    }

    /// Latest page as stored by the cache
    pub fn current(&self) -> CollectionPage {
        self.rx.borrow().clone()
    }

    /// Wait for the next update; `None` once the page has been evicted
    pub async fn changed(&mut self) -> Option<CollectionPage> {
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().clone())
    }

    /// Switch this view to another spec, releasing the old one
    pub fn set_spec(&mut self, spec: QuerySpec) {
        if spec == self.spec {
            return;
        }
        let attachment = self.cache.attach(&spec);
        let old = std::mem::replace(&mut self.spec, spec);
        let old_generation = std::mem::replace(&mut self.generation, attachment.generation);
        self.rx = attachment.rx;
        self.cache.release(&old, old_generation);
    }

    /// Force a fetch of this view's spec and wait for it
    pub async fn refresh(&self) -> Result<CollectionPage, FetchError> {
        self.cache.refresh(&self.spec).await
    }
}

impl std::fmt::Debug for QueryView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryView")
            .field("spec", &self.spec)
            .field("freshness", &self.rx.borrow().freshness)
            .finish()
    }
}

impl Drop for QueryView {
    fn drop(&mut self) {
        self.cache.release(&self.spec, self.generation);
    }
}
