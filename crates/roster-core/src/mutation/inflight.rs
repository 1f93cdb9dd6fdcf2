//! In-flight mutation tracking

use super::MutationError;
use crate::cache::MutationKind;
use crate::model::EmployeeId;
use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::HashMap;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

pub(super) type SharedMutation<T> = Shared<BoxFuture<'static, Result<T, MutationError>>>;

/// Identity of a mutation request: operation, target and payload
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MutationKey {
    pub kind: MutationKind,
    pub id: Option<EmployeeId>,
    pub fingerprint: u64,
}

impl MutationKey {
    pub fn new(kind: MutationKind, id: Option<&EmployeeId>, payload: &impl Serialize) -> Self {
        let fingerprint = match serde_json::to_string(payload) {
            Ok(body) => {
                let mut hasher = DefaultHasher::new();
                body.hash(&mut hasher);
                hasher.finish()
            }
            Err(err) => {
                debug!(kind = kind.as_str(), "Payload not fingerprinted: {}", err);
                Self::unique_fingerprint()
            }
        };
        Self {
            kind,
            id: id.cloned(),
            fingerprint,
        }
    }

    /// A fingerprint no other key shares, so the request is never merged
    fn unique_fingerprint() -> u64 {
        static NEXT: AtomicU64 = AtomicU64::new(0);
        let mut hasher = DefaultHasher::new();
        ("unfingerprinted", NEXT.fetch_add(1, Ordering::Relaxed)).hash(&mut hasher);
        hasher.finish()
    }
}

/// Mutations currently awaiting the server, by key
pub(super) struct InflightSet<T> {
    pending: Arc<Mutex<HashMap<MutationKey, SharedMutation<T>>>>,
}

impl<T> Clone for InflightSet<T> {
    fn clone(&self) -> Self {
        Self {
            pending: Arc::clone(&self.pending),
        }
    }
}

impl<T> Default for InflightSet<T> {
    fn default() -> Self {
        Self {
            pending: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

impl<T> InflightSet<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Run `start()` unless an identical mutation is already pending, in
    /// which case the caller shares its outcome
    ///
    /// The mutation runs to completion on the runtime even if every caller
    /// stops waiting.
    pub(super) fn run<F>(&self, key: MutationKey, start: F) -> SharedMutation<T>
    where
        F: FnOnce() -> BoxFuture<'static, Result<T, MutationError>>,
    {
        let mut pending = self.pending.lock();
        if let Some(existing) = pending.get(&key) {
            debug!(kind = key.kind.as_str(), "Attaching to identical pending mutation");
            return existing.clone();
        }

        let set = self.clone();
        let done_key = key.clone();
        let operation = start();
        let shared = async move {
            let result = operation.await;
            set.pending.lock().remove(&done_key);
            result
        }
        .boxed()
        .shared();

        pending.insert(key, shared.clone());
        tokio::spawn({
            let shared = shared.clone();
            async move {
                let _ = shared.await;
            }
        });
        shared
    }

    pub(super) fn len(&self) -> usize {
        self.pending.lock().len()
    }
}
