//! Concurrency primitives shared between the session store, the remote
//! client and the collection cache.
//!
//! - [`ReadySignal`] / [`ReadyGate`]: one-way latch that holds collection
//!   fetches back until session restore has settled
//! - [`SharedToken`]: the in-memory bearer token read by the remote client

use crate::session::SessionToken;
use parking_lot::RwLock;
use std::sync::Arc;
use tokio::sync::watch;

/// Create a connected signal/gate pair
pub fn ready_channel(initially_open: bool) -> (ReadySignal, ReadyGate) {
    let (tx, rx) = watch::channel(initially_open);
    (ReadySignal { tx }, ReadyGate { rx })
}

/// Owning side of the readiness latch
#[derive(Debug)]
pub struct ReadySignal {
    tx: watch::Sender<bool>,
}

impl ReadySignal {
    /// Open the gate; waiters are released. Opening twice is a no-op.
    pub fn open(&self) {
        self.tx.send_if_modified(|ready| {
            if *ready {
                false
            } else {
                *ready = true;
                true
            }
        });
    }

    pub fn is_open(&self) -> bool {
        *self.tx.borrow()
    }

    /// A new gate observing this signal
    pub fn gate(&self) -> ReadyGate {
        ReadyGate {
            rx: self.tx.subscribe(),
        }
    }
}

/// Waiting side of the readiness latch
#[derive(Debug, Clone)]
pub struct ReadyGate {
    rx: watch::Receiver<bool>,
}

impl ReadyGate {
    /// A gate that is already open, for callers without a session store
    pub fn open() -> Self {
        let (_signal, gate) = ready_channel(true);
        gate
    }

    pub fn is_open(&self) -> bool {
        *self.rx.borrow()
    }

    /// Wait until the gate opens
    ///
    /// If the signal is dropped while the gate is still closed, waiting ends
    /// anyway; requests then proceed and fail on their own terms.
    pub async fn wait(&self) {
        if self.is_open() {
            return;
        }
        let mut rx = self.rx.clone();
        let _ = rx.wait_for(|ready| *ready).await;
    }
}

/// Bearer token shared by the session store (writer) and the remote client (reader)
#[derive(Debug, Clone, Default)]
pub struct SharedToken {
    inner: Arc<RwLock<Option<SessionToken>>>,
}

impl SharedToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, token: SessionToken) {
        *self.inner.write() = Some(token);
    }

    pub fn clear(&self) {
        *self.inner.write() = None;
    }

    pub fn get(&self) -> Option<SessionToken> {
        self.inner.read().clone()
    }

    /// Raw bearer value, if a token is held
    pub fn bearer(&self) -> Option<String> {
        self.inner.read().as_ref().map(|t| t.as_str().to_string())
    }

    pub fn is_set(&self) -> bool {
        self.inner.read().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_gate_releases_waiters_on_open() {
        let (signal, gate) = ready_channel(false);
        assert!(!gate.is_open());

        let waiter = tokio::spawn({
            let gate = gate.clone();
            async move { gate.wait().await }
        });

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(!waiter.is_finished());

        signal.open();
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter released")
            .unwrap();
        assert!(gate.is_open());
    }

    #[tokio::test]
    async fn test_open_gate_does_not_block() {
        tokio::time::timeout(Duration::from_millis(100), ReadyGate::open().wait())
            .await
            .expect("open gate never blocks");
    }

    #[test]
    fn test_shared_token_is_shared_between_clones() {
        let token = SharedToken::new();
        let reader = token.clone();
        token.set(SessionToken::parse("opaque"));
        assert_eq!(reader.bearer().as_deref(), Some("opaque"));
        token.clear();
        assert!(!reader.is_set());
    }
}
