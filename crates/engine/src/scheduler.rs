//! Unique-keyed background work.
//!
//! At most one task runs per key; scheduling against a busy key keeps the
//! existing work and drops the new request. The terminal outcome of each
//! item is delivered once through a oneshot receiver instead of a
//! long-lived observer.

use std::{
    collections::HashSet,
    future::Future,
    sync::{Arc, Mutex, PoisonError},
};

use tokio::sync::oneshot;

/// Terminal result of one scheduled work item.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WorkOutcome {
    /// The remote mutation landed.
    Succeeded,
    /// Retries are exhausted; the item will not run again.
    Failed,
    /// The work turned out to be moot (e.g. its target vanished).
    Skipped,
}

#[derive(Debug, Default)]
pub(crate) struct UniqueScheduler {
    inflight: Arc<Mutex<HashSet<String>>>,
}

impl UniqueScheduler {
    pub(crate) fn new() -> UniqueScheduler {
        UniqueScheduler::default()
    }

    /// Spawns work under `key` unless work with that key is already in
    /// flight. Returns a receiver for the terminal outcome, or `None` when
    /// the existing work was kept and the new request dropped.
    ///
    /// `make_work` runs synchronously once the key is claimed, so any state
    /// it registers is never rolled back for a dropped request. The key is
    /// released only after the work future finishes; a follow-up request
    /// for the same key is honored once the current attempt reaches a
    /// terminal state.
    pub(crate) fn schedule_unique<W, F>(
        &self,
        key: &str,
        make_work: W,
    ) -> Option<oneshot::Receiver<WorkOutcome>>
    where
        W: FnOnce() -> F,
        F: Future<Output = WorkOutcome> + Send + 'static,
    {
        {
            let mut inflight = self.locked();
            if !inflight.insert(key.to_string()) {
                return None;
            }
        }

        let work = make_work();
        let (done_tx, done_rx) = oneshot::channel();
        let inflight = Arc::clone(&self.inflight);
        let key = key.to_string();
        tokio::spawn(async move {
            let outcome = work.await;
            inflight
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .remove(&key);
            // The caller may have dropped the receiver; the outcome is
            // already fully applied by the work itself.
            let _ = done_tx.send(outcome);
        });

        Some(done_rx)
    }

    fn locked(&self) -> std::sync::MutexGuard<'_, HashSet<String>> {
        self.inflight.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
