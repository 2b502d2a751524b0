//! Settlement and payment reconciliation core.
//!
//! Pure computation (balances, settlement) lives in free functions; the
//! [`SyncEngine`] facade owns the stateful side: optimistic overrides,
//! pending-operation bookkeeping and the background reconciliation of
//! "mark paid/unpaid" toggles against the remote store.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError},
};

use chrono::Utc;
use tokio::sync::{oneshot, watch};
use uuid::Uuid;

pub use balance::compute_balances;
pub use error::EngineError;
pub use expenses::Expense;
pub use memory::MemoryStore;
pub use money::MoneyCents;
pub use notify::{LogNotifier, Notifier, RecordingNotifier};
pub use payments::{Payment, payments_from_transfers};
pub use pending::{PendingOperation, PendingOperationStore};
pub use reconcile::{BackoffPolicy, RetryPolicy};
pub use remote::{PaymentStore, RemoteError};
pub use scheduler::WorkOutcome;
pub use settlement::{Transfer, settle};
pub use view::{EffectiveState, PaymentView};

mod balance;
mod error;
mod expenses;
mod memory;
mod money;
mod notify;
mod payments;
mod pending;
mod reconcile;
mod remote;
mod scheduler;
mod settlement;
mod view;

pub(crate) type ResultEngine<T> = Result<T, EngineError>;

/// Result of a toggle request.
#[derive(Debug)]
pub enum Toggle {
    /// A reconciliation work item was scheduled. `done` resolves once the
    /// item reaches a terminal state and can only be consumed once.
    Scheduled {
        op_id: Uuid,
        done: oneshot::Receiver<WorkOutcome>,
    },
    /// An attempt for this payment is already in flight; the request was
    /// dropped and the in-flight desired state stays authoritative.
    AlreadyInFlight,
}

/// Facade over the reconciliation state: remote store, notification sink,
/// pending operations, optimistic overrides and the per-payment work
/// scheduler.
pub struct SyncEngine<S, N> {
    store: Arc<S>,
    notifier: Arc<N>,
    pending: Arc<PendingOperationStore>,
    overrides: Arc<Mutex<HashMap<String, bool>>>,
    scheduler: scheduler::UniqueScheduler,
    retry: RetryPolicy,
}

impl<S, N> SyncEngine<S, N>
where
    S: PaymentStore,
    N: Notifier,
{
    /// Return a builder for `SyncEngine`.
    pub fn builder(store: S, notifier: N) -> SyncEngineBuilder<S, N> {
        SyncEngineBuilder {
            store,
            notifier,
            retry: RetryPolicy::default(),
        }
    }

    /// Requests that a payment be marked paid or unpaid.
    ///
    /// The optimistic override is applied immediately, a pending operation
    /// is registered and a reconciliation work item is scheduled, unless
    /// one is already in flight for this payment (keep-existing policy: the
    /// new request is dropped and only honored by a later toggle once the
    /// current attempt terminates).
    pub fn toggle_paid(&self, group_id: &str, payment_id: &str, desired_is_paid: bool) -> Toggle {
        let op = PendingOperation::new(group_id, payment_id, desired_is_paid, Utc::now());
        let op_id = op.op_id;

        let store = Arc::clone(&self.store);
        let notifier = Arc::clone(&self.notifier);
        let pending = Arc::clone(&self.pending);
        let overrides = Arc::clone(&self.overrides);
        let retry = self.retry;

        let key = format!("payment_retry_{payment_id}");
        let scheduled = self.scheduler.schedule_unique(&key, || {
            // Key claimed: this attempt owns the payment until terminal.
            self.locked_overrides()
                .insert(op.payment_id.clone(), desired_is_paid);
            pending.insert(op.clone());
            reconcile::run_reconciliation(store, pending, overrides, notifier, retry, op)
        });

        match scheduled {
            Some(done) => Toggle::Scheduled { op_id, done },
            None => Toggle::AlreadyInFlight,
        }
    }

    /// Returns the merged view of a group's payments: the remote snapshot
    /// overlaid with optimistic overrides and failure flags.
    pub async fn payments(&self, group_id: &str) -> ResultEngine<Vec<PaymentView>> {
        let snapshot = self.store.list_payments(group_id).await?;
        Ok(self.merge(snapshot))
    }

    /// Overlays one remote snapshot with the current local state.
    ///
    /// Consumers holding a [`subscribe_payments`] receiver re-merge on
    /// every pushed snapshot and after every terminal toggle.
    ///
    /// [`subscribe_payments`]: SyncEngine::subscribe_payments
    pub fn merge(&self, snapshot: Vec<Payment>) -> Vec<PaymentView> {
        let overrides = self.locked_overrides().clone();
        view::merge_snapshot(snapshot, &overrides, &self.pending)
    }

    /// Subscribes to raw remote snapshot pushes for a group.
    pub fn subscribe_payments(&self, group_id: &str) -> watch::Receiver<Vec<Payment>> {
        self.store.subscribe(group_id)
    }

    /// Returns the merged state of a single payment.
    pub async fn effective_state(
        &self,
        group_id: &str,
        payment_id: &str,
    ) -> ResultEngine<EffectiveState> {
        let snapshot = self.store.list_payments(group_id).await?;
        self.merge(snapshot)
            .into_iter()
            .find(|v| v.payment.id == payment_id)
            .map(|v| EffectiveState {
                is_paid: v.payment.is_paid,
                pending: v.pending,
                failed: v.failed,
            })
            .ok_or_else(|| EngineError::KeyNotFound(payment_id.to_string()))
    }

    /// Dismisses a surfaced failure: purges the payment's pending
    /// operations and drops any leftover override. The user may re-toggle
    /// afterwards, which starts a fresh operation.
    pub fn dismiss_failure(&self, payment_id: &str) {
        self.pending.delete_all_for(payment_id);
        self.locked_overrides().remove(payment_id);
    }

    /// Finalizes a bill: computes balances, settles them and materializes
    /// the resulting transfers as unpaid payment records in the remote
    /// store. Returns the created payments.
    pub async fn finalize_bill(
        &self,
        group_id: &str,
        expenses: &[Expense],
        participants: &std::collections::HashSet<String>,
    ) -> ResultEngine<Vec<Payment>> {
        let balances = compute_balances(expenses, participants)?;
        let transfers = settle(&balances);
        let payments = payments_from_transfers(&transfers, Utc::now());
        self.store.create_payments(group_id, &payments).await?;
        Ok(payments)
    }

    /// Reopens a bill: deletes the group's payments remotely and clears
    /// every local override and pending operation that referred to them.
    pub async fn reopen_bill(&self, group_id: &str) -> ResultEngine<()> {
        let payments = self.store.list_payments(group_id).await?;
        self.store.delete_all_payments(group_id).await?;
        for payment in payments {
            self.pending.delete_all_for(&payment.id);
            self.locked_overrides().remove(&payment.id);
        }
        Ok(())
    }

    /// The underlying remote store handle.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// The notification sink.
    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    fn locked_overrides(&self) -> std::sync::MutexGuard<'_, HashMap<String, bool>> {
        self.overrides.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// The builder for `SyncEngine`.
pub struct SyncEngineBuilder<S, N> {
    store: S,
    notifier: N,
    retry: RetryPolicy,
}

impl<S, N> SyncEngineBuilder<S, N>
where
    S: PaymentStore,
    N: Notifier,
{
    /// Overrides the retry schedule (tests compress the durations).
    pub fn retry(mut self, retry: RetryPolicy) -> SyncEngineBuilder<S, N> {
        self.retry = retry;
        self
    }

    /// Construct `SyncEngine`.
    pub fn build(self) -> SyncEngine<S, N> {
        SyncEngine {
            store: Arc::new(self.store),
            notifier: Arc::new(self.notifier),
            pending: Arc::new(PendingOperationStore::new()),
            overrides: Arc::new(Mutex::new(HashMap::new())),
            scheduler: scheduler::UniqueScheduler::new(),
            retry: self.retry,
        }
    }
}
