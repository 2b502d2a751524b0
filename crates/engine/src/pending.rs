//! Registry of in-flight "mark paid/unpaid" intents.
//!
//! This is the single source of truth for "a mutation is in flight" and the
//! only shared mutable state in the core besides the optimistic override
//! map. Every method takes the lock for its whole body and no method calls
//! another while holding it.

use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// A recorded mutation intent for one payment.
///
/// `op_id` is fresh per attempt; several superseded operations may exist for
/// the same payment and are queried by `payment_id`.
#[derive(Clone, Debug, PartialEq)]
pub struct PendingOperation {
    pub op_id: Uuid,
    pub group_id: String,
    pub payment_id: String,
    pub desired_is_paid: bool,
    pub created_at: DateTime<Utc>,
    pub attempt_count: u32,
    pub failed: bool,
}

impl PendingOperation {
    pub fn new(
        group_id: impl Into<String>,
        payment_id: impl Into<String>,
        desired_is_paid: bool,
        created_at: DateTime<Utc>,
    ) -> PendingOperation {
        PendingOperation {
            op_id: Uuid::new_v4(),
            group_id: group_id.into(),
            payment_id: payment_id.into(),
            desired_is_paid,
            created_at,
            attempt_count: 0,
            failed: false,
        }
    }
}

/// Mutex-guarded store of pending operations.
#[derive(Debug, Default)]
pub struct PendingOperationStore {
    inner: Mutex<Vec<PendingOperation>>,
}

impl PendingOperationStore {
    pub fn new() -> PendingOperationStore {
        PendingOperationStore::default()
    }

    fn locked(&self) -> std::sync::MutexGuard<'_, Vec<PendingOperation>> {
        // A poisoned lock only means another thread panicked mid-mutation of
        // a Vec of plain records; the data is still usable.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Adds an operation. No dedup by `op_id`: callers mint a fresh id per
    /// attempt.
    pub fn insert(&self, op: PendingOperation) {
        self.locked().push(op);
    }

    /// Looks up a single operation by its id.
    pub fn get(&self, op_id: Uuid) -> Option<PendingOperation> {
        self.locked().iter().find(|op| op.op_id == op_id).cloned()
    }

    /// Counts one reconciliation attempt against an operation.
    pub fn record_attempt(&self, op_id: Uuid) {
        if let Some(op) = self.locked().iter_mut().find(|op| op.op_id == op_id) {
            op.attempt_count += 1;
        }
    }

    /// Marks every operation for a payment as failed, covering superseded
    /// attempts as well.
    pub fn mark_failed_by_payment_id(&self, payment_id: &str) {
        for op in self
            .locked()
            .iter_mut()
            .filter(|op| op.payment_id == payment_id)
        {
            op.failed = true;
        }
    }

    /// Returns `true` if any operation for the payment failed and has not
    /// been cleared yet.
    pub fn get_failure(&self, payment_id: &str) -> bool {
        self.locked()
            .iter()
            .any(|op| op.payment_id == payment_id && op.failed)
    }

    /// Purges every operation for a payment. Called on confirmed terminal
    /// success or when the user dismisses a failure.
    pub fn delete_all_for(&self, payment_id: &str) {
        self.locked().retain(|op| op.payment_id != payment_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn op(payment_id: &str) -> PendingOperation {
        PendingOperation::new("g1", payment_id, true, Utc::now())
    }

    #[test]
    fn insert_and_get_by_op_id() {
        let store = PendingOperationStore::new();
        let first = op("p1");
        let op_id = first.op_id;
        store.insert(first.clone());

        assert_eq!(store.get(op_id), Some(first));
        assert_eq!(store.get(Uuid::new_v4()), None);
    }

    #[test]
    fn failure_covers_all_attempts_for_a_payment() {
        let store = PendingOperationStore::new();
        store.insert(op("p1"));
        store.insert(op("p1"));
        store.insert(op("p2"));

        store.mark_failed_by_payment_id("p1");

        assert!(store.get_failure("p1"));
        assert!(!store.get_failure("p2"));
    }

    #[test]
    fn delete_all_for_clears_failure() {
        let store = PendingOperationStore::new();
        store.insert(op("p1"));
        store.mark_failed_by_payment_id("p1");

        store.delete_all_for("p1");

        assert!(!store.get_failure("p1"));
    }

    #[test]
    fn record_attempt_increments_counter() {
        let store = PendingOperationStore::new();
        let pending = op("p1");
        let op_id = pending.op_id;
        store.insert(pending);

        store.record_attempt(op_id);
        store.record_attempt(op_id);

        assert_eq!(store.get(op_id).map(|op| op.attempt_count), Some(2));
    }
}
