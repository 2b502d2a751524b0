//! In-process implementation of [`PaymentStore`].
//!
//! Plays the role an in-memory database plays for the rest of the stack:
//! good enough for local runs and the test suite, with failure injection
//! hooks to exercise the retry path. Not a durability layer.

use std::{
    collections::HashMap,
    sync::{
        Mutex, PoisonError,
        atomic::{AtomicU32, Ordering},
    },
    time::Duration,
};

use tokio::sync::watch;

use crate::{Payment, PaymentStore, RemoteError};

/// How long a stalled update sleeps; far beyond any realistic timeout so the
/// caller's deadline always fires first.
const STALL: Duration = Duration::from_secs(3600);

#[derive(Default)]
struct Groups {
    payments: HashMap<String, Vec<Payment>>,
    watchers: HashMap<String, watch::Sender<Vec<Payment>>>,
}

/// An in-memory payment store with snapshot push and failure injection.
#[derive(Default)]
pub struct MemoryStore {
    groups: Mutex<Groups>,
    fail_updates: AtomicU32,
    stall_updates: AtomicU32,
}

impl MemoryStore {
    pub fn new() -> MemoryStore {
        MemoryStore::default()
    }

    /// Makes the next `n` `set_payment_paid` calls fail with
    /// [`RemoteError::Unavailable`].
    pub fn fail_next_updates(&self, n: u32) {
        self.fail_updates.store(n, Ordering::SeqCst);
    }

    /// Makes the next `n` `set_payment_paid` calls hang long enough that
    /// the caller's timeout fires.
    pub fn stall_next_updates(&self, n: u32) {
        self.stall_updates.store(n, Ordering::SeqCst);
    }

    fn locked(&self) -> std::sync::MutexGuard<'_, Groups> {
        self.groups.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn push_snapshot(groups: &Groups, group_id: &str) {
        if let Some(tx) = groups.watchers.get(group_id) {
            let snapshot = groups.payments.get(group_id).cloned().unwrap_or_default();
            let _ = tx.send(snapshot);
        }
    }

    fn take_injection(counter: &AtomicU32) -> bool {
        counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

impl PaymentStore for MemoryStore {
    async fn create_payments(
        &self,
        group_id: &str,
        payments: &[Payment],
    ) -> Result<(), RemoteError> {
        let mut groups = self.locked();
        groups
            .payments
            .entry(group_id.to_string())
            .or_default()
            .extend_from_slice(payments);
        Self::push_snapshot(&groups, group_id);
        Ok(())
    }

    async fn list_payments(&self, group_id: &str) -> Result<Vec<Payment>, RemoteError> {
        let mut payments = self
            .locked()
            .payments
            .get(group_id)
            .cloned()
            .unwrap_or_default();
        payments.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(payments)
    }

    async fn set_payment_paid(
        &self,
        group_id: &str,
        payment_id: &str,
        is_paid: bool,
    ) -> Result<(), RemoteError> {
        if Self::take_injection(&self.stall_updates) {
            tokio::time::sleep(STALL).await;
        }
        if Self::take_injection(&self.fail_updates) {
            return Err(RemoteError::Unavailable("injected failure".to_string()));
        }

        let mut groups = self.locked();
        let payment = groups
            .payments
            .get_mut(group_id)
            .and_then(|list| list.iter_mut().find(|p| p.id == payment_id))
            .ok_or_else(|| RemoteError::NotFound(payment_id.to_string()))?;
        payment.is_paid = is_paid;
        Self::push_snapshot(&groups, group_id);
        Ok(())
    }

    async fn delete_all_payments(&self, group_id: &str) -> Result<(), RemoteError> {
        let mut groups = self.locked();
        groups.payments.remove(group_id);
        Self::push_snapshot(&groups, group_id);
        Ok(())
    }

    fn subscribe(&self, group_id: &str) -> watch::Receiver<Vec<Payment>> {
        let mut groups = self.locked();
        let snapshot = groups.payments.get(group_id).cloned().unwrap_or_default();
        groups
            .watchers
            .entry(group_id.to_string())
            .or_insert_with(|| watch::channel(snapshot).0)
            .subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    use crate::MoneyCents;

    fn payment(id: &str) -> Payment {
        Payment {
            id: id.to_string(),
            from_user: "b".to_string(),
            to_user: "a".to_string(),
            amount: MoneyCents::new(1000),
            is_paid: false,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn set_paid_updates_the_document() {
        let store = MemoryStore::new();
        store.create_payments("g1", &[payment("p1")]).await.unwrap();

        store.set_payment_paid("g1", "p1", true).await.unwrap();

        let payments = store.list_payments("g1").await.unwrap();
        assert!(payments[0].is_paid);
    }

    #[tokio::test]
    async fn set_paid_on_missing_payment_is_not_found() {
        let store = MemoryStore::new();
        let err = store.set_payment_paid("g1", "ghost", true).await.unwrap_err();
        assert_eq!(err, RemoteError::NotFound("ghost".to_string()));
    }

    #[tokio::test]
    async fn injected_failures_are_consumed_in_order() {
        let store = MemoryStore::new();
        store.create_payments("g1", &[payment("p1")]).await.unwrap();
        store.fail_next_updates(1);

        assert!(store.set_payment_paid("g1", "p1", true).await.is_err());
        assert!(store.set_payment_paid("g1", "p1", true).await.is_ok());
    }

    #[tokio::test]
    async fn subscribe_pushes_snapshots_on_change() {
        let store = MemoryStore::new();
        let mut rx = store.subscribe("g1");
        assert!(rx.borrow().is_empty());

        store.create_payments("g1", &[payment("p1")]).await.unwrap();

        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().len(), 1);
    }
}
