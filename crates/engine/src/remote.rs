//! Boundary to the remote payment store.
//!
//! The store is an external, eventually-consistent document database with
//! last-writer-wins semantics on field updates. The engine only ever talks
//! to it through this trait; everything network-bound lives behind it.

use std::future::Future;

use thiserror::Error;
use tokio::sync::watch;

use crate::Payment;

/// Errors surfaced by a remote payment store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    #[error("remote store unavailable: {0}")]
    Unavailable(String),
    #[error("\"{0}\" not found in remote store")]
    NotFound(String),
}

/// The payments collection of the remote document store.
///
/// All calls are network-bound and fallible, with no ordering guarantees
/// between them. Futures are `Send` so reconciliation work can run on
/// spawned tasks.
pub trait PaymentStore: Send + Sync + 'static {
    /// Creates payment records in bulk (bill finalization).
    fn create_payments(
        &self,
        group_id: &str,
        payments: &[Payment],
    ) -> impl Future<Output = Result<(), RemoteError>> + Send;

    /// Returns the current snapshot of a group's payments, oldest first.
    fn list_payments(
        &self,
        group_id: &str,
    ) -> impl Future<Output = Result<Vec<Payment>, RemoteError>> + Send;

    /// Sets the `is_paid` field of one payment document. Last writer wins,
    /// so re-issuing the same desired state is always safe.
    fn set_payment_paid(
        &self,
        group_id: &str,
        payment_id: &str,
        is_paid: bool,
    ) -> impl Future<Output = Result<(), RemoteError>> + Send;

    /// Deletes every payment of a group (bill reopening).
    fn delete_all_payments(
        &self,
        group_id: &str,
    ) -> impl Future<Output = Result<(), RemoteError>> + Send;

    /// Subscribes to snapshot pushes for a group's payments.
    ///
    /// Snapshots are delivered at least once and may arrive concurrently
    /// with in-flight reconciliation; the read-side merge is what keeps a
    /// stale snapshot from clobbering an optimistic override.
    fn subscribe(&self, group_id: &str) -> watch::Receiver<Vec<Payment>>;
}
