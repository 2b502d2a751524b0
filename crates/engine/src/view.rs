//! Read-side merge of remote payment snapshots with local optimistic state.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{Payment, pending::PendingOperationStore};

/// A payment as the UI should display it: the remote document overlaid
/// with the optimistic override and the local failure flag.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PaymentView {
    #[serde(flatten)]
    pub payment: Payment,
    /// A toggle for this payment has not reached a terminal state yet.
    pub pending: bool,
    /// The last toggle failed terminally and has not been dismissed.
    pub failed: bool,
}

/// The merged, read-only state of a single payment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectiveState {
    pub is_paid: bool,
    pub pending: bool,
    pub failed: bool,
}

/// Overlays a remote snapshot with the optimistic overrides and failure
/// flags.
///
/// The snapshot is consumed, never mutated in place: overrides stay in
/// their own map, so remote snapshots and local state replace each other
/// independently. An override outlives every stale snapshot because it is
/// only removed at a terminal state.
pub(crate) fn merge_snapshot(
    snapshot: Vec<Payment>,
    overrides: &HashMap<String, bool>,
    pending: &PendingOperationStore,
) -> Vec<PaymentView> {
    snapshot
        .into_iter()
        .map(|mut payment| {
            let override_paid = overrides.get(&payment.id).copied();
            if let Some(is_paid) = override_paid {
                payment.is_paid = is_paid;
            }
            let failed = pending.get_failure(&payment.id);
            PaymentView {
                pending: override_paid.is_some(),
                failed,
                payment,
            }
        })
        .collect()
}
