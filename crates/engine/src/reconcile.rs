//! The reconciliation worker: applies one pending "mark paid/unpaid" intent
//! against the remote store.
//!
//! Per work item the lifecycle is Scheduled -> Running -> {Succeeded,
//! Retrying, FailedTerminal}. The remote update is bounded by a timeout;
//! a failed or timed-out attempt backs off exponentially and is retried a
//! bounded number of times. Terminal states clean up the pending store and
//! the optimistic override and emit the user-visible notification.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};

use tokio::time::timeout;

use crate::{
    Notifier, PaymentStore, RemoteError, WorkOutcome,
    pending::{PendingOperation, PendingOperationStore},
};

/// Backoff schedule between attempts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BackoffPolicy {
    /// `base * 2^(attempt - 1)` after the attempt-th failure.
    Exponential { base: Duration },
}

impl BackoffPolicy {
    pub fn delay(self, attempt: u32) -> Duration {
        match self {
            BackoffPolicy::Exponential { base } => base * 2u32.saturating_pow(attempt - 1),
        }
    }
}

/// Bounds on a reconciliation work item.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Deadline for a single remote update call.
    pub remote_timeout: Duration,
    /// Delay schedule between attempts.
    pub backoff: BackoffPolicy,
    /// Total attempts before the item fails terminally.
    pub max_attempts: u32,
}

impl Default for RetryPolicy {
    /// The production schedule: 5 s per call, one retry after a 10 s
    /// exponential backoff.
    fn default() -> RetryPolicy {
        RetryPolicy {
            remote_timeout: Duration::from_secs(5),
            backoff: BackoffPolicy::Exponential {
                base: Duration::from_secs(10),
            },
            max_attempts: 2,
        }
    }
}

pub(crate) type Overrides = Arc<Mutex<HashMap<String, bool>>>;

pub(crate) fn remove_override(overrides: &Overrides, payment_id: &str) {
    overrides
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .remove(payment_id);
}

/// Runs one pending operation to a terminal state.
///
/// On success: pending operations for the payment are purged, the override
/// is cleared and a "Payment Synced" notification goes out. On terminal
/// failure: operations are marked failed, the override is cleared so the
/// UI rolls back to the remote value, and a "Payment Failed" notification
/// goes out. A payment that no longer exists remotely is cleaned up
/// silently.
pub(crate) async fn run_reconciliation<S, N>(
    store: Arc<S>,
    pending: Arc<PendingOperationStore>,
    overrides: Overrides,
    notifier: Arc<N>,
    policy: RetryPolicy,
    op: PendingOperation,
) -> WorkOutcome
where
    S: PaymentStore,
    N: Notifier,
{
    let payment_id = op.payment_id.clone();
    let mut attempt = 0;

    loop {
        attempt += 1;
        pending.record_attempt(op.op_id);

        let update = store.set_payment_paid(&op.group_id, &payment_id, op.desired_is_paid);
        match timeout(policy.remote_timeout, update).await {
            Ok(Ok(())) => {
                pending.delete_all_for(&payment_id);
                remove_override(&overrides, &payment_id);
                let body = if op.desired_is_paid {
                    format!("Payment {payment_id} synced successfully.")
                } else {
                    format!("Payment {payment_id} marked unpaid.")
                };
                notifier.notify("Payment Synced", &body);
                return WorkOutcome::Succeeded;
            }
            Ok(Err(RemoteError::NotFound(_))) => {
                // The payment vanished remotely (e.g. the bill was
                // reopened). Nothing to sync and nothing to show.
                tracing::debug!("payment {payment_id} gone, dropping pending operation");
                pending.delete_all_for(&payment_id);
                remove_override(&overrides, &payment_id);
                return WorkOutcome::Skipped;
            }
            Ok(Err(err)) => {
                tracing::warn!("payment {payment_id} update failed (attempt {attempt}): {err}");
            }
            Err(_) => {
                tracing::warn!("payment {payment_id} update timed out (attempt {attempt})");
            }
        }

        if attempt >= policy.max_attempts {
            pending.mark_failed_by_payment_id(&payment_id);
            remove_override(&overrides, &payment_id);
            notifier.notify(
                "Payment Failed",
                &format!("Could not sync payment {payment_id}."),
            );
            return WorkOutcome::Failed;
        }

        tokio::time::sleep(policy.backoff.delay(attempt)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exponential_backoff_doubles() {
        let backoff = BackoffPolicy::Exponential {
            base: Duration::from_secs(10),
        };

        assert_eq!(backoff.delay(1), Duration::from_secs(10));
        assert_eq!(backoff.delay(2), Duration::from_secs(20));
        assert_eq!(backoff.delay(3), Duration::from_secs(40));
    }

    #[test]
    fn default_policy_matches_production_schedule() {
        let policy = RetryPolicy::default();

        assert_eq!(policy.remote_timeout, Duration::from_secs(5));
        assert_eq!(policy.max_attempts, 2);
        assert_eq!(
            policy.backoff,
            BackoffPolicy::Exponential {
                base: Duration::from_secs(10)
            }
        );
    }
}
