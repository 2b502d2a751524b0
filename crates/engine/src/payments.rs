use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{MoneyCents, Transfer};

/// A payment record created when a bill is finalized.
///
/// `is_paid` is the only field the engine ever mutates remotely; everything
/// else is immutable once the record exists.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub id: String,
    pub from_user: String,
    pub to_user: String,
    pub amount: MoneyCents,
    pub is_paid: bool,
    pub created_at: DateTime<Utc>,
}

/// Materializes a settlement into unpaid payment records, one per transfer,
/// all stamped with the same creation time.
pub fn payments_from_transfers(transfers: &[Transfer], created_at: DateTime<Utc>) -> Vec<Payment> {
    transfers
        .iter()
        .map(|transfer| Payment {
            id: Uuid::new_v4().to_string(),
            from_user: transfer.from.clone(),
            to_user: transfer.to.clone(),
            amount: transfer.amount,
            is_paid: false,
            created_at,
        })
        .collect()
}
