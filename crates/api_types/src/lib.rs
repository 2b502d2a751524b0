use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod expense {
    use super::*;

    /// One shared expense as posted by a client. Amounts are integer minor
    /// units (cents).
    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct ExpenseNew {
        pub payer_id: String,
        pub amount_minor: i64,
        pub description: Option<String>,
        pub occurred_at: Option<DateTime<Utc>>,
    }
}

pub mod balance {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BalancesRequest {
        pub expenses: Vec<expense::ExpenseNew>,
        pub participants: Vec<String>,
    }

    /// Net position per participant, in minor units. Positive = is owed.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct BalancesResponse {
        pub balances: std::collections::BTreeMap<String, i64>,
    }
}

pub mod settlement {
    use super::*;

    /// Either pre-computed balances or raw expenses may be posted; exactly
    /// one of the two must be present.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct SettleRequest {
        pub balances: Option<std::collections::BTreeMap<String, i64>>,
        pub expenses: Option<Vec<expense::ExpenseNew>>,
        pub participants: Option<Vec<String>>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransferView {
        pub from: String,
        pub to: String,
        pub amount_minor: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct SettleResponse {
        pub transfers: Vec<TransferView>,
    }
}

pub mod payment {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct FinalizeRequest {
        pub expenses: Vec<expense::ExpenseNew>,
        pub participants: Vec<String>,
    }

    /// A payment row as the UI shows it: the remote document merged with
    /// local optimistic state.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct PaymentView {
        pub id: String,
        pub from_user: String,
        pub to_user: String,
        pub amount_minor: i64,
        pub is_paid: bool,
        pub pending: bool,
        pub failed: bool,
        pub created_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct PaymentList {
        pub payments: Vec<PaymentView>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ToggleRequest {
        pub desired_is_paid: bool,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ToggleResponse {
        /// `false` when an attempt for this payment was already in flight
        /// and the request was dropped.
        pub scheduled: bool,
        /// Operation id of the scheduled attempt (UUID).
        pub op_id: Option<Uuid>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct EffectiveStateView {
        pub is_paid: bool,
        pub pending: bool,
        pub failed: bool,
    }
}
